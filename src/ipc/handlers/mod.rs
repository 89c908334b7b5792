pub mod completion;
pub mod core;
pub mod grades;
pub mod levels;
pub mod reports;
pub mod scores;
pub mod setup;
pub mod snapshot;
pub mod stats;
