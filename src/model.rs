use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::level::ScoreLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssessmentType {
    Assessment,
    SelfEvaluation,
    PeerEvaluation,
    TutorEvaluation,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 4] = [
        AssessmentType::Assessment,
        AssessmentType::SelfEvaluation,
        AssessmentType::PeerEvaluation,
        AssessmentType::TutorEvaluation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::SelfEvaluation => "selfEvaluation",
            Self::PeerEvaluation => "peerEvaluation",
            Self::TutorEvaluation => "tutorEvaluation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    pub id: String,
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub competencies: Vec<Competency>,
}

fn default_weight() -> f64 {
    1.0
}

/// Cohort membership row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub participant_id: String,
    pub competency_id: String,
    pub author_id: String,
    pub level: ScoreLevel,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub participant_id: String,
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub grade_suggestion: Option<f64>,
}

impl CompletionRecord {
    pub fn draft(participant_id: &str, assessment_type: AssessmentType) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            assessment_type,
            completed: false,
            completed_at: None,
            author: None,
            grade_suggestion: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Finalized,
    Reopened,
    GradeSuggestionChanged,
}

/// Published after every successful completion transition so derived
/// aggregates can be refreshed by whoever holds them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub id: Uuid,
    pub kind: ChangeKind,
    pub participant_id: String,
    pub assessment_type: AssessmentType,
    pub author: Option<String>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        kind: ChangeKind,
        record: &CompletionRecord,
        author: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            participant_id: record.participant_id.clone(),
            assessment_type: record.assessment_type,
            author: author.map(str::to_string),
            at,
        }
    }
}
