use serde::{Deserialize, Deserializer, Serialize};

/// Five-point ordinal scale used for every competency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreLevel {
    VeryBad,
    Bad,
    Ok,
    Good,
    VeryGood,
}

impl ScoreLevel {
    pub const ALL: [ScoreLevel; 5] = [
        ScoreLevel::VeryBad,
        ScoreLevel::Bad,
        ScoreLevel::Ok,
        ScoreLevel::Good,
        ScoreLevel::VeryGood,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryBad => "veryBad",
            Self::Bad => "bad",
            Self::Ok => "ok",
            Self::Good => "good",
            Self::VeryGood => "veryGood",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryBad => "Very bad",
            Self::Bad => "Bad",
            Self::Ok => "Ok",
            Self::Good => "Good",
            Self::VeryGood => "Very good",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }

    /// Position in `ALL`, used to index level-count buckets.
    pub fn index(self) -> usize {
        level_to_number(self) as usize - 1
    }
}

/// Clamps into [1, 5] and rounds half up, so 2.5 maps to `Ok` and 1.49 to
/// `VeryBad`. NaN lands on `VeryBad`.
pub fn number_to_level(n: f64) -> ScoreLevel {
    let rounded = (n.clamp(1.0, 5.0) + 0.5).floor() as i64;
    match rounded.clamp(1, 5) {
        1 => ScoreLevel::VeryBad,
        2 => ScoreLevel::Bad,
        3 => ScoreLevel::Ok,
        4 => ScoreLevel::Good,
        _ => ScoreLevel::VeryGood,
    }
}

pub fn level_to_number(level: ScoreLevel) -> i64 {
    match level {
        ScoreLevel::VeryBad => 1,
        ScoreLevel::Bad => 2,
        ScoreLevel::Ok => 3,
        ScoreLevel::Good => 4,
        ScoreLevel::VeryGood => 5,
    }
}

impl<'de> Deserialize<'de> for ScoreLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => {
                if n.fract() != 0.0 || !(1.0..=5.0).contains(&n) {
                    return Err(serde::de::Error::custom(format!(
                        "score level must be an integer in 1..=5, got {}",
                        n
                    )));
                }
                Ok(number_to_level(n))
            }
            Raw::Name(s) => ScoreLevel::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown score level: {}", s))),
        }
    }
}
