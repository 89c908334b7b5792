use serde::Serialize;

/// The institutional grading scale, best to worst.
pub const ALLOWED_GRADES: [f64; 11] = [1.0, 1.3, 1.7, 2.0, 2.3, 2.7, 3.0, 3.3, 3.7, 4.0, 5.0];

pub const GRADE_TOLERANCE: f64 = 0.01;

/// Grade used when the input is left blank.
pub const BLANK_GRADE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GradeValidation {
    fn valid(value: f64) -> Self {
        Self {
            is_valid: true,
            value: Some(value),
            error: None,
        }
    }

    fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            value: None,
            error: Some(error.into()),
        }
    }
}

/// Snaps `value` onto the scale when it lies within the tolerance of a grade.
pub fn snap_grade(value: f64) -> Option<f64> {
    ALLOWED_GRADES
        .iter()
        .copied()
        .find(|g| (g - value).abs() < GRADE_TOLERANCE)
}

fn allowed_list() -> String {
    ALLOWED_GRADES
        .iter()
        .map(|g| format!("{:.1}", g))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Blank input is accepted as 5.0. Anything else must parse, lie in
/// [1, 5] and sit on the scale.
pub fn validate_grade(input: &str) -> GradeValidation {
    let t = input.trim();
    if t.is_empty() {
        return GradeValidation::valid(BLANK_GRADE);
    }
    let Ok(n) = t.parse::<f64>() else {
        return GradeValidation::invalid("grade must be a number");
    };
    if !n.is_finite() {
        return GradeValidation::invalid("grade must be a number");
    }
    if !(1.0..=5.0).contains(&n) {
        return GradeValidation::invalid("grade must be between 1.0 and 5.0");
    }
    match snap_grade(n) {
        Some(g) => GradeValidation::valid(g),
        None => GradeValidation::invalid(format!("grade must be one of: {}", allowed_list())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GradeClass {
    Excellent,
    Good,
    Satisfactory,
    Sufficient,
    Failed,
    NoGrade,
}

impl GradeClass {
    pub fn color(self) -> &'static str {
        match self {
            Self::Excellent => "green",
            Self::Good => "lime",
            Self::Satisfactory => "yellow",
            Self::Sufficient => "orange",
            Self::Failed => "red",
            Self::NoGrade => "gray",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Sufficient => "Sufficient",
            Self::Failed => "Failed",
            Self::NoGrade => "No grade",
        }
    }
}

fn class_of_allowed(idx: usize) -> GradeClass {
    match idx {
        0 | 1 => GradeClass::Excellent,
        2..=4 => GradeClass::Good,
        5..=7 => GradeClass::Satisfactory,
        8 | 9 => GradeClass::Sufficient,
        _ => GradeClass::Failed,
    }
}

/// First scale grade at or above `grade` decides the band. Anything past
/// the last grade (or NaN) has no band.
pub fn classify_grade(grade: f64) -> GradeClass {
    ALLOWED_GRADES
        .iter()
        .position(|g| *g >= grade - GRADE_TOLERANCE)
        .map(class_of_allowed)
        .unwrap_or(GradeClass::NoGrade)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleEntry {
    pub grade: f64,
    pub label: String,
    pub class: GradeClass,
    pub color: &'static str,
}

pub fn grade_scale() -> Vec<ScaleEntry> {
    ALLOWED_GRADES
        .iter()
        .enumerate()
        .map(|(idx, g)| {
            let class = class_of_allowed(idx);
            ScaleEntry {
                grade: *g,
                label: format!("{:.1}", g),
                class,
                color: class.color(),
            }
        })
        .collect()
}
