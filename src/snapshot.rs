use serde::Deserialize;
use std::collections::HashMap;

use crate::calc::WeightTree;
use crate::completion::{completion_progress, CompletionProgress};
use crate::distribution::{grade_distribution, GradeDistribution};
use crate::error::EngineError;
use crate::model::{
    AssessmentType, Category, ChangeEvent, ChangeKind, CompletionRecord, Participant, ScoreRecord,
};

/// Wire shape of `snapshot.load`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInput {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
}

/// In-memory copy of the collaborator-supplied data the calculators run on.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: WeightTree,
    pub participants: Vec<Participant>,
    pub scores: Vec<ScoreRecord>,
    pub completions: Vec<CompletionRecord>,
}

impl Snapshot {
    pub fn from_input(input: SnapshotInput) -> Result<Self, EngineError> {
        let tree = WeightTree::new(input.categories)?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, p) in input.participants.iter().enumerate() {
            if seen.insert(p.id.as_str(), i).is_some() {
                return Err(EngineError::validation(
                    "participants",
                    format!("duplicate participant id {}", p.id),
                ));
            }
        }

        // Later rows for the same (participant, type) replace earlier ones.
        let mut completions: Vec<CompletionRecord> = Vec::new();
        for c in input.completions {
            match completions.iter().position(|e| {
                e.participant_id == c.participant_id && e.assessment_type == c.assessment_type
            }) {
                Some(i) => completions[i] = c,
                None => completions.push(c),
            }
        }

        Ok(Self {
            tree,
            participants: input.participants,
            scores: input.scores,
            completions,
        })
    }

    pub fn has_participant(&self, participant_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == participant_id)
    }

    /// Stored record, or a fresh draft when none exists yet.
    pub fn completion(
        &self,
        participant_id: &str,
        assessment_type: AssessmentType,
    ) -> CompletionRecord {
        self.completions
            .iter()
            .find(|c| c.participant_id == participant_id && c.assessment_type == assessment_type)
            .cloned()
            .unwrap_or_else(|| CompletionRecord::draft(participant_id, assessment_type))
    }

    pub fn store_completion(&mut self, record: CompletionRecord) {
        match self.completions.iter().position(|c| {
            c.participant_id == record.participant_id && c.assessment_type == record.assessment_type
        }) {
            Some(i) => self.completions[i] = record,
            None => self.completions.push(record),
        }
    }
}

/// Completion-dependent aggregates, computed on first use and dropped when a
/// change event touches their assessment type.
#[derive(Debug, Default)]
pub struct DerivedCache {
    progress: HashMap<AssessmentType, CompletionProgress>,
    grades: HashMap<AssessmentType, GradeDistribution>,
}

impl DerivedCache {
    pub fn progress(
        &mut self,
        snapshot: &Snapshot,
        assessment_type: AssessmentType,
    ) -> CompletionProgress {
        *self.progress.entry(assessment_type).or_insert_with(|| {
            completion_progress(&snapshot.participants, &snapshot.completions, assessment_type)
        })
    }

    pub fn grades(
        &mut self,
        snapshot: &Snapshot,
        assessment_type: AssessmentType,
    ) -> GradeDistribution {
        self.grades
            .entry(assessment_type)
            .or_insert_with(|| {
                grade_distribution(&snapshot.participants, &snapshot.completions, assessment_type)
            })
            .clone()
    }

    pub fn invalidate(&mut self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Finalized | ChangeKind::Reopened => {
                self.progress.remove(&event.assessment_type);
            }
            ChangeKind::GradeSuggestionChanged => {}
        }
        // Finalizing can carry a suggestion too.
        self.grades.remove(&event.assessment_type);
    }

    pub fn clear(&mut self) {
        self.progress.clear();
        self.grades.clear();
    }
}
