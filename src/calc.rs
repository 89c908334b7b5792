use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::EngineError;
use crate::level::{level_to_number, number_to_level, ScoreLevel};
use crate::model::{Category, Participant, ScoreRecord};

#[derive(Debug, Clone)]
struct CompetencySlot {
    category_idx: usize,
    weight: f64,
}

/// Validated category/competency tree with a competency lookup index.
#[derive(Debug, Clone)]
pub struct WeightTree {
    categories: Vec<Category>,
    index: HashMap<String, CompetencySlot>,
}

fn check_weight(kind: &str, id: &str, weight: f64) -> Result<(), EngineError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(EngineError::MalformedTree(format!(
            "{} {} has weight {}, expected a finite non-negative number",
            kind, id, weight
        )));
    }
    Ok(())
}

impl WeightTree {
    pub fn new(categories: Vec<Category>) -> Result<Self, EngineError> {
        let mut index: HashMap<String, CompetencySlot> = HashMap::new();
        let mut category_ids: HashSet<&str> = HashSet::new();

        for (category_idx, c) in categories.iter().enumerate() {
            if !category_ids.insert(c.id.as_str()) {
                return Err(EngineError::MalformedTree(format!(
                    "duplicate category id {}",
                    c.id
                )));
            }
            check_weight("category", &c.id, c.weight)?;
            for comp in &c.competencies {
                check_weight("competency", &comp.id, comp.weight)?;
                let slot = CompetencySlot {
                    category_idx,
                    weight: comp.weight,
                };
                if index.insert(comp.id.clone(), slot).is_some() {
                    return Err(EngineError::MalformedTree(format!(
                        "competency {} appears in more than one place",
                        comp.id
                    )));
                }
            }
        }

        Ok(Self { categories, index })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn contains_competency(&self, competency_id: &str) -> bool {
        self.index.contains_key(competency_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category_id: String,
    pub numeric: f64,
    pub level: ScoreLevel,
    pub scored_competencies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAggregate {
    pub participant_id: String,
    pub numeric: f64,
    pub level: ScoreLevel,
    pub categories: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortRow {
    pub participant_id: String,
    pub aggregate: Option<ParticipantAggregate>,
}

fn is_newer(candidate: &ScoreRecord, current: &ScoreRecord) -> bool {
    // Later input position wins ties, hence >=.
    candidate.recorded_at >= current.recorded_at
}

/// Most recent record per (participant, competency), in first-seen order.
pub fn latest_scores(scores: &[ScoreRecord]) -> Vec<&ScoreRecord> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut latest: HashMap<(&str, &str), &ScoreRecord> = HashMap::new();
    for s in scores {
        let key = (s.participant_id.as_str(), s.competency_id.as_str());
        let replace = match latest.get(&key) {
            Some(current) => is_newer(s, current),
            None => {
                order.push(key);
                true
            }
        };
        if replace {
            latest.insert(key, s);
        }
    }
    order.into_iter().filter_map(|k| latest.get(&k).copied()).collect()
}

/// Weighted aggregate for one participant. `None` means unscored: either no
/// competency carries a score, or every contributing weight is zero.
pub fn aggregate_participant(
    tree: &WeightTree,
    participant_id: &str,
    scores: &[ScoreRecord],
) -> Option<ParticipantAggregate> {
    let own: Vec<ScoreRecord> = scores
        .iter()
        .filter(|s| s.participant_id == participant_id)
        .cloned()
        .collect();

    // sum, denom, scored count
    let mut per_category: HashMap<usize, (f64, f64, usize)> = HashMap::new();
    for s in latest_scores(&own) {
        let Some(slot) = tree.index.get(&s.competency_id) else {
            tracing::warn!(
                participant = %s.participant_id,
                competency = %s.competency_id,
                "score references a competency outside the weight tree, skipped"
            );
            continue;
        };
        let value = level_to_number(s.level) as f64;
        let entry = per_category.entry(slot.category_idx).or_insert((0.0, 0.0, 0));
        entry.0 += value * slot.weight;
        entry.1 += slot.weight;
        entry.2 += 1;
    }

    let mut categories: Vec<CategoryScore> = Vec::new();
    let mut sum = 0.0_f64;
    let mut denom = 0.0_f64;
    for (idx, c) in tree.categories.iter().enumerate() {
        let Some((cat_sum, cat_denom, scored)) = per_category.get(&idx).copied() else {
            continue;
        };
        if cat_denom <= 0.0 {
            continue;
        }
        let cat_avg = cat_sum / cat_denom;
        categories.push(CategoryScore {
            category_id: c.id.clone(),
            numeric: cat_avg,
            level: number_to_level(cat_avg),
            scored_competencies: scored,
        });
        sum += cat_avg * c.weight;
        denom += c.weight;
    }

    if denom <= 0.0 {
        return None;
    }
    let numeric = sum / denom;
    Some(ParticipantAggregate {
        participant_id: participant_id.to_string(),
        numeric,
        level: number_to_level(numeric),
        categories,
    })
}

pub fn aggregate_cohort(
    tree: &WeightTree,
    participants: &[Participant],
    scores: &[ScoreRecord],
) -> Vec<CohortRow> {
    let mut by_participant: HashMap<&str, Vec<ScoreRecord>> = HashMap::new();
    for s in scores {
        by_participant
            .entry(s.participant_id.as_str())
            .or_default()
            .push(s.clone());
    }

    participants
        .iter()
        .map(|p| {
            let own = by_participant
                .get(p.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            CohortRow {
                participant_id: p.id.clone(),
                aggregate: aggregate_participant(tree, &p.id, own),
            }
        })
        .collect()
}
