use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::calc::{aggregate_cohort, latest_scores, WeightTree};
use crate::config::ReportsConfig;
use crate::grades::{snap_grade, ALLOWED_GRADES};
use crate::level::{level_to_number, ScoreLevel};
use crate::model::{AssessmentType, CompletionRecord, Participant, ScoreRecord};
use crate::stats::{level_counts, summarize, BucketCount, Summary};

/// Groups items by key, keeping keys in first-seen order and items in input
/// order within each group.
pub fn group_by<T, K, I, F>(items: I, mut key_fn: F) -> Vec<(K, Vec<T>)>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    let mut slot_of: HashMap<K, usize> = HashMap::new();
    for item in items {
        let key = key_fn(&item);
        let slot = *slot_of.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item);
    }
    groups
}

pub fn not_assessed(total: usize, scored: usize) -> usize {
    total.saturating_sub(scored)
}

pub fn short_label(long: &str, max_chars: usize) -> String {
    if long.chars().count() <= max_chars {
        return long.to_string();
    }
    let mut out: String = long.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Author,
    Gender,
    Nationality,
    Team,
    Category,
}

impl Dimension {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "author" => Some(Self::Author),
            "gender" => Some(Self::Gender),
            "nationality" => Some(Self::Nationality),
            "team" => Some(Self::Team),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionDataPoint {
    pub key: String,
    pub short_label: String,
    pub long_label: String,
    #[serde(flatten)]
    pub summary: Summary,
    pub counts: Vec<BucketCount>,
    pub not_assessed: usize,
}

fn data_point(
    key: &str,
    long_label: &str,
    values: &[f64],
    levels: Vec<ScoreLevel>,
    population: usize,
    scored: usize,
    cfg: &ReportsConfig,
) -> DistributionDataPoint {
    DistributionDataPoint {
        key: key.to_string(),
        short_label: short_label(long_label, cfg.short_label_max_chars),
        long_label: long_label.to_string(),
        summary: summarize(values),
        counts: level_counts(levels),
        not_assessed: not_assessed(population, scored),
    }
}

fn attribute(p: &Participant, dimension: Dimension) -> Option<&str> {
    match dimension {
        Dimension::Gender => p.gender.as_deref(),
        Dimension::Nationality => p.nationality.as_deref(),
        Dimension::Team => p.team.as_deref(),
        Dimension::Author | Dimension::Category => None,
    }
}

/// One data point per group of the chosen dimension, in first-seen group
/// order (tree order for categories).
pub fn distribution(
    dimension: Dimension,
    tree: &WeightTree,
    participants: &[Participant],
    scores: &[ScoreRecord],
    cfg: &ReportsConfig,
) -> Vec<DistributionDataPoint> {
    match dimension {
        Dimension::Author => by_author(tree, participants, scores, cfg),
        Dimension::Category => by_category(tree, participants, scores, cfg),
        Dimension::Gender | Dimension::Nationality | Dimension::Team => {
            by_attribute(dimension, tree, participants, scores, cfg)
        }
    }
}

fn by_attribute(
    dimension: Dimension,
    tree: &WeightTree,
    participants: &[Participant],
    scores: &[ScoreRecord],
    cfg: &ReportsConfig,
) -> Vec<DistributionDataPoint> {
    let rows = aggregate_cohort(tree, participants, scores);
    let groups = group_by(participants.iter().zip(rows.iter()), |(p, _)| {
        attribute(p, dimension)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(cfg.unknown_group_label.as_str())
            .to_string()
    });

    groups
        .into_iter()
        .map(|(label, members)| {
            let aggregates: Vec<_> = members
                .iter()
                .filter_map(|(_, row)| row.aggregate.as_ref())
                .collect();
            let values: Vec<f64> = aggregates.iter().map(|a| a.numeric).collect();
            let levels = aggregates.iter().map(|a| a.level).collect();
            data_point(&label, &label, &values, levels, members.len(), values.len(), cfg)
        })
        .collect()
}

fn by_author(
    tree: &WeightTree,
    participants: &[Participant],
    scores: &[ScoreRecord],
    cfg: &ReportsConfig,
) -> Vec<DistributionDataPoint> {
    let cohort: HashSet<&str> = participants.iter().map(|p| p.id.as_str()).collect();
    let counted: Vec<ScoreRecord> = scores
        .iter()
        .filter(|s| cohort.contains(s.participant_id.as_str()))
        .filter(|s| tree.contains_competency(&s.competency_id))
        .cloned()
        .collect();

    // Supersede first so a score replaced by another author drops out.
    group_by(latest_scores(&counted), |s| s.author_id.clone())
        .into_iter()
        .map(|(author, latest)| {
            let values: Vec<f64> = latest
                .iter()
                .map(|s| level_to_number(s.level) as f64)
                .collect();
            let levels = latest.iter().map(|s| s.level).collect();
            let scored: HashSet<&str> = latest.iter().map(|s| s.participant_id.as_str()).collect();
            data_point(
                &author,
                &author,
                &values,
                levels,
                participants.len(),
                scored.len(),
                cfg,
            )
        })
        .collect()
}

fn by_category(
    tree: &WeightTree,
    participants: &[Participant],
    scores: &[ScoreRecord],
    cfg: &ReportsConfig,
) -> Vec<DistributionDataPoint> {
    let rows = aggregate_cohort(tree, participants, scores);
    tree.categories()
        .iter()
        .map(|c| {
            let cat_scores: Vec<_> = rows
                .iter()
                .filter_map(|r| r.aggregate.as_ref())
                .filter_map(|a| a.categories.iter().find(|cs| cs.category_id == c.id))
                .collect();
            let values: Vec<f64> = cat_scores.iter().map(|cs| cs.numeric).collect();
            let levels = cat_scores.iter().map(|cs| cs.level).collect();
            data_point(&c.id, &c.name, &values, levels, participants.len(), values.len(), cfg)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDistribution {
    pub assessment_type: AssessmentType,
    pub buckets: Vec<BucketCount>,
    pub off_scale: usize,
    #[serde(flatten)]
    pub summary: Summary,
    pub total: usize,
    pub not_assessed: usize,
}

/// Buckets grade suggestions by exact scale match (within tolerance).
pub fn grade_distribution(
    participants: &[Participant],
    completions: &[CompletionRecord],
    assessment_type: AssessmentType,
) -> GradeDistribution {
    let cohort: HashSet<&str> = participants.iter().map(|p| p.id.as_str()).collect();
    let mut counts = [0_usize; ALLOWED_GRADES.len()];
    let mut off_scale = 0_usize;
    let mut graded: HashSet<&str> = HashSet::new();
    let mut values: Vec<f64> = Vec::new();

    for c in completions {
        if c.assessment_type != assessment_type || !cohort.contains(c.participant_id.as_str()) {
            continue;
        }
        let Some(raw) = c.grade_suggestion else {
            continue;
        };
        if !graded.insert(c.participant_id.as_str()) {
            continue;
        }
        match snap_grade(raw).and_then(|g| ALLOWED_GRADES.iter().position(|a| *a == g)) {
            Some(idx) => {
                counts[idx] += 1;
                values.push(ALLOWED_GRADES[idx]);
            }
            None => off_scale += 1,
        }
    }

    let buckets = ALLOWED_GRADES
        .iter()
        .enumerate()
        .map(|(idx, g)| BucketCount {
            key: format!("{:.1}", g),
            label: format!("{:.1}", g),
            count: counts[idx],
        })
        .collect();

    GradeDistribution {
        assessment_type,
        buckets,
        off_scale,
        summary: summarize(&values),
        total: participants.len(),
        not_assessed: not_assessed(participants.len(), graded.len()),
    }
}
