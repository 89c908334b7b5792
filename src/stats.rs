use serde::Serialize;

use crate::level::ScoreLevel;

/// Linear-interpolation quantile (R-7 / spreadsheet PERCENTILE).
///
/// Empty input has no quantile and yields `None`; `q` outside [0, 1] is
/// clamped.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;
    let lower = sorted[base];
    let upper = sorted.get(base + 1).copied().unwrap_or(lower);
    Some(lower + rest * (upper - lower))
}

pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub average: Option<f64>,
    pub lower_quartile: Option<f64>,
    pub median: Option<f64>,
    pub upper_quartile: Option<f64>,
}

pub fn summarize(values: &[f64]) -> Summary {
    Summary {
        count: values.len(),
        average: average(values),
        lower_quartile: quantile(values, 0.25),
        median: quantile(values, 0.5),
        upper_quartile: quantile(values, 0.75),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// One bucket per level, ascending, zero buckets included so chart axes stay
/// fixed.
pub fn level_counts<I>(levels: I) -> Vec<BucketCount>
where
    I: IntoIterator<Item = ScoreLevel>,
{
    let mut counts = [0_usize; 5];
    for level in levels {
        counts[level.index()] += 1;
    }
    ScoreLevel::ALL
        .iter()
        .map(|l| BucketCount {
            key: l.as_str().to_string(),
            label: l.label().to_string(),
            count: counts[l.index()],
        })
        .collect()
}
