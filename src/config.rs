use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::AssessmentType;

pub const CONFIG_ENV: &str = "ASSESSD_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CompletionConfig {
    /// Assessment types without an entry never lock.
    pub deadlines: BTreeMap<AssessmentType, DateTime<Utc>>,
}

impl CompletionConfig {
    pub fn deadline(&self, assessment_type: AssessmentType) -> Option<DateTime<Utc>> {
        self.deadlines.get(&assessment_type).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ReportsConfig {
    pub short_label_max_chars: usize,
    pub unknown_group_label: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            short_label_max_chars: 12,
            unknown_group_label: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    pub completion: CompletionConfig,
    pub reports: ReportsConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupSection {
    Completion,
    Reports,
}

impl SetupSection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completion" => Some(Self::Completion),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }
}

fn parse_usize_range(
    v: &serde_json::Value,
    key: &str,
    min: usize,
    max: usize,
) -> Result<usize, String> {
    let n = v
        .as_u64()
        .ok_or_else(|| format!("{} must be a non-negative integer", key))?;
    let n = usize::try_from(n).map_err(|_| format!("{} is too large", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_len(
    v: &serde_json::Value,
    key: &str,
    min: usize,
    max: usize,
) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    let len = s.chars().count();
    if len < min || len > max {
        return Err(format!("{} length must be in {}..={}", key, min, max));
    }
    Ok(s.to_string())
}

fn parse_deadlines(
    v: &serde_json::Value,
) -> Result<BTreeMap<AssessmentType, DateTime<Utc>>, String> {
    let obj = v
        .as_object()
        .ok_or_else(|| "deadlines must be an object".to_string())?;
    let mut out = BTreeMap::new();
    for (k, raw) in obj {
        let assessment_type = AssessmentType::parse(k)
            .ok_or_else(|| format!("deadlines.{} is not a known assessment type", k))?;
        let s = raw
            .as_str()
            .ok_or_else(|| format!("deadlines.{} must be an RFC 3339 string", k))?;
        let at = DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("deadlines.{}: {}", k, e))?
            .with_timezone(&Utc);
        out.insert(assessment_type, at);
    }
    Ok(out)
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: EngineConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.reports_check()
            .map_err(|m| anyhow::anyhow!("invalid config {}: {}", path.display(), m))?;
        Ok(cfg)
    }

    /// Reads the file named by `ASSESSD_CONFIG`, or falls back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(p) => Self::load(Path::new(&p)),
            None => Ok(Self::default()),
        }
    }

    fn reports_check(&self) -> Result<(), String> {
        let r = &self.reports;
        if !(3..=64).contains(&r.short_label_max_chars) {
            return Err("shortLabelMaxChars must be in 3..=64".to_string());
        }
        let label_len = r.unknown_group_label.trim().chars().count();
        if !(1..=40).contains(&label_len) {
            return Err("unknownGroupLabel length must be in 1..=40".to_string());
        }
        Ok(())
    }

    pub fn section_json(&self, section: SetupSection) -> serde_json::Value {
        let v = match section {
            SetupSection::Completion => serde_json::to_value(&self.completion),
            SetupSection::Reports => serde_json::to_value(&self.reports),
        };
        v.unwrap_or(serde_json::Value::Null)
    }

    /// Applies a partial update to one section. Nothing changes unless every
    /// key in the patch validates.
    pub fn apply_patch(
        &mut self,
        section: SetupSection,
        patch: &serde_json::Value,
    ) -> Result<(), String> {
        let obj = patch
            .as_object()
            .ok_or_else(|| "patch must be an object".to_string())?;
        match section {
            SetupSection::Completion => {
                let mut next = self.completion.clone();
                for (k, v) in obj {
                    match k.as_str() {
                        "deadlines" => next.deadlines = parse_deadlines(v)?,
                        _ => return Err(format!("unknown completion key: {}", k)),
                    }
                }
                self.completion = next;
            }
            SetupSection::Reports => {
                let mut next = self.reports.clone();
                for (k, v) in obj {
                    match k.as_str() {
                        "shortLabelMaxChars" => {
                            next.short_label_max_chars = parse_usize_range(v, k, 3, 64)?
                        }
                        "unknownGroupLabel" => {
                            next.unknown_group_label = parse_string_len(v, k, 1, 40)?
                        }
                        _ => return Err(format!("unknown reports key: {}", k)),
                    }
                }
                self.reports = next;
            }
        }
        Ok(())
    }
}
