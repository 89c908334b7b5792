use chrono::{DateTime, Utc};

use crate::ipc::error::HandlerErr;
use crate::ipc::types::Request;
use crate::model::AssessmentType;
use crate::snapshot::Snapshot;

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, HandlerErr> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string or null", key))),
    }
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing numeric {}", key)))
}

pub fn assessment_type(req: &Request) -> Result<AssessmentType, HandlerErr> {
    let raw = required_str(req, "assessmentType")?;
    AssessmentType::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown assessmentType: {}", raw)))
}

/// `params.now` pins the clock for a transition; defaults to the current time.
pub fn now_param(req: &Request) -> Result<DateTime<Utc>, HandlerErr> {
    match optional_str(req, "now")? {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| HandlerErr::bad_params(format!("now must be RFC 3339: {}", e))),
    }
}

fn no_snapshot() -> HandlerErr {
    HandlerErr {
        code: "no_snapshot",
        message: "load a snapshot first".to_string(),
        details: None,
    }
}

pub fn snapshot(snapshot: &Option<Snapshot>) -> Result<&Snapshot, HandlerErr> {
    snapshot.as_ref().ok_or_else(no_snapshot)
}

pub fn known_participant(snapshot: &Snapshot, participant_id: &str) -> Result<(), HandlerErr> {
    if snapshot.has_participant(participant_id) {
        Ok(())
    } else {
        Err(crate::error::EngineError::UnknownParticipant(participant_id.to_string()).into())
    }
}

pub fn snapshot_mut(snapshot: &mut Option<Snapshot>) -> Result<&mut Snapshot, HandlerErr> {
    snapshot.as_mut().ok_or_else(no_snapshot)
}
