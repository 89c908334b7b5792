use crate::distribution::{self, Dimension};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{assessment_type, required_str, snapshot};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn reports_distribution(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let raw = required_str(req, "dimension")?;
    let dimension = Dimension::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown dimension: {}", raw)))?;
    let snap = snapshot(&state.snapshot)?;

    let points = distribution::distribution(
        dimension,
        &snap.tree,
        &snap.participants,
        &snap.scores,
        &state.config.reports,
    );
    Ok(json!({
        "dimension": raw,
        "totalParticipants": snap.participants.len(),
        "points": points
    }))
}

fn reports_grades(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let assessment_type = assessment_type(req)?;
    let snap = snapshot(&state.snapshot)?;
    let dist = state.derived.grades(snap, assessment_type);
    Ok(json!(dist))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.distribution" => Some(respond(&req.id, reports_distribution(state, req))),
        "reports.grades" => Some(respond(&req.id, reports_grades(state, req))),
        _ => None,
    }
}
