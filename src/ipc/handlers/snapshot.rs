use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{snapshot, snapshot_mut};
use crate::ipc::types::{AppState, Request};
use crate::model::ScoreRecord;
use crate::snapshot::{Snapshot, SnapshotInput};
use serde_json::json;

fn snapshot_load(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let input: SnapshotInput = serde_json::from_value(req.params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid snapshot: {}", e)))?;
    let snap = Snapshot::from_input(input)?;

    let unknown = snap
        .scores
        .iter()
        .filter(|s| !snap.tree.contains_competency(&s.competency_id))
        .count();
    if unknown > 0 {
        tracing::warn!(unknown, "snapshot has scores for competencies outside the tree");
    }
    tracing::info!(
        categories = snap.tree.categories().len(),
        participants = snap.participants.len(),
        scores = snap.scores.len(),
        completions = snap.completions.len(),
        "snapshot loaded"
    );

    let status = status_json(&snap);
    state.snapshot = Some(snap);
    state.derived.clear();
    Ok(status)
}

fn status_json(snap: &Snapshot) -> serde_json::Value {
    json!({
        "categories": snap.tree.categories().len(),
        "participants": snap.participants.len(),
        "scores": snap.scores.len(),
        "completions": snap.completions.len()
    })
}

fn snapshot_status(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(status_json(snapshot(&state.snapshot)?))
}

fn scores_upsert(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let Some(raw) = req.params.get("scores") else {
        return Err(HandlerErr::bad_params("missing scores"));
    };
    let incoming: Vec<ScoreRecord> = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid scores: {}", e)))?;
    let snap = snapshot_mut(&mut state.snapshot)?;

    let appended = incoming.len();
    // Appending keeps history; the calculators read the latest write.
    snap.scores.extend(incoming);
    Ok(json!({ "appended": appended, "scores": snap.scores.len() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "snapshot.load" => Some(respond(&req.id, snapshot_load(state, req))),
        "snapshot.status" => Some(respond(&req.id, snapshot_status(state))),
        "scores.upsert" => Some(respond(&req.id, scores_upsert(state, req))),
        _ => None,
    }
}
