use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{known_participant, optional_str, snapshot};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn scores_aggregate(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let snap = snapshot(&state.snapshot)?;

    if let Some(participant_id) = optional_str(req, "participantId")? {
        known_participant(snap, &participant_id)?;
        let aggregate = calc::aggregate_participant(&snap.tree, &participant_id, &snap.scores);
        return Ok(json!({
            "participantId": participant_id,
            "aggregate": aggregate
        }));
    }

    let rows = calc::aggregate_cohort(&snap.tree, &snap.participants, &snap.scores);
    let scored = rows.iter().filter(|r| r.aggregate.is_some()).count();
    Ok(json!({
        "rows": rows,
        "scoredCount": scored,
        "unscoredCount": rows.len() - scored
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scores.aggregate" => Some(respond(&req.id, scores_aggregate(state, req))),
        _ => None,
    }
}
