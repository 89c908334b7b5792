use chrono::{DateTime, Utc};
use serde_json::json;

use crate::completion::{self, Transition};
use crate::error::TransitionRejected;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    assessment_type, known_participant, now_param, optional_str, required_str, snapshot,
    snapshot_mut,
};
use crate::ipc::types::{AppState, Request};
use crate::model::CompletionRecord;

fn completion_get(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let participant_id = required_str(req, "participantId")?;
    let assessment_type = assessment_type(req)?;
    let now = now_param(req)?;
    let snap = snapshot(&state.snapshot)?;
    known_participant(snap, &participant_id)?;

    let record = snap.completion(&participant_id, assessment_type);
    let deadline = state.config.completion.deadline(assessment_type);
    Ok(json!({
        "record": record,
        "state": completion::state_of(&record, deadline, now),
        "deadline": deadline,
        "locked": completion::is_locked(&record, deadline, now)
    }))
}

/// Runs one transition against the stored record. On rejection the stored
/// record is untouched and echoed back in the error details.
fn run_transition<F>(
    state: &mut AppState,
    req: &Request,
    op: F,
) -> Result<serde_json::Value, HandlerErr>
where
    F: FnOnce(
        &CompletionRecord,
        Option<DateTime<Utc>>,
        DateTime<Utc>,
    ) -> Result<Transition, TransitionRejected>,
{
    let participant_id = required_str(req, "participantId")?;
    let assessment_type = assessment_type(req)?;
    let now = now_param(req)?;
    let deadline = state.config.completion.deadline(assessment_type);

    let snap = snapshot_mut(&mut state.snapshot)?;
    known_participant(snap, &participant_id)?;
    let current = snap.completion(&participant_id, assessment_type);

    let transition = match op(&current, deadline, now) {
        Ok(t) => t,
        Err(rejected) => {
            tracing::warn!(
                method = %req.method,
                participant = %participant_id,
                assessment_type = %assessment_type,
                reason = %rejected,
                "completion transition rejected"
            );
            let mut e = HandlerErr::from(rejected);
            let mut details = e.details.take().unwrap_or_else(|| json!({}));
            details["record"] = json!(current);
            e.details = Some(details);
            return Err(e);
        }
    };

    snap.store_completion(transition.record.clone());
    state.publish(transition.event.clone());
    Ok(json!({
        "record": transition.record,
        "event": transition.event
    }))
}

fn completion_mark_final(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let author = required_str(req, "author")?;
    let suggestion = optional_str(req, "gradeSuggestion")?;
    run_transition(state, req, |record, deadline, now| {
        completion::mark_final(record, deadline, &author, suggestion.as_deref(), now)
    })
}

fn completion_unmark_final(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = required_str(req, "author")?;
    run_transition(state, req, |record, deadline, now| {
        completion::unmark_final(record, deadline, &actor, now)
    })
}

fn completion_set_grade_suggestion(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = required_str(req, "author")?;
    // Only an explicit empty string counts as a blank grade.
    let input = required_str(req, "gradeSuggestion")?;
    run_transition(state, req, |record, deadline, now| {
        completion::set_grade_suggestion(record, deadline, &actor, &input, now)
    })
}

fn completion_progress(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let assessment_type = assessment_type(req)?;
    let snap = snapshot(&state.snapshot)?;
    let progress = state.derived.progress(snap, assessment_type);
    Ok(json!({
        "assessmentType": assessment_type,
        "progress": progress
    }))
}

fn events_drain(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let events = std::mem::take(&mut state.pending_events);
    Ok(json!({ "events": events }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "completion.get" => Some(respond(&req.id, completion_get(state, req))),
        "completion.markFinal" => Some(respond(&req.id, completion_mark_final(state, req))),
        "completion.unmarkFinal" => Some(respond(&req.id, completion_unmark_final(state, req))),
        "completion.setGradeSuggestion" => {
            Some(respond(&req.id, completion_set_grade_suggestion(state, req)))
        }
        "completion.progress" => Some(respond(&req.id, completion_progress(state, req))),
        "events.drain" => Some(respond(&req.id, events_drain(state))),
        _ => None,
    }
}
