use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::error::TransitionRejected;
use crate::grades::validate_grade;
use crate::model::{AssessmentType, ChangeEvent, ChangeKind, CompletionRecord, Participant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionState {
    Draft,
    Final,
    Locked,
}

/// A Final record whose deadline has passed is read-only.
pub fn is_locked(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    record.completed && deadline.map(|d| now >= d).unwrap_or(false)
}

pub fn state_of(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CompletionState {
    if is_locked(record, deadline, now) {
        CompletionState::Locked
    } else if record.completed {
        CompletionState::Final
    } else {
        CompletionState::Draft
    }
}

/// Result of an accepted transition: the new record plus the event the
/// caller must publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub record: CompletionRecord,
    pub event: ChangeEvent,
}

fn ensure_unlocked(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), TransitionRejected> {
    match deadline {
        Some(d) if is_locked(record, deadline, now) => Err(TransitionRejected::DeadlinePassed {
            assessment_type: record.assessment_type,
            deadline: d,
        }),
        _ => Ok(()),
    }
}

fn parse_suggestion(input: &str) -> Result<f64, TransitionRejected> {
    let v = validate_grade(input);
    match (v.is_valid, v.value) {
        (true, Some(g)) => Ok(g),
        _ => Err(TransitionRejected::InvalidGrade(
            v.error.unwrap_or_else(|| "invalid grade".to_string()),
        )),
    }
}

/// Draft → Final. Not deadline-checked: finalizing late is allowed.
pub fn mark_final(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    author: &str,
    grade_suggestion: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionRejected> {
    ensure_unlocked(record, deadline, now)?;
    if record.completed {
        return Err(TransitionRejected::AlreadyFinal);
    }
    let suggestion = grade_suggestion.map(parse_suggestion).transpose()?;

    let mut next = record.clone();
    next.completed = true;
    next.completed_at = Some(now);
    next.author = Some(author.to_string());
    if suggestion.is_some() {
        next.grade_suggestion = suggestion;
    }
    let event = ChangeEvent::new(ChangeKind::Finalized, &next, Some(author), now);
    Ok(Transition { record: next, event })
}

/// Final → Draft, only while `now` is before the deadline.
pub fn unmark_final(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionRejected> {
    if !record.completed {
        return Err(TransitionRejected::NotFinal);
    }
    ensure_unlocked(record, deadline, now)?;

    let mut next = record.clone();
    next.completed = false;
    next.completed_at = None;
    next.author = None;
    let event = ChangeEvent::new(ChangeKind::Reopened, &next, Some(actor), now);
    Ok(Transition { record: next, event })
}

pub fn set_grade_suggestion(
    record: &CompletionRecord,
    deadline: Option<DateTime<Utc>>,
    actor: &str,
    input: &str,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionRejected> {
    ensure_unlocked(record, deadline, now)?;
    let grade = parse_suggestion(input)?;

    let mut next = record.clone();
    next.grade_suggestion = Some(grade);
    let event = ChangeEvent::new(ChangeKind::GradeSuggestionChanged, &next, Some(actor), now);
    Ok(Transition { record: next, event })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

pub fn completion_progress(
    participants: &[Participant],
    completions: &[CompletionRecord],
    assessment_type: AssessmentType,
) -> CompletionProgress {
    let done: HashSet<&str> = completions
        .iter()
        .filter(|c| c.assessment_type == assessment_type && c.completed)
        .map(|c| c.participant_id.as_str())
        .collect();
    let completed = participants
        .iter()
        .filter(|p| done.contains(p.id.as_str()))
        .count();
    CompletionProgress {
        total: participants.len(),
        completed,
        remaining: participants.len().saturating_sub(completed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    fn final_record() -> CompletionRecord {
        CompletionRecord {
            completed: true,
            completed_at: Some(now() - Duration::days(2)),
            author: Some("tutor-1".to_string()),
            ..CompletionRecord::draft("p1", AssessmentType::Assessment)
        }
    }

    #[test]
    fn mark_final_records_author_and_time() {
        let draft = CompletionRecord::draft("p1", AssessmentType::Assessment);
        let deadline = Some(now() + Duration::days(1));
        let t = mark_final(&draft, deadline, "tutor-1", None, now()).expect("mark");
        assert!(t.record.completed);
        assert_eq!(t.record.completed_at, Some(now()));
        assert_eq!(t.record.author.as_deref(), Some("tutor-1"));
        assert_eq!(t.event.kind, ChangeKind::Finalized);
        assert_eq!(t.event.participant_id, "p1");
        assert!(!draft.completed);
    }

    #[test]
    fn mark_final_ignores_deadline_for_drafts() {
        let draft = CompletionRecord::draft("p1", AssessmentType::Assessment);
        let t = mark_final(&draft, Some(now() - Duration::days(1)), "tutor-1", None, now())
            .expect("late finalize");
        assert!(t.record.completed);
    }

    #[test]
    fn unmark_before_deadline_reopens() {
        let t = unmark_final(&final_record(), Some(now() + Duration::hours(1)), "tutor-2", now())
            .expect("unmark");
        assert!(!t.record.completed);
        assert_eq!(t.record.completed_at, None);
        assert_eq!(t.record.author, None);
        assert_eq!(t.event.kind, ChangeKind::Reopened);
        assert_eq!(t.event.author.as_deref(), Some("tutor-2"));
    }

    #[test]
    fn unmark_at_or_after_deadline_is_rejected() {
        let record = final_record();
        for deadline in [now(), now() - Duration::days(1)] {
            let err = unmark_final(&record, Some(deadline), "tutor-1", now()).expect_err("locked");
            assert_eq!(err.code(), "deadline_passed");
        }
        assert!(record.completed);
        assert_eq!(state_of(&record, Some(now()), now()), CompletionState::Locked);
    }

    #[test]
    fn without_deadline_nothing_locks() {
        let record = final_record();
        assert_eq!(state_of(&record, None, now()), CompletionState::Final);
        assert!(unmark_final(&record, None, "tutor-1", now()).is_ok());
    }

    #[test]
    fn repeated_transitions_are_rejected() {
        let err = mark_final(&final_record(), None, "tutor-1", None, now()).expect_err("final");
        assert_eq!(err, TransitionRejected::AlreadyFinal);
        let draft = CompletionRecord::draft("p1", AssessmentType::Assessment);
        let err = unmark_final(&draft, None, "tutor-1", now()).expect_err("draft");
        assert_eq!(err, TransitionRejected::NotFinal);
    }

    #[test]
    fn invalid_suggestion_blocks_finalizing() {
        let draft = CompletionRecord::draft("p1", AssessmentType::Assessment);
        let err = mark_final(&draft, None, "tutor-1", Some("2.4"), now()).expect_err("grade");
        assert_eq!(err.code(), "validation_failed");
        let t = mark_final(&draft, None, "tutor-1", Some("1.7"), now()).expect("mark");
        assert_eq!(t.record.grade_suggestion, Some(1.7));
    }

    #[test]
    fn grade_suggestion_respects_lock() {
        let record = final_record();
        let t = set_grade_suggestion(&record, Some(now() + Duration::days(1)), "t", "3.3", now())
            .expect("open");
        assert_eq!(t.record.grade_suggestion, Some(3.3));
        assert_eq!(t.event.kind, ChangeKind::GradeSuggestionChanged);
        let err =
            set_grade_suggestion(&record, Some(now()), "t", "3.3", now()).expect_err("locked");
        assert_eq!(err.code(), "deadline_passed");
    }

    #[test]
    fn progress_counts_only_cohort_members() {
        let participants = ["p1", "p2", "p3"]
            .iter()
            .map(|id| Participant {
                id: id.to_string(),
                name: id.to_string(),
                gender: None,
                nationality: None,
                team: None,
            })
            .collect::<Vec<_>>();
        let mut stray = final_record();
        stray.participant_id = "outsider".to_string();
        let mut self_eval = final_record();
        self_eval.participant_id = "p2".to_string();
        self_eval.assessment_type = AssessmentType::SelfEvaluation;
        let completions = vec![final_record(), stray, self_eval];

        let p = completion_progress(&participants, &completions, AssessmentType::Assessment);
        assert_eq!(p, CompletionProgress { total: 3, completed: 1, remaining: 2 });
        let none = completion_progress(&[], &completions, AssessmentType::Assessment);
        assert_eq!(none.remaining, 0);
    }
}
