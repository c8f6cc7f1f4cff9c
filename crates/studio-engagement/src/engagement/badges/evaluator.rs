//! Pure criterion predicates over a client's activity snapshot.
//!
//! Evaluation never fails: missing data means the criterion is simply not
//! met. All numeric thresholds are inclusive.

use chrono::{Datelike, NaiveDate, Timelike, Weekday};

use super::domain::Criterion;
use crate::engagement::clients::{ActivitySnapshot, SessionRecord, SessionStatus};

/// Sessions count as "morning" when they start before this tenant-local hour.
const MORNING_CUTOFF_HOUR: u32 = 9;

/// Evaluate a single criterion against recorded activity.
pub fn evaluate(criterion: &Criterion, activity: &ActivitySnapshot) -> bool {
    match criterion {
        Criterion::FirstSession => completed_count(activity) >= 1,
        Criterion::SessionsCompleted { required } => completed_count(activity) >= *required,
        Criterion::MorningSessions { required } => morning_count(activity) >= *required,
        Criterion::WeekendSessions { required } => weekend_count(activity) >= *required,
        Criterion::WeightGoal => weight_goal_met(activity),
        Criterion::MeasurementLogged { required } => activity.measurement_count >= *required,
        Criterion::ConsecutiveWeeks { required } => weekly_streak(activity) >= *required,
        Criterion::CreditsPurchased { minimum_spend } => {
            activity.paid_order_total >= *minimum_spend
        }
    }
}

fn completed_sessions(activity: &ActivitySnapshot) -> impl Iterator<Item = &SessionRecord> {
    activity
        .sessions
        .iter()
        .filter(|session| session.status == SessionStatus::Completed)
}

fn completed_count(activity: &ActivitySnapshot) -> u32 {
    completed_sessions(activity).count() as u32
}

fn morning_count(activity: &ActivitySnapshot) -> u32 {
    completed_sessions(activity)
        .filter(|session| session.scheduled_at.hour() < MORNING_CUTOFF_HOUR)
        .count() as u32
}

fn weekend_count(activity: &ActivitySnapshot) -> u32 {
    completed_sessions(activity)
        .filter(|session| {
            matches!(
                session.scheduled_at.weekday(),
                Weekday::Sat | Weekday::Sun
            )
        })
        .count() as u32
}

fn weight_goal_met(activity: &ActivitySnapshot) -> bool {
    match (activity.current_weight, activity.target_weight) {
        (Some(current), Some(target)) => current <= target,
        _ => false,
    }
}

/// Longest run of adjacent ISO weeks that each contain a completed session.
///
/// Completed-session timestamps are bucketed by their ISO-week start
/// (Monday), the distinct buckets are walked newest-first, and a run keeps
/// growing while each bucket sits exactly seven days before its predecessor.
fn weekly_streak(activity: &ActivitySnapshot) -> u32 {
    let mut week_starts: Vec<NaiveDate> = completed_sessions(activity)
        .map(|session| iso_week_start(session.scheduled_at.date()))
        .collect();
    week_starts.sort_unstable_by(|a, b| b.cmp(a));
    week_starts.dedup();

    let mut best: u32 = 0;
    let mut run: u32 = 0;
    let mut previous: Option<NaiveDate> = None;

    for start in week_starts {
        run = match previous {
            Some(prev) if prev - start == chrono::Duration::days(7) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(start);
    }

    best
}

fn iso_week_start(date: NaiveDate) -> NaiveDate {
    let week = date.iso_week();
    NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon)
        .unwrap_or(date)
}
