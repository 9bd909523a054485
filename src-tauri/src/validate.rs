//! Business-rule validation for schedule edits
//!
//! Pure checks run before a local edit is accepted and its save issued.
//! Each validator accumulates user-facing messages; an empty list means
//! the edit may proceed. Dates are ISO strings and compared
//! lexicographically, like everywhere else in the engine.

use crate::date_utils::month_span;
use crate::types::{Milestone, Phase};

const MIN_MILESTONE_MONTHS: i32 = 1;
const MAX_MILESTONE_MONTHS: i32 = 48;

/// Validate a new milestone against the phase it would join
///
/// Checks, in order: required fields, strict date order, duration bounds
/// (1 to 48 calendar months), and overlap with the milestones already in
/// the phase. Overlap uses strict inequality, so a milestone starting the
/// day another ends is allowed, and only the first conflicting milestone
/// is reported.
pub fn validate_new_milestone(
    phase: &Phase,
    milestone_code: &str,
    start_date: &str,
    end_date: &str,
) -> Vec<String> {
    let mut errors = Vec::new();

    if milestone_code.is_empty() {
        errors.push("Milestone selection is required".to_string());
    }
    if start_date.is_empty() {
        errors.push("Start date is required".to_string());
    }
    if end_date.is_empty() {
        errors.push("End date is required".to_string());
    }
    if !errors.is_empty() {
        return errors;
    }

    if end_date <= start_date {
        errors.push("End date must be after start date".to_string());
        return errors;
    }

    let months = month_span(start_date, end_date);
    if months < MIN_MILESTONE_MONTHS {
        errors.push(format!(
            "Milestone duration must be at least {} month",
            MIN_MILESTONE_MONTHS
        ));
    } else if months > MAX_MILESTONE_MONTHS {
        errors.push(format!(
            "Milestone duration cannot exceed {} months",
            MAX_MILESTONE_MONTHS
        ));
    }

    if let Some(conflict) = find_overlap(&phase.milestones, start_date, end_date) {
        errors.push(format!(
            "Dates overlap milestone {} ({} to {})",
            conflict.code, conflict.start_date, conflict.end_date
        ));
    }

    errors
}

/// First milestone whose date range overlaps the proposed one
///
/// Overlap test: newStart < existingEnd AND newEnd > existingStart.
/// Touching endpoints do not overlap.
fn find_overlap<'a>(
    milestones: &'a [Milestone],
    start_date: &str,
    end_date: &str,
) -> Option<&'a Milestone> {
    milestones.iter().find(|existing| {
        start_date < existing.end_date.as_str() && end_date > existing.start_date.as_str()
    })
}

/// Validate a new phase against the phases already in the tree
pub fn validate_new_phase(phases: &[Phase], phase_code: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if phase_code.is_empty() {
        errors.push("Phase selection is required".to_string());
    } else if phases.iter().any(|p| p.id == phase_code) {
        errors.push(format!("Phase {} is already in the schedule", phase_code));
    }

    errors
}

/// Validate a new activity against the milestone it would join
pub fn validate_new_activity(
    milestone: &Milestone,
    activity_code: &str,
    start_date: &str,
    end_date: &str,
) -> Vec<String> {
    let mut errors = Vec::new();

    if activity_code.is_empty() {
        errors.push("Activity selection is required".to_string());
    }
    if start_date.is_empty() {
        errors.push("Start date is required".to_string());
    }
    if end_date.is_empty() {
        errors.push("End date is required".to_string());
    }
    if !errors.is_empty() {
        return errors;
    }

    if end_date <= start_date {
        errors.push("End date must be after start date".to_string());
        return errors;
    }

    if milestone
        .activities
        .iter()
        .any(|a| a.id == activity_code)
    {
        errors.push(format!(
            "Activity {} is already in milestone {}",
            activity_code, milestone.code
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Activity;

    fn phase_with(milestones: Vec<Milestone>) -> Phase {
        Phase {
            id: "P1".to_string(),
            name: "Execution".to_string(),
            sort_order: 1,
            milestones,
        }
    }

    fn milestone(code: &str, start: &str, end: &str) -> Milestone {
        Milestone {
            id: code.to_string(),
            code: code.to_string(),
            title: code.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            months: month_span(start, end),
            sort_order: 1,
            activities: Vec::new(),
        }
    }

    #[test]
    fn missing_fields_each_report_one_error() {
        let phase = phase_with(Vec::new());
        let errors = validate_new_milestone(&phase, "", "", "");
        assert_eq!(errors.len(), 3);

        let errors = validate_new_milestone(&phase, "M1", "2025-01-01", "");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("End date"));
    }

    #[test]
    fn end_must_be_strictly_after_start() {
        let phase = phase_with(Vec::new());

        let errors = validate_new_milestone(&phase, "M1", "2025-03-01", "2025-01-01");
        assert_eq!(errors, vec!["End date must be after start date".to_string()]);

        let errors = validate_new_milestone(&phase, "M1", "2025-03-01", "2025-03-01");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn duration_bounds_are_inclusive_of_48() {
        let phase = phase_with(Vec::new());

        // under a month: rejected
        let errors = validate_new_milestone(&phase, "M1", "2025-03-01", "2025-03-20");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least"));

        // exactly 48 months: accepted
        let errors = validate_new_milestone(&phase, "M1", "2025-01-15", "2029-01-10");
        assert!(errors.is_empty());

        // 49 months: rejected
        let errors = validate_new_milestone(&phase, "M1", "2025-01-15", "2029-02-10");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("exceed"));
    }

    #[test]
    fn overlap_reports_first_conflict_only() {
        let phase = phase_with(vec![
            milestone("M1", "2025-01-01", "2025-03-01"),
            milestone("M2", "2025-03-01", "2025-06-01"),
        ]);

        let errors = validate_new_milestone(&phase, "M3", "2025-02-01", "2025-04-01");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("M1"));
        assert!(!errors[0].contains("M2"));
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let phase = phase_with(vec![milestone("M1", "2025-01-01", "2025-03-01")]);

        let errors = validate_new_milestone(&phase, "M2", "2025-03-01", "2025-05-01");
        assert!(errors.is_empty());
    }

    #[test]
    fn duplicate_phase_is_rejected() {
        let phases = vec![phase_with(Vec::new())];

        assert!(validate_new_phase(&phases, "P2").is_empty());

        let errors = validate_new_phase(&phases, "P1");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("P1"));

        assert_eq!(validate_new_phase(&phases, "").len(), 1);
    }

    #[test]
    fn activity_checks_fields_order_and_duplicates() {
        let mut host = milestone("M1", "2025-01-01", "2025-06-01");
        host.activities.push(Activity {
            id: "A1".to_string(),
            title: "A1".to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-02-01".to_string(),
            sort_order: 1,
        });

        let errors = validate_new_activity(&host, "", "", "");
        assert_eq!(errors.len(), 3);

        let errors = validate_new_activity(&host, "A2", "2025-04-01", "2025-02-01");
        assert_eq!(errors.len(), 1);

        let errors = validate_new_activity(&host, "A1", "2025-02-01", "2025-03-01");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("A1"));

        let errors = validate_new_activity(&host, "A2", "2025-02-01", "2025-03-01");
        assert!(errors.is_empty());
    }
}
