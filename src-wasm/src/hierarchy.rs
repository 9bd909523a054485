//! Schedule hierarchy reconstruction engine
//!
//! Rebuilds the three-level phase -> milestone -> activity tree from the
//! flat record list served by the backend, and flattens it back for
//! record-at-a-time persistence. Reconstruction is total: malformed or
//! orphaned records degrade to defaults and placeholder ancestors, never
//! to an error.

use crate::date_utils::month_span;
use crate::types::{Activity, Milestone, NameMaps, Phase, RebuildResult, RebuildStats, ScheduleRecord};
use std::collections::HashMap;

pub const LEVEL_PHASE: i32 = 1;
pub const LEVEL_MILESTONE: i32 = 2;
pub const LEVEL_ACTIVITY: i32 = 3;

/// Prefix for phases synthesized to host an orphaned milestone chain
const PLACEHOLDER_PHASE_PREFIX: &str = "PHASE-";

/// Sibling sort key applied when the record carries none
const DEFAULT_SORT_ORDER: i32 = 1;

/// Resolve a display name from a catalog map, falling back to the code
/// itself when the catalog has no entry for it
pub fn lookup_or_default(map: &HashMap<String, String>, code: &str) -> String {
    map.get(code).cloned().unwrap_or_else(|| code.to_string())
}

/// Locate a milestone by code across all phases
/// Returns (phase index, milestone index) of the first match
pub(crate) fn find_milestone_pos(phases: &[Phase], code: &str) -> Option<(usize, usize)> {
    for (pi, phase) in phases.iter().enumerate() {
        if let Some(mi) = phase.milestones.iter().position(|m| m.code == code) {
            return Some((pi, mi));
        }
    }
    None
}

fn new_milestone(code: &str, title: String, record: Option<&ScheduleRecord>) -> Milestone {
    let start_date = record
        .and_then(|r| r.start_date.clone())
        .unwrap_or_default();
    let end_date = record.and_then(|r| r.end_date.clone()).unwrap_or_default();
    let months = month_span(&start_date, &end_date);

    Milestone {
        id: code.to_string(),
        code: code.to_string(),
        title,
        start_date,
        end_date,
        months,
        sort_order: record
            .and_then(|r| r.hierarchy_order)
            .unwrap_or(DEFAULT_SORT_ORDER),
        activities: Vec::new(),
    }
}

/// Rebuild the schedule tree from a flat record list
///
/// Records are processed in input order. Phases come back in first-seen
/// order of distinct phase codes; sorting by sortOrder is left to
/// `sort_for_display`. Duplicate codes at the same level are dropped
/// silently (first occurrence wins), and a placeholder synthesized for an
/// orphaned child is never merged with a later authentic ancestor record.
pub fn reconstruct(records: &[ScheduleRecord], names: &NameMaps) -> RebuildResult {
    let mut phases: Vec<Phase> = Vec::new();
    let mut placeholder_count = 0;

    for record in records {
        match record.level {
            LEVEL_PHASE => {
                if !phases.iter().any(|p| p.id == record.schedule_code) {
                    phases.push(Phase {
                        id: record.schedule_code.clone(),
                        name: lookup_or_default(&names.phases, &record.schedule_code),
                        sort_order: record.hierarchy_order.unwrap_or(DEFAULT_SORT_ORDER),
                        milestones: Vec::new(),
                    });
                }
            }
            LEVEL_MILESTONE => {
                let phase_code = record.parent_code.clone().unwrap_or_default();

                let pi = match phases.iter().position(|p| p.id == phase_code) {
                    Some(pi) => pi,
                    None => {
                        phases.push(Phase {
                            id: phase_code.clone(),
                            name: lookup_or_default(&names.phases, &phase_code),
                            sort_order: DEFAULT_SORT_ORDER,
                            milestones: Vec::new(),
                        });
                        placeholder_count += 1;
                        phases.len() - 1
                    }
                };

                let phase = &mut phases[pi];
                if !phase
                    .milestones
                    .iter()
                    .any(|m| m.code == record.schedule_code)
                {
                    let title = lookup_or_default(&names.milestones, &record.schedule_code);
                    phase
                        .milestones
                        .push(new_milestone(&record.schedule_code, title, Some(record)));
                }
            }
            LEVEL_ACTIVITY => {
                let milestone_code = record.parent_code.clone().unwrap_or_default();

                let (pi, mi) = match find_milestone_pos(&phases, &milestone_code) {
                    Some(pos) => pos,
                    None => {
                        // No milestone anywhere in the tree owns this
                        // activity yet: synthesize both a host phase and a
                        // host milestone so the record is not dropped
                        let placeholder_id =
                            format!("{}{}", PLACEHOLDER_PHASE_PREFIX, milestone_code);
                        let title = lookup_or_default(&names.milestones, &milestone_code);
                        phases.push(Phase {
                            id: placeholder_id.clone(),
                            name: lookup_or_default(&names.phases, &placeholder_id),
                            sort_order: DEFAULT_SORT_ORDER,
                            milestones: vec![new_milestone(&milestone_code, title, None)],
                        });
                        placeholder_count += 2;
                        (phases.len() - 1, 0)
                    }
                };

                let milestone = &mut phases[pi].milestones[mi];
                if !milestone
                    .activities
                    .iter()
                    .any(|a| a.id == record.schedule_code)
                {
                    milestone.activities.push(Activity {
                        id: record.schedule_code.clone(),
                        title: lookup_or_default(&names.activities, &record.schedule_code),
                        start_date: record.start_date.clone().unwrap_or_default(),
                        end_date: record.end_date.clone().unwrap_or_default(),
                        sort_order: record.hierarchy_order.unwrap_or(DEFAULT_SORT_ORDER),
                    });
                }
            }
            _ => {
                // Unknown level: skip the record, reconstruction never fails
            }
        }
    }

    let milestone_count: usize = phases.iter().map(|p| p.milestones.len()).sum();
    let activity_count: usize = phases
        .iter()
        .flat_map(|p| p.milestones.iter())
        .map(|m| m.activities.len())
        .sum();

    let stats = RebuildStats {
        calc_time: 0.0,
        record_count: records.len() as i32,
        phase_count: phases.len() as i32,
        milestone_count: milestone_count as i32,
        activity_count: activity_count as i32,
        placeholder_count,
        error: None,
    };

    RebuildResult { phases, stats }
}

/// Flatten the tree back into the backend's record shape
///
/// Inverse of `reconstruct` for persistence: one record per entity, parent
/// coded by containment. hierarchyOrder carries the entity's sortOrder.
pub fn flatten(phases: &[Phase], project_code: &str) -> Vec<ScheduleRecord> {
    let mut records = Vec::new();

    for phase in phases {
        records.push(ScheduleRecord {
            project_code: project_code.to_string(),
            schedule_code: phase.id.clone(),
            level: LEVEL_PHASE,
            parent_code: None,
            start_date: None,
            end_date: None,
            hierarchy_order: Some(phase.sort_order),
        });

        for milestone in &phase.milestones {
            records.push(ScheduleRecord {
                project_code: project_code.to_string(),
                schedule_code: milestone.code.clone(),
                level: LEVEL_MILESTONE,
                parent_code: Some(phase.id.clone()),
                start_date: some_if_present(&milestone.start_date),
                end_date: some_if_present(&milestone.end_date),
                hierarchy_order: Some(milestone.sort_order),
            });

            for activity in &milestone.activities {
                records.push(ScheduleRecord {
                    project_code: project_code.to_string(),
                    schedule_code: activity.id.clone(),
                    level: LEVEL_ACTIVITY,
                    parent_code: Some(milestone.code.clone()),
                    start_date: some_if_present(&activity.start_date),
                    end_date: some_if_present(&activity.end_date),
                    hierarchy_order: Some(activity.sort_order),
                });
            }
        }
    }

    records
}

fn some_if_present(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Order every level of the tree by sortOrder for presentation
///
/// Stable sort, so siblings sharing a sortOrder keep their reconstruction
/// (first-seen) order.
pub fn sort_for_display(phases: &mut [Phase]) {
    phases.sort_by_key(|p| p.sort_order);
    for phase in phases.iter_mut() {
        phase.milestones.sort_by_key(|m| m.sort_order);
        for milestone in phase.milestones.iter_mut() {
            milestone.activities.sort_by_key(|a| a.sort_order);
        }
    }
}
