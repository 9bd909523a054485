//! Engine State Container
//!
//! Manages the stateful schedule data for the Rust engine.
//! Uses Mutex for thread-safe access from Tauri commands.
//!
//! Edits are optimistic: a mutation lands here first and the frontend then
//! issues the matching save against the backend resource. A failed save
//! does not roll the engine back; the frontend re-syncs by reloading the
//! flat records, which rebuilds the tree from scratch.

use crate::hierarchy::{
    find_milestone_pos, flatten, lookup_or_default, reconstruct, sort_for_display, LEVEL_ACTIVITY,
    LEVEL_MILESTONE, LEVEL_PHASE,
};
use crate::date_utils::month_span;
use crate::types::{
    Activity, Milestone, NameMaps, Phase, RebuildResult, ReferenceCatalogs, ScheduleRecord,
};
use crate::validate::{validate_new_activity, validate_new_milestone, validate_new_phase};
use std::sync::Mutex;
use std::time::Instant;

/// Schedule state container
///
/// Holds the reconstructed tree and the catalog name maps for one project.
/// Protected by Mutex for thread-safe access.
#[derive(Default)]
pub struct ScheduleState {
    /// Owning project code, used when flattening records for persistence
    pub project_code: String,

    /// Reconstructed tree, in first-seen phase order
    pub phases: Vec<Phase>,

    /// Catalog code -> display name maps
    pub names: NameMaps,

    /// Initialization flag
    pub initialized: bool,
}

impl ScheduleState {
    /// Create new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Load catalog reference data, replacing the current name maps
    pub fn load_catalogs(&mut self, catalogs: &ReferenceCatalogs) {
        self.names = NameMaps::from_catalogs(catalogs);
    }

    /// Rebuild the tree from a flat record list
    ///
    /// Always a from-scratch rebuild; any local edits not yet persisted
    /// are discarded in favor of the backend's current state.
    pub fn load_records(&mut self, records: &[ScheduleRecord]) -> RebuildResult {
        let start_time = Instant::now();

        let mut result = reconstruct(records, &self.names);
        result.stats.calc_time = start_time.elapsed().as_secs_f64() * 1000.0;

        self.phases = result.phases.clone();
        result
    }

    /// Add a phase to the tree
    pub fn add_phase(&mut self, phase_code: &str, sort_order: Option<i32>) -> Result<(), String> {
        let errors = validate_new_phase(&self.phases, phase_code);
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }

        self.phases.push(Phase {
            id: phase_code.to_string(),
            name: lookup_or_default(&self.names.phases, phase_code),
            sort_order: sort_order.unwrap_or(1),
            milestones: Vec::new(),
        });
        Ok(())
    }

    /// Add a milestone to a phase, gated by the business-rule validators
    pub fn add_milestone(
        &mut self,
        phase_id: &str,
        milestone_code: &str,
        start_date: &str,
        end_date: &str,
        sort_order: Option<i32>,
    ) -> Result<(), String> {
        let pi = self
            .phases
            .iter()
            .position(|p| p.id == phase_id)
            .ok_or_else(|| format!("Phase {} not found", phase_id))?;

        let errors = validate_new_milestone(&self.phases[pi], milestone_code, start_date, end_date);
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }

        let title = lookup_or_default(&self.names.milestones, milestone_code);
        self.phases[pi].milestones.push(Milestone {
            id: milestone_code.to_string(),
            code: milestone_code.to_string(),
            title,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            months: month_span(start_date, end_date),
            sort_order: sort_order.unwrap_or(1),
            activities: Vec::new(),
        });
        Ok(())
    }

    /// Add an activity to a milestone
    pub fn add_activity(
        &mut self,
        milestone_code: &str,
        activity_code: &str,
        start_date: &str,
        end_date: &str,
        sort_order: Option<i32>,
    ) -> Result<(), String> {
        let (pi, mi) = find_milestone_pos(&self.phases, milestone_code)
            .ok_or_else(|| format!("Milestone {} not found", milestone_code))?;

        let errors = validate_new_activity(
            &self.phases[pi].milestones[mi],
            activity_code,
            start_date,
            end_date,
        );
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }

        let title = lookup_or_default(&self.names.activities, activity_code);
        self.phases[pi].milestones[mi].activities.push(Activity {
            id: activity_code.to_string(),
            title,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            sort_order: sort_order.unwrap_or(1),
        });
        Ok(())
    }

    /// Update a single entry by id and level
    /// Assumes the entry already exists
    pub fn update_entry(
        &mut self,
        id: &str,
        level: i32,
        updates: serde_json::Value,
    ) -> Result<(), String> {
        let obj = match updates.as_object() {
            Some(obj) => obj,
            None => return Err("Updates must be an object".to_string()),
        };

        match level {
            LEVEL_PHASE => {
                let phase = self
                    .phases
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| format!("Phase {} not found", id))?;

                for (key, value) in obj {
                    match key.as_str() {
                        "name" => {
                            if let Some(v) = value.as_str() {
                                phase.name = v.to_string();
                            }
                        }
                        "sortOrder" => {
                            if let Some(v) = value.as_i64() {
                                phase.sort_order = v as i32;
                            }
                        }
                        _ => {
                            // Ignore unknown fields for forward compatibility
                        }
                    }
                }
            }
            LEVEL_MILESTONE => {
                let (pi, mi) = find_milestone_pos(&self.phases, id)
                    .ok_or_else(|| format!("Milestone {} not found", id))?;
                let milestone = &mut self.phases[pi].milestones[mi];

                for (key, value) in obj {
                    match key.as_str() {
                        "title" => {
                            if let Some(v) = value.as_str() {
                                milestone.title = v.to_string();
                            }
                        }
                        "startDate" => {
                            if let Some(v) = value.as_str() {
                                milestone.start_date = v.to_string();
                            }
                        }
                        "endDate" => {
                            if let Some(v) = value.as_str() {
                                milestone.end_date = v.to_string();
                            }
                        }
                        "sortOrder" => {
                            if let Some(v) = value.as_i64() {
                                milestone.sort_order = v as i32;
                            }
                        }
                        _ => {}
                    }
                }

                // months is derived, never taken from the caller
                milestone.months = month_span(&milestone.start_date, &milestone.end_date);
            }
            LEVEL_ACTIVITY => {
                let activity = self
                    .phases
                    .iter_mut()
                    .flat_map(|p| p.milestones.iter_mut())
                    .flat_map(|m| m.activities.iter_mut())
                    .find(|a| a.id == id)
                    .ok_or_else(|| format!("Activity {} not found", id))?;

                for (key, value) in obj {
                    match key.as_str() {
                        "title" => {
                            if let Some(v) = value.as_str() {
                                activity.title = v.to_string();
                            }
                        }
                        "startDate" => {
                            if let Some(v) = value.as_str() {
                                activity.start_date = v.to_string();
                            }
                        }
                        "endDate" => {
                            if let Some(v) = value.as_str() {
                                activity.end_date = v.to_string();
                            }
                        }
                        "sortOrder" => {
                            if let Some(v) = value.as_i64() {
                                activity.sort_order = v as i32;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => return Err(format!("Unknown level {}", level)),
        }

        Ok(())
    }

    /// Delete an entry by id and level
    pub fn delete_entry(&mut self, id: &str, level: i32) -> Result<(), String> {
        match level {
            LEVEL_PHASE => {
                let before = self.phases.len();
                self.phases.retain(|p| p.id != id);
                if self.phases.len() == before {
                    return Err(format!("Phase {} not found", id));
                }
            }
            LEVEL_MILESTONE => {
                let (pi, mi) = find_milestone_pos(&self.phases, id)
                    .ok_or_else(|| format!("Milestone {} not found", id))?;
                self.phases[pi].milestones.remove(mi);
            }
            LEVEL_ACTIVITY => {
                let mut removed = false;
                for phase in self.phases.iter_mut() {
                    for milestone in phase.milestones.iter_mut() {
                        let before = milestone.activities.len();
                        milestone.activities.retain(|a| a.id != id);
                        if milestone.activities.len() != before {
                            removed = true;
                        }
                    }
                }
                if !removed {
                    return Err(format!("Activity {} not found", id));
                }
            }
            _ => return Err(format!("Unknown level {}", level)),
        }

        Ok(())
    }

    /// Get the tree ordered for presentation (sortOrder at every level)
    pub fn get_phases_ordered(&self) -> Vec<Phase> {
        let mut phases = self.phases.clone();
        sort_for_display(&mut phases);
        phases
    }

    /// Flatten the current tree into backend records for persistence
    pub fn to_records(&self) -> Vec<ScheduleRecord> {
        flatten(&self.phases, &self.project_code)
    }

    /// Get phase count
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Get milestone count across all phases
    pub fn milestone_count(&self) -> usize {
        self.phases.iter().map(|p| p.milestones.len()).sum()
    }

    /// Get activity count across all milestones
    pub fn activity_count(&self) -> usize {
        self.phases
            .iter()
            .flat_map(|p| p.milestones.iter())
            .map(|m| m.activities.len())
            .sum()
    }

    /// Clear all state
    pub fn clear(&mut self) {
        self.project_code.clear();
        self.phases.clear();
        self.names = NameMaps::default();
        self.initialized = false;
    }
}

/// Application state wrapper for Tauri
///
/// Use with `tauri::Builder::manage()` for dependency injection
pub struct AppState {
    pub schedule: Mutex<ScheduleState>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            schedule: Mutex::new(ScheduleState::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(code: &str, level: i32, parent: Option<&str>) -> ScheduleRecord {
        ScheduleRecord {
            project_code: "MP-001".to_string(),
            schedule_code: code.to_string(),
            level,
            parent_code: parent.map(|s| s.to_string()),
            start_date: Some("2025-01-01".to_string()),
            end_date: Some("2025-04-01".to_string()),
            hierarchy_order: Some(1),
        }
    }

    fn loaded_state() -> ScheduleState {
        let mut state = ScheduleState::new();
        state.project_code = "MP-001".to_string();
        state.load_records(&[
            record("P1", LEVEL_PHASE, None),
            record("M1", LEVEL_MILESTONE, Some("P1")),
            record("A1", LEVEL_ACTIVITY, Some("M1")),
        ]);
        state.initialized = true;
        state
    }

    #[test]
    fn load_records_rebuilds_from_scratch() {
        let mut state = loaded_state();
        assert_eq!(state.phase_count(), 1);
        assert_eq!(state.milestone_count(), 1);
        assert_eq!(state.activity_count(), 1);

        // a second load replaces, never accumulates
        let result = state.load_records(&[record("P2", LEVEL_PHASE, None)]);
        assert_eq!(state.phase_count(), 1);
        assert_eq!(state.phases[0].id, "P2");
        assert_eq!(result.stats.phase_count, 1);
    }

    #[test]
    fn add_milestone_blocks_on_validation() {
        let mut state = loaded_state();

        // overlaps M1 (2025-01-01 to 2025-04-01)
        let err = state
            .add_milestone("P1", "M2", "2025-02-01", "2025-06-01", None)
            .unwrap_err();
        assert!(err.contains("M1"));
        assert_eq!(state.milestone_count(), 1);

        // touching endpoint is allowed
        state
            .add_milestone("P1", "M2", "2025-04-01", "2025-06-01", Some(2))
            .unwrap();
        assert_eq!(state.milestone_count(), 2);
        assert_eq!(state.phases[0].milestones[1].months, 2);
    }

    #[test]
    fn add_into_missing_parent_is_an_error() {
        let mut state = loaded_state();

        assert!(state
            .add_milestone("P9", "M2", "2025-05-01", "2025-07-01", None)
            .is_err());
        assert!(state
            .add_activity("M9", "A2", "2025-01-01", "2025-02-01", None)
            .is_err());
    }

    #[test]
    fn update_milestone_recomputes_months() {
        let mut state = loaded_state();

        state
            .update_entry(
                "M1",
                LEVEL_MILESTONE,
                json!({ "endDate": "2025-09-01", "months": 99 }),
            )
            .unwrap();

        let milestone = &state.phases[0].milestones[0];
        assert_eq!(milestone.end_date, "2025-09-01");
        // derived, the caller's value is ignored
        assert_eq!(milestone.months, 8);
    }

    #[test]
    fn delete_entry_by_level() {
        let mut state = loaded_state();

        state.delete_entry("A1", LEVEL_ACTIVITY).unwrap();
        assert_eq!(state.activity_count(), 0);
        assert!(state.delete_entry("A1", LEVEL_ACTIVITY).is_err());

        state.delete_entry("M1", LEVEL_MILESTONE).unwrap();
        assert_eq!(state.milestone_count(), 0);

        state.delete_entry("P1", LEVEL_PHASE).unwrap();
        assert_eq!(state.phase_count(), 0);
    }

    #[test]
    fn ordered_view_does_not_mutate_state() {
        let mut state = ScheduleState::new();
        state.add_phase("P2", Some(2)).unwrap();
        state.add_phase("P1", Some(1)).unwrap();

        let ordered = state.get_phases_ordered();
        assert_eq!(ordered[0].id, "P1");

        // reconstruction order is preserved underneath
        assert_eq!(state.phases[0].id, "P2");
    }

    #[test]
    fn to_records_round_trips_local_edits() {
        let mut state = loaded_state();
        state
            .add_milestone("P1", "M2", "2025-04-01", "2025-06-01", Some(2))
            .unwrap();

        let records = state.to_records();
        assert_eq!(records.len(), 4);
        assert!(records
            .iter()
            .any(|r| r.schedule_code == "M2" && r.parent_code.as_deref() == Some("P1")));

        let mut reloaded = ScheduleState::new();
        reloaded.load_records(&records);
        assert_eq!(reloaded.milestone_count(), 2);
        assert_eq!(reloaded.activity_count(), 1);
    }

    #[test]
    fn catalog_names_apply_to_new_entries() {
        let mut state = ScheduleState::new();
        state.load_catalogs(&ReferenceCatalogs {
            phases: vec![crate::types::CatalogEntry {
                code: "P1".to_string(),
                full_name: "Initiation".to_string(),
                short_name: String::new(),
            }],
            milestones: Vec::new(),
            activities: Vec::new(),
        });

        state.add_phase("P1", None).unwrap();
        assert_eq!(state.phases[0].name, "Initiation");
    }
}
