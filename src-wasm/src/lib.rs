//! Mission PMS - WASM Schedule Engine
//!
//! This crate provides a WebAssembly-compatible schedule hierarchy engine
//! for the PMS web frontend. It exposes a `ScheduleEngine` class to
//! JavaScript that can be used directly or via a Web Worker.
//!
//! ## Usage from JavaScript
//!
//! ```javascript
//! import init, { ScheduleEngine } from 'pms_schedule_wasm';
//!
//! await init();
//! const engine = new ScheduleEngine();
//! engine.initialize(projectCode, records, catalogs);
//! const tree = engine.get_tree();
//! ```

mod utils;
mod types;
mod hierarchy;
mod date_utils;
mod validate;

use wasm_bindgen::prelude::*;

use crate::hierarchy::{
    find_milestone_pos, flatten, lookup_or_default, reconstruct, sort_for_display, LEVEL_ACTIVITY,
    LEVEL_MILESTONE, LEVEL_PHASE,
};
use crate::types::{Activity, Milestone, NameMaps, Phase, ReferenceCatalogs, ScheduleRecord};
use crate::validate::{validate_new_activity, validate_new_milestone, validate_new_phase};

// Import console.log for debugging
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn warn(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn error(s: &str);
}

/// Log macro for console output
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::log(&format_args!($($t)*).to_string()))
}

/// The schedule engine exposed to JavaScript
///
/// Holds one project's reconstructed phase tree and the catalog name maps,
/// and provides the reconstruction, validation, and edit methods the
/// schedule views call. Edits mutate the tree here first; the frontend
/// persists each record against the backend on its own.
#[wasm_bindgen]
pub struct ScheduleEngine {
    project_code: String,
    phases: Vec<Phase>,
    names: NameMaps,
    initialized: bool,
}

#[wasm_bindgen]
impl ScheduleEngine {
    /// Create a new ScheduleEngine instance
    #[wasm_bindgen(constructor)]
    pub fn new() -> ScheduleEngine {
        utils::set_panic_hook();
        log("[WASM] ScheduleEngine created");
        ScheduleEngine {
            project_code: String::new(),
            phases: Vec::new(),
            names: NameMaps::default(),
            initialized: false,
        }
    }

    /// Initialize the engine with a project's records and catalogs
    ///
    /// # Arguments
    /// * `project_code` - Owning project code
    /// * `records_val` - JavaScript array of flat schedule records
    /// * `catalogs_val` - JavaScript object with phase/milestone/activity catalogs
    pub fn initialize(
        &mut self,
        project_code: String,
        records_val: JsValue,
        catalogs_val: JsValue,
    ) -> Result<(), JsValue> {
        let records: Vec<ScheduleRecord> = serde_wasm_bindgen::from_value(records_val)
            .map_err(|e| JsValue::from_str(&format!("Failed to deserialize records: {}", e)))?;

        let catalogs: ReferenceCatalogs = serde_wasm_bindgen::from_value(catalogs_val)
            .map_err(|e| JsValue::from_str(&format!("Failed to deserialize catalogs: {}", e)))?;

        self.project_code = project_code;
        self.names = NameMaps::from_catalogs(&catalogs);
        self.phases = reconstruct(&records, &self.names).phases;
        self.initialized = true;

        log(&format!(
            "[WASM] Engine initialized: {} records, {} phases",
            records.len(),
            self.phases.len()
        ));
        Ok(())
    }

    /// Replace the records and rebuild the tree (bulk refresh)
    ///
    /// # Returns
    /// A JavaScript object containing:
    /// - `phases`: the rebuilt tree in first-seen phase order
    /// - `stats`: rebuild statistics
    pub fn sync_records(&mut self, records_val: JsValue) -> Result<JsValue, JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        let records: Vec<ScheduleRecord> = serde_wasm_bindgen::from_value(records_val)
            .map_err(|e| JsValue::from_str(&format!("Failed to deserialize records: {}", e)))?;

        let start_time = js_sys::Date::now();
        let mut result = reconstruct(&records, &self.names);
        result.stats.calc_time = js_sys::Date::now() - start_time;

        self.phases = result.phases.clone();

        log(&format!(
            "[WASM] Rebuild complete: {} phases, {} milestones, {} placeholders, {:.2}ms",
            result.stats.phase_count,
            result.stats.milestone_count,
            result.stats.placeholder_count,
            result.stats.calc_time
        ));

        serde_wasm_bindgen::to_value(&result)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
    }

    /// Get the tree ordered for presentation (sortOrder at every level)
    pub fn get_tree(&self) -> Result<JsValue, JsValue> {
        let mut phases = self.phases.clone();
        sort_for_display(&mut phases);

        serde_wasm_bindgen::to_value(&phases)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize tree: {}", e)))
    }

    /// Flatten the current tree into backend record shape for persistence
    pub fn get_records(&self) -> Result<JsValue, JsValue> {
        let records = flatten(&self.phases, &self.project_code);

        serde_wasm_bindgen::to_value(&records)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize records: {}", e)))
    }

    /// Add a phase to the schedule
    pub fn add_phase(&mut self, phase_code: String, sort_order: Option<i32>) -> Result<(), JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        let errors = validate_new_phase(&self.phases, &phase_code);
        if !errors.is_empty() {
            return Err(JsValue::from_str(&errors.join("; ")));
        }

        self.phases.push(Phase {
            id: phase_code.clone(),
            name: lookup_or_default(&self.names.phases, &phase_code),
            sort_order: sort_order.unwrap_or(1),
            milestones: Vec::new(),
        });
        Ok(())
    }

    /// Add a milestone to a phase, gated by the business-rule validators
    pub fn add_milestone(
        &mut self,
        phase_id: String,
        milestone_code: String,
        start_date: String,
        end_date: String,
        sort_order: Option<i32>,
    ) -> Result<(), JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        let phase_index = self
            .phases
            .iter()
            .position(|p| p.id == phase_id)
            .ok_or_else(|| JsValue::from_str(&format!("Phase not found: {}", phase_id)))?;

        let errors = validate_new_milestone(
            &self.phases[phase_index],
            &milestone_code,
            &start_date,
            &end_date,
        );
        if !errors.is_empty() {
            return Err(JsValue::from_str(&errors.join("; ")));
        }

        let months = date_utils::month_span(&start_date, &end_date);
        let title = lookup_or_default(&self.names.milestones, &milestone_code);
        self.phases[phase_index].milestones.push(Milestone {
            id: milestone_code.clone(),
            code: milestone_code,
            title,
            start_date,
            end_date,
            months,
            sort_order: sort_order.unwrap_or(1),
            activities: Vec::new(),
        });
        Ok(())
    }

    /// Add an activity to a milestone
    pub fn add_activity(
        &mut self,
        milestone_code: String,
        activity_code: String,
        start_date: String,
        end_date: String,
        sort_order: Option<i32>,
    ) -> Result<(), JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        let (pi, mi) = find_milestone_pos(&self.phases, &milestone_code)
            .ok_or_else(|| JsValue::from_str(&format!("Milestone not found: {}", milestone_code)))?;

        let errors = validate_new_activity(
            &self.phases[pi].milestones[mi],
            &activity_code,
            &start_date,
            &end_date,
        );
        if !errors.is_empty() {
            return Err(JsValue::from_str(&errors.join("; ")));
        }

        let title = lookup_or_default(&self.names.activities, &activity_code);
        self.phases[pi].milestones[mi].activities.push(Activity {
            id: activity_code,
            title,
            start_date,
            end_date,
            sort_order: sort_order.unwrap_or(1),
        });
        Ok(())
    }

    /// Run the milestone validators without mutating anything
    ///
    /// # Returns
    /// A JavaScript array of error messages; empty means the milestone
    /// may be added.
    pub fn validate_milestone(
        &self,
        phase_id: String,
        milestone_code: String,
        start_date: String,
        end_date: String,
    ) -> Result<JsValue, JsValue> {
        let phase = self
            .phases
            .iter()
            .find(|p| p.id == phase_id)
            .ok_or_else(|| JsValue::from_str(&format!("Phase not found: {}", phase_id)))?;

        let errors = validate_new_milestone(phase, &milestone_code, &start_date, &end_date);

        serde_wasm_bindgen::to_value(&errors)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize errors: {}", e)))
    }

    /// Update an existing entry
    ///
    /// # Arguments
    /// * `id` - Code of the entry to update
    /// * `level` - 1 = phase, 2 = milestone, 3 = activity
    /// * `updates_val` - JavaScript object with fields to update
    pub fn update_entry(
        &mut self,
        id: String,
        level: i32,
        updates_val: JsValue,
    ) -> Result<(), JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        // Parse updates as JSON value to handle partial updates
        let updates: serde_json::Value = serde_wasm_bindgen::from_value(updates_val)
            .map_err(|e| JsValue::from_str(&format!("Failed to deserialize updates: {}", e)))?;

        match level {
            LEVEL_PHASE => {
                let phase = self
                    .phases
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| JsValue::from_str(&format!("Phase not found: {}", id)))?;

                if let Some(name) = updates.get("name").and_then(|v| v.as_str()) {
                    phase.name = name.to_string();
                }
                if let Some(sort_order) = updates.get("sortOrder").and_then(|v| v.as_i64()) {
                    phase.sort_order = sort_order as i32;
                }
            }
            LEVEL_MILESTONE => {
                let (pi, mi) = find_milestone_pos(&self.phases, &id)
                    .ok_or_else(|| JsValue::from_str(&format!("Milestone not found: {}", id)))?;
                let milestone = &mut self.phases[pi].milestones[mi];

                if let Some(title) = updates.get("title").and_then(|v| v.as_str()) {
                    milestone.title = title.to_string();
                }
                if let Some(start) = updates.get("startDate").and_then(|v| v.as_str()) {
                    milestone.start_date = start.to_string();
                }
                if let Some(end) = updates.get("endDate").and_then(|v| v.as_str()) {
                    milestone.end_date = end.to_string();
                }
                if let Some(sort_order) = updates.get("sortOrder").and_then(|v| v.as_i64()) {
                    milestone.sort_order = sort_order as i32;
                }

                // months is derived, never taken from the caller
                milestone.months =
                    date_utils::month_span(&milestone.start_date, &milestone.end_date);
            }
            LEVEL_ACTIVITY => {
                let activity = self
                    .phases
                    .iter_mut()
                    .flat_map(|p| p.milestones.iter_mut())
                    .flat_map(|m| m.activities.iter_mut())
                    .find(|a| a.id == id)
                    .ok_or_else(|| JsValue::from_str(&format!("Activity not found: {}", id)))?;

                if let Some(title) = updates.get("title").and_then(|v| v.as_str()) {
                    activity.title = title.to_string();
                }
                if let Some(start) = updates.get("startDate").and_then(|v| v.as_str()) {
                    activity.start_date = start.to_string();
                }
                if let Some(end) = updates.get("endDate").and_then(|v| v.as_str()) {
                    activity.end_date = end.to_string();
                }
                if let Some(sort_order) = updates.get("sortOrder").and_then(|v| v.as_i64()) {
                    activity.sort_order = sort_order as i32;
                }
            }
            _ => return Err(JsValue::from_str(&format!("Unknown level: {}", level))),
        }

        Ok(())
    }

    /// Delete an entry by code and level
    pub fn delete_entry(&mut self, id: String, level: i32) -> Result<(), JsValue> {
        if !self.initialized {
            return Err(JsValue::from_str("Engine not initialized"));
        }

        match level {
            LEVEL_PHASE => {
                let original_len = self.phases.len();
                self.phases.retain(|p| p.id != id);
                if self.phases.len() == original_len {
                    return Err(JsValue::from_str(&format!("Phase not found: {}", id)));
                }
            }
            LEVEL_MILESTONE => {
                let (pi, mi) = find_milestone_pos(&self.phases, &id)
                    .ok_or_else(|| JsValue::from_str(&format!("Milestone not found: {}", id)))?;
                self.phases[pi].milestones.remove(mi);
            }
            LEVEL_ACTIVITY => {
                let mut removed = false;
                for phase in self.phases.iter_mut() {
                    for milestone in phase.milestones.iter_mut() {
                        let original_len = milestone.activities.len();
                        milestone.activities.retain(|a| a.id != id);
                        if milestone.activities.len() != original_len {
                            removed = true;
                        }
                    }
                }
                if !removed {
                    return Err(JsValue::from_str(&format!("Activity not found: {}", id)));
                }
            }
            _ => return Err(JsValue::from_str(&format!("Unknown level: {}", level))),
        }

        Ok(())
    }

    /// Whole-month span between two dates, for live duration display
    pub fn month_span(&self, start_date: Option<String>, end_date: Option<String>) -> i32 {
        date_utils::month_span(
            start_date.as_deref().unwrap_or(""),
            end_date.as_deref().unwrap_or(""),
        )
    }

    /// Get current phase count
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Check if engine is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Dispose and free resources
    pub fn dispose(&mut self) {
        self.project_code.clear();
        self.phases.clear();
        self.names = NameMaps::default();
        self.initialized = false;
        log("[WASM] Engine disposed");
    }
}

impl Default for ScheduleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Module initialization - called when WASM module is loaded
#[wasm_bindgen(start)]
pub fn main() {
    utils::set_panic_hook();
    log("[WASM] PMS schedule WASM module loaded");
}
