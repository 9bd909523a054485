//! Tauri Commands for the Schedule Engine
//!
//! These commands are invoked from TypeScript via `invoke()`. The engine
//! mutates first; the frontend then persists the matching record against
//! the backend resource and reports failures to the user itself.

use crate::date_utils::month_span;
use crate::engine_state::AppState;
use crate::types::{RebuildResult, ReferenceCatalogs, ScheduleRecord};
use crate::validate::validate_new_milestone;
use tauri::State;

/// Initialize the engine with a project's flat records and catalogs
///
/// Called from ScheduleEngine.initialize()
#[tauri::command]
pub fn initialize_engine(
    project_code: String,
    records_json: String,
    catalogs_json: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    // Parse flat schedule records
    let records: Vec<ScheduleRecord> = serde_json::from_str(&records_json)
        .map_err(|e| format!("Failed to parse records: {}", e))?;

    // Parse reference catalogs
    let catalogs: ReferenceCatalogs = serde_json::from_str(&catalogs_json)
        .map_err(|e| format!("Failed to parse catalogs: {}", e))?;

    // Lock state and rebuild
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    schedule.project_code = project_code;
    schedule.load_catalogs(&catalogs);
    let result = schedule.load_records(&records);
    schedule.initialized = true;

    println!(
        "[PMS Engine] Initialized {} with {} records ({} phases)",
        schedule.project_code,
        result.stats.record_count,
        result.stats.phase_count
    );

    Ok(format!(
        "Initialized with {} records",
        result.stats.record_count
    ))
}

/// Replace the flat records and rebuild the tree (bulk refresh)
///
/// Called from ScheduleEngine.syncRecords() after a re-fetch; returns the
/// rebuild result so the UI can swap in the fresh tree and stats.
#[tauri::command]
pub fn sync_schedule_records(
    records_json: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let records: Vec<ScheduleRecord> = serde_json::from_str(&records_json)
        .map_err(|e| format!("Failed to parse records: {}", e))?;

    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    let result: RebuildResult = schedule.load_records(&records);

    println!(
        "[PMS Engine] Synced {} records in {:.2}ms ({} placeholders)",
        result.stats.record_count, result.stats.calc_time, result.stats.placeholder_count
    );

    serde_json::to_string(&result).map_err(|e| format!("Failed to serialize result: {}", e))
}

/// Get the tree ordered for presentation
#[tauri::command]
pub fn get_schedule_tree(state: State<'_, AppState>) -> Result<String, String> {
    let schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    serde_json::to_string(&schedule.get_phases_ordered())
        .map_err(|e| format!("Failed to serialize tree: {}", e))
}

/// Flatten the current tree into backend record shape for persistence
#[tauri::command]
pub fn get_schedule_records(state: State<'_, AppState>) -> Result<String, String> {
    let schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    serde_json::to_string(&schedule.to_records())
        .map_err(|e| format!("Failed to serialize records: {}", e))
}

/// Add a phase to the schedule
#[tauri::command]
pub fn add_schedule_phase(
    phase_code: String,
    sort_order: Option<i32>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    schedule.add_phase(&phase_code, sort_order)?;

    println!("[PMS Engine] Added phase {}", phase_code);
    Ok("Added".to_string())
}

/// Add a milestone to a phase
///
/// Runs the business-rule validators; a validation failure comes back as
/// the accumulated messages joined with "; " and leaves state untouched.
#[tauri::command]
pub fn add_schedule_milestone(
    phase_id: String,
    milestone_code: String,
    start_date: String,
    end_date: String,
    sort_order: Option<i32>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    schedule.add_milestone(&phase_id, &milestone_code, &start_date, &end_date, sort_order)?;

    println!(
        "[PMS Engine] Added milestone {} to phase {}",
        milestone_code, phase_id
    );
    Ok("Added".to_string())
}

/// Add an activity to a milestone
#[tauri::command]
pub fn add_schedule_activity(
    milestone_code: String,
    activity_code: String,
    start_date: String,
    end_date: String,
    sort_order: Option<i32>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    schedule.add_activity(
        &milestone_code,
        &activity_code,
        &start_date,
        &end_date,
        sort_order,
    )?;

    println!(
        "[PMS Engine] Added activity {} to milestone {}",
        activity_code, milestone_code
    );
    Ok("Added".to_string())
}

/// Run the milestone validators without mutating anything
///
/// Returns the accumulated error messages as a JSON array; an empty array
/// means the milestone may be added.
#[tauri::command]
pub fn validate_schedule_milestone(
    phase_id: String,
    milestone_code: String,
    start_date: String,
    end_date: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    let phase = schedule
        .phases
        .iter()
        .find(|p| p.id == phase_id)
        .ok_or_else(|| format!("Phase {} not found", phase_id))?;

    let errors = validate_new_milestone(phase, &milestone_code, &start_date, &end_date);

    serde_json::to_string(&errors).map_err(|e| format!("Failed to serialize errors: {}", e))
}

/// Update a single entry in the engine state
///
/// Called from ScheduleEngine.updateEntry()
/// Assumes the entry already exists
#[tauri::command]
pub fn update_schedule_entry(
    id: String,
    level: i32,
    updates_json: String,
    state: State<'_, AppState>,
) -> Result<String, String> {
    // Parse updates as generic JSON value
    let updates: serde_json::Value = serde_json::from_str(&updates_json)
        .map_err(|e| format!("Failed to parse updates: {}", e))?;

    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    schedule.update_entry(&id, level, updates)?;

    Ok("Updated".to_string())
}

/// Delete an entry from the engine state
#[tauri::command]
pub fn delete_schedule_entry(
    id: String,
    level: i32,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    if !schedule.initialized {
        return Err("Engine not initialized".to_string());
    }

    schedule.delete_entry(&id, level)?;

    println!("[PMS Engine] Deleted entry {} (level {})", id, level);
    Ok("Deleted".to_string())
}

/// Whole-month span between two dates, for live duration display
#[tauri::command]
pub fn get_month_span(start_date: Option<String>, end_date: Option<String>) -> i32 {
    month_span(
        start_date.as_deref().unwrap_or(""),
        end_date.as_deref().unwrap_or(""),
    )
}

/// Get engine status (for debugging)
#[tauri::command]
pub fn get_engine_status(state: State<'_, AppState>) -> Result<String, String> {
    let schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    Ok(format!(
        "{{ \"initialized\": {}, \"projectCode\": \"{}\", \"phaseCount\": {}, \"milestoneCount\": {}, \"activityCount\": {} }}",
        schedule.initialized,
        schedule.project_code,
        schedule.phase_count(),
        schedule.milestone_count(),
        schedule.activity_count()
    ))
}

/// Clear engine state
#[tauri::command]
pub fn clear_engine(state: State<'_, AppState>) -> Result<String, String> {
    let mut schedule = state
        .schedule
        .lock()
        .map_err(|e| format!("Failed to lock state: {}", e))?;

    schedule.clear();

    Ok("Cleared".to_string())
}
