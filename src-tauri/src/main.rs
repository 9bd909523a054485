// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod types;
mod engine_state;
mod commands;
mod date_utils;
mod hierarchy;
mod validate;

use tauri::Manager;
use engine_state::AppState;
use commands::{
    initialize_engine,
    sync_schedule_records,
    get_schedule_tree,
    get_schedule_records,
    add_schedule_phase,
    add_schedule_milestone,
    add_schedule_activity,
    validate_schedule_milestone,
    update_schedule_entry,
    delete_schedule_entry,
    get_month_span,
    get_engine_status,
    clear_engine,
};

fn main() {
    tauri::Builder::default()
        .manage(AppState::new())
        .setup(|app| {
            // Automatically open DevTools in debug mode
            #[cfg(debug_assertions)]
            {
                if let Some(window) = app.get_window("main") {
                    window.open_devtools();
                }
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            initialize_engine,
            sync_schedule_records,
            get_schedule_tree,
            get_schedule_records,
            add_schedule_phase,
            add_schedule_milestone,
            add_schedule_activity,
            validate_schedule_milestone,
            update_schedule_entry,
            delete_schedule_entry,
            get_month_span,
            get_engine_status,
            clear_engine,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
