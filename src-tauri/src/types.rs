//! Type definitions for the Mission PMS schedule engine
//!
//! These types mirror the TypeScript interfaces in src/types/index.ts
//! IMPORTANT: Field names use camelCase via serde rename to match JS

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat schedule record as served by the backend schedule resource.
///
/// One row per phase, milestone, or activity; `level` tells which, and
/// `parent_code` points at the enclosing milestone (level 3) or phase
/// (level 2). Records arrive in no guaranteed order.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    /// Owning project code
    #[serde(rename = "missionProjectCode", default)]
    pub project_code: String,

    #[serde(rename = "scheduleCode")]
    pub schedule_code: String,

    /// 1 = phase, 2 = milestone, 3 = activity
    pub level: i32,

    /// Enclosing entity code; absent for level-1 records
    #[serde(rename = "parentCode", default)]
    pub parent_code: Option<String>,

    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,

    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,

    /// Server-supplied sibling sort key, distinct from arrival order.
    /// Missing maps to 1 when the tree is rebuilt.
    #[serde(rename = "hierarchyOrder", default)]
    pub hierarchy_order: Option<i32>,
}

/// Top-level grouping in the reconstructed schedule tree
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,

    #[serde(rename = "sortOrder")]
    pub sort_order: i32,

    /// Insertion order as encountered during reconstruction;
    /// sorting by sortOrder happens at presentation time
    pub milestones: Vec<Milestone>,
}

/// Mid-level grouping, child of exactly one Phase
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,

    /// Same value as `id`; kept as a separate field for clarity in the
    /// wire shape consumed by the frontend
    pub code: String,

    pub title: String,

    #[serde(rename = "startDate", default)]
    pub start_date: String,

    #[serde(rename = "endDate", default)]
    pub end_date: String,

    /// Calendar-month duration, always recomputed from the current dates
    pub months: i32,

    #[serde(rename = "sortOrder")]
    pub sort_order: i32,

    pub activities: Vec<Activity>,
}

/// Leaf-level unit of work, child of exactly one Milestone
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,

    #[serde(rename = "startDate", default)]
    pub start_date: String,

    #[serde(rename = "endDate", default)]
    pub end_date: String,

    #[serde(rename = "sortOrder")]
    pub sort_order: i32,
}

/// Reference-data row from the phase/milestone/activity catalog resources
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub code: String,

    #[serde(rename = "fullName", default)]
    pub full_name: String,

    #[serde(rename = "shortName", default)]
    pub short_name: String,
}

/// The three catalog payloads, as fetched by the frontend in one shot
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCatalogs {
    #[serde(default)]
    pub phases: Vec<CatalogEntry>,

    #[serde(default)]
    pub milestones: Vec<CatalogEntry>,

    #[serde(default)]
    pub activities: Vec<CatalogEntry>,
}

/// Code-to-display-name lookup maps built from the reference catalogs
#[derive(Clone, Debug, Default)]
pub struct NameMaps {
    pub phases: HashMap<String, String>,
    pub milestones: HashMap<String, String>,
    pub activities: HashMap<String, String>,
}

impl NameMaps {
    /// Build the lookup maps from catalog rows.
    /// Rows with an empty fullName fall back to shortName; rows with
    /// neither are skipped so lookups fall through to the code itself.
    pub fn from_catalogs(catalogs: &ReferenceCatalogs) -> Self {
        Self {
            phases: build_name_map(&catalogs.phases),
            milestones: build_name_map(&catalogs.milestones),
            activities: build_name_map(&catalogs.activities),
        }
    }
}

fn build_name_map(entries: &[CatalogEntry]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for entry in entries {
        let name = if !entry.full_name.is_empty() {
            entry.full_name.clone()
        } else if !entry.short_name.is_empty() {
            entry.short_name.clone()
        } else {
            continue;
        };
        map.insert(entry.code.clone(), name);
    }
    map
}

/// Rebuild statistics
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RebuildStats {
    pub calc_time: f64,
    pub record_count: i32,
    pub phase_count: i32,
    pub milestone_count: i32,
    pub activity_count: i32,
    /// Ancestors synthesized for orphaned records
    pub placeholder_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rebuild result handed back to the frontend
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RebuildResult {
    pub phases: Vec<Phase>,
    pub stats: RebuildStats,
}
