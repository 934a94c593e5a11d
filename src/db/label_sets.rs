// label_sets table: append-only versions of the label configuration

use std::path::{Path, PathBuf};
use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::constants::{MAPPING_NAME, UPDATED_BY_TAG};
use crate::error::{LabelError, Result};
use crate::labels::ElementRecord;
use super::open_existing_db;

/// One entry of `items_json`, in the shape the backend reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelItem {
    pub element_id: i64,
    pub name: String,
    pub category: String,
    pub color: String,
    pub description: String,
    pub enabled: bool,
}

impl From<&ElementRecord> for LabelItem {
    fn from(record: &ElementRecord) -> Self {
        LabelItem {
            element_id: record.id,
            name: record.element_label.clone(),
            category: record.set_label.clone(),
            color: record.resolved_color().to_string(),
            description: record.element_label.replace('_', " "),
            enabled: true,
        }
    }
}

pub fn build_items(records: &[ElementRecord]) -> Vec<LabelItem> {
    records.iter().map(LabelItem::from).collect()
}

/// Pretty-printed JSON array stored in `items_json`.
pub fn build_items_json(records: &[ElementRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&build_items(records))?)
}

/// Result of a committed update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbUpdate {
    pub project: String,
    pub version: i64,
    pub items: usize,
}

/// What an update would write, without opening the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPreview {
    pub project: String,
    pub db_path: PathBuf,
    pub items: usize,
    pub sample_item: Option<String>,
}

pub fn preview_update(records: &[ElementRecord], db_path: &Path, project: &str) -> Result<DbPreview> {
    let sample_item = records
        .first()
        .map(|r| serde_json::to_string_pretty(&LabelItem::from(r)))
        .transpose()?;

    Ok(DbPreview {
        project: project.to_string(),
        db_path: db_path.to_path_buf(),
        items: records.len(),
        sample_item,
    })
}

/// Append a new version row for `project` holding every record.
pub fn update_database(records: &[ElementRecord], db_path: &Path, project: &str) -> Result<DbUpdate> {
    let items_json = build_items_json(records)?;
    let mut conn = open_existing_db(db_path)?;

    let version = insert_next_version(&mut conn, project, &items_json)?;
    log::info!("Inserted label_sets version {} for project '{}'", version, project);

    Ok(DbUpdate {
        project: project.to_string(),
        version,
        items: records.len(),
    })
}

/// Read the current max version and insert max + 1 in one exclusive transaction.
/// Any failure rolls the transaction back and surfaces as `Persistence`.
pub fn insert_next_version(conn: &mut Connection, project: &str, items_json: &str) -> Result<i64> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Exclusive)
        .map_err(LabelError::Persistence)?;

    match insert_version(&tx, project, items_json) {
        Ok(version) => {
            tx.commit().map_err(LabelError::Persistence)?;
            Ok(version)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                log::error!("label_sets rollback failed: {}", rollback_err);
            }
            Err(LabelError::Persistence(e))
        }
    }
}

fn insert_version(conn: &Connection, project: &str, items_json: &str) -> rusqlite::Result<i64> {
    let next_version = current_version(conn, project)? + 1;

    conn.execute(
        "INSERT INTO label_sets (project, version, items_json, updated_by, mapping_name)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project, next_version, items_json, UPDATED_BY_TAG, MAPPING_NAME],
    )?;

    Ok(next_version)
}

/// Highest stored version for the project, 0 when it has none.
pub fn current_version(conn: &Connection, project: &str) -> rusqlite::Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(version) FROM label_sets WHERE project = ?1",
        params![project],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0))
}

#[derive(Debug, Clone)]
pub struct LabelSetVersion {
    pub version: i64,
    pub item_count: Option<usize>,
    pub updated_by: Option<String>,
    pub mapping_name: Option<String>,
}

/// Stored versions of a project, newest first.
pub fn list_versions(conn: &Connection, project: &str, limit: i64) -> Result<Vec<LabelSetVersion>> {
    let mut stmt = conn.prepare(
        "SELECT version, items_json, updated_by, mapping_name
         FROM label_sets WHERE project = ?1
         ORDER BY version DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![project, limit], |row| {
        let items_json: Option<String> = row.get(1)?;
        Ok(LabelSetVersion {
            version: row.get(0)?,
            item_count: items_json
                .and_then(|json| serde_json::from_str::<Vec<serde_json::Value>>(&json).ok())
                .map(|items| items.len()),
            updated_by: row.get(2)?,
            mapping_name: row.get(3)?,
        })
    })?;

    let versions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}
