//! Division records as served by the API, and the enriched rows shown in the table.
//!
use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type DivisionId = u64;

/// A division exactly as the API returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<DivisionId>,
    #[serde(default)]
    pub ambassador_full_name: Option<String>,
    pub level: u32,
    pub collaborators_count: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A division plus the fields derived from the rest of the loaded list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionRow {
    #[serde(flatten)]
    pub division: Division,
    pub parent_name: Option<String>,
    pub subdivision_count: usize,
}

impl DivisionRow {
    pub fn id(&self) -> DivisionId {
        self.division.id
    }

    pub fn name(&self) -> &str {
        &self.division.name
    }

    /// Parent name, or `""` for root divisions and unresolved parents.
    pub fn parent_name_or_empty(&self) -> &str {
        self.parent_name.as_deref().unwrap_or("")
    }
}

/// Partial division sent on create and update.
///
/// `None` leaves a field out of the request body; `Some(None)` on the nullable
/// fields sends an explicit `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<DivisionId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambassador_full_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborators_count: Option<u64>,
}

impl DivisionPayload {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Payload for a new division placed under `parent` (or at the root).
    pub fn child_of(name: impl Into<String>, parent: Option<&DivisionRow>) -> Self {
        Self {
            name: Some(name.into()),
            parent_id: Some(parent.map(DivisionRow::id)),
            level: Some(parent.map_or(1, |p| p.division.level + 1)),
            ..Self::default()
        }
    }
}

/// Resolve parent names and count direct children for every division.
///
/// Order is preserved. A `parent_id` that does not resolve yields no parent name.
pub fn enrich(divisions: Vec<Division>) -> Vec<DivisionRow> {
    if divisions.is_empty() {
        return Vec::new();
    }
    let names: HashMap<DivisionId, String> = divisions
        .iter()
        .map(|d| (d.id, d.name.clone()))
        .collect();
    let mut children: HashMap<DivisionId, usize> = HashMap::new();
    for parent in divisions.iter().filter_map(|d| d.parent_id) {
        *children.entry(parent).or_default() += 1;
    }
    divisions
        .into_iter()
        .map(|division| {
            let parent_name = division.parent_id.and_then(|p| names.get(&p).cloned());
            let subdivision_count = children.get(&division.id).copied().unwrap_or(0);
            DivisionRow {
                division,
                parent_name,
                subdivision_count,
            }
        })
        .collect()
}

/// Parent ids referenced by some row but missing from the list, deduplicated in first-seen order.
pub fn dangling_parents(rows: &[DivisionRow]) -> Vec<DivisionId> {
    let mut out = Vec::new();
    for row in rows {
        if let Some(pid) = row.division.parent_id {
            if row.parent_name.is_none() && !out.contains(&pid) {
                out.push(pid);
            }
        }
    }
    out
}

pub fn total_collaborators(rows: &[DivisionRow]) -> u64 {
    rows.iter().map(|r| r.division.collaborators_count).sum()
}

/// Accept RFC 3339 timestamps and offset-less ISO-8601 ones (taken as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
