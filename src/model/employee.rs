use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "42",
        "name": "Somchai",
        "department": "Warehouse",
        "position": "Driver",
        "last_synced_at": "2026-01-01T09:00:00Z"
    })
)]
pub struct EmployeeIdentity {
    /// Terminal-side user identifier
    #[schema(example = "42")]
    pub id: String,

    #[schema(example = "Somchai")]
    pub name: String,

    #[schema(example = "Warehouse", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Driver", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub last_synced_at: DateTime<Utc>,
}

/// Incoming identity fields, from a terminal or an operator edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    #[schema(example = "42")]
    pub id: String,
    #[schema(example = "Somchai", nullable = true)]
    pub name: Option<String>,
    #[schema(example = "Warehouse", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Driver", nullable = true)]
    pub position: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl EmployeeIdentity {
    /// Field-wise merge: non-empty incoming fields overwrite, everything else is kept.
    pub fn merge(existing: Option<EmployeeIdentity>, incoming: &EmployeeUpdate, now: DateTime<Utc>) -> Self {
        let mut merged = existing.unwrap_or_else(|| EmployeeIdentity {
            id: incoming.id.trim().to_string(),
            name: String::new(),
            department: None,
            position: None,
            last_synced_at: now,
        });

        if let Some(name) = non_empty(&incoming.name) {
            merged.name = name;
        }
        if let Some(department) = non_empty(&incoming.department) {
            merged.department = Some(department);
        }
        if let Some(position) = non_empty(&incoming.position) {
            merged.position = Some(position);
        }
        merged.last_synced_at = now;
        merged
    }
}
