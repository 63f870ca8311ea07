use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::sort::{Field, FieldSchema};

/// Audit timestamps embedded in devices and borrowings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateAudit {
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub hand_over_date: Option<NaiveDateTime>,
    pub eviction_date: Option<NaiveDateTime>,
}

pub static DATE_AUDIT_SCHEMA: FieldSchema = FieldSchema {
    name: "DateAudit",
    fields: &[
        Field::column("createdAt", "created_at"),
        Field::column("updatedAt", "updated_at"),
        Field::column("handOverDate", "hand_over_date"),
        Field::column("evictionDate", "eviction_date"),
    ],
};

/// Current time at the precision the database keeps
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

impl DateAudit {
    pub fn new() -> Self {
        let now = now();
        Self {
            created_at: now,
            updated_at: now,
            hand_over_date: None,
            eviction_date: None,
        }
    }

    pub fn update_hand_over_date(&mut self) {
        self.hand_over_date = Some(now());
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

impl Default for DateAudit {
    fn default() -> Self {
        Self::new()
    }
}
