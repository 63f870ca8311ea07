use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::{LogLevel, Operation};

/// One audited request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Option<i64>,
    pub timestamp: NaiveDateTime,
    pub level: LogLevel,
    pub method: String,
    pub message: String,
    pub action: Operation,
    pub execution_time_ms: i64,
    pub user_name: String,
    pub ip_address: String,
    pub parameters: Option<String>,
    pub result: Option<String>,
    pub stack_trace: Option<String>,
}
