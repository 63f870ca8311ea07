use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::date_audit::{DateAudit, DATE_AUDIT_SCHEMA};
use crate::types::{DeviceType, RateType};
use crate::validation::sort::{Field, FieldSchema, SortFields, Sortable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i32,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub unit_price: f64,
    pub rate_type: RateType,
    pub date_audit: DateAudit,
    pub branch_name: String,
    pub item_name: String,
    pub version: Option<String>,
    pub original_price: f64,
}

impl Device {
    /// Price this device contributes to a borrowing
    pub fn calculate_total_price(&self) -> f64 {
        self.original_price * self.rate_type.value()
    }
}

/// Column values for inserting or replacing a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDraft {
    pub device_type: DeviceType,
    pub unit_price: f64,
    pub rate_type: RateType,
    pub branch_name: String,
    pub item_name: String,
    pub version: Option<String>,
    pub original_price: f64,
}

pub static DEVICE_SCHEMA: FieldSchema = FieldSchema {
    name: "Device",
    fields: &[
        Field::column("id", "id"),
        Field::column("type", "device_type"),
        Field::column("unitPrice", "unit_price"),
        Field::column("rateType", "rate_type"),
        Field::embedded("dateAudit", &DATE_AUDIT_SCHEMA),
        Field::column("branchName", "branch_name"),
        Field::column("itemName", "item_name"),
        Field::column("version", "version"),
        Field::column("originalPrice", "original_price"),
    ],
};

static DEVICE_SORT_FIELDS: Lazy<SortFields> = Lazy::new(|| SortFields::build(&DEVICE_SCHEMA, Device::TABLE_ALIAS));

impl Sortable for Device {
    const TABLE_ALIAS: &'static str = "d";

    fn schema() -> &'static FieldSchema {
        &DEVICE_SCHEMA
    }

    fn sort_fields() -> &'static SortFields {
        &DEVICE_SORT_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(rate_type: RateType, original_price: f64) -> Device {
        Device {
            id: 1,
            device_type: DeviceType::Mouse,
            unit_price: 110.0,
            rate_type,
            date_audit: DateAudit::new(),
            branch_name: "Branch 1".to_string(),
            item_name: "Item 1".to_string(),
            version: Some("1.0".to_string()),
            original_price,
        }
    }

    #[test]
    fn total_price_scales_original_price_by_rate() {
        assert_eq!(device(RateType::New, 150.0).calculate_total_price(), 150.0);
        assert_eq!(device(RateType::Used, 150.0).calculate_total_price(), 75.0);
    }

    #[test]
    fn sort_fields_cover_embedded_audit_dates() {
        let fields = Device::sort_fields();
        assert_eq!(fields.column("dateAudit.createdAt"), Some("d.created_at"));
        assert_eq!(fields.column("type"), Some("d.device_type"));
        assert!(!fields.contains("dateAudit"));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let value = serde_json::to_value(device(RateType::LikeNew, 150.0)).unwrap();
        assert_eq!(value["type"], "MOUSE");
        assert_eq!(value["rateType"], "LIKENEW");
        assert!(value["dateAudit"]["createdAt"].is_string());
    }
}
