use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date_audit::DateAudit;
use super::device::Device;
use super::employee::Employee;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
    pub id: i32,
    pub date_audit: DateAudit,
    pub total_price: f64,
    pub employee: Employee,
    pub devices: Vec<Device>,
}

impl Borrowing {
    pub fn total_price_of(devices: &[Device]) -> f64 {
        devices.iter().map(Device::calculate_total_price).sum()
    }

    pub fn update_total_price(&mut self) {
        self.total_price = Self::total_price_of(&self.devices);
    }

    pub fn add_device(&mut self, device: Device) {
        self.devices.push(device);
    }

    /// Detach a device by id, returning it if it was part of this borrowing
    pub fn remove_device(&mut self, device_id: i32) -> Option<Device> {
        let index = self.devices.iter().position(|d| d.id == device_id)?;
        Some(self.devices.remove(index))
    }

    pub fn device_ids(&self) -> Vec<i32> {
        self.devices.iter().map(|d| d.id).collect()
    }
}

/// A borrowing about to be inserted
#[derive(Debug, Clone)]
pub struct NewBorrowing {
    pub employee_id: i32,
    pub device_ids: Vec<i32>,
    pub total_price: f64,
    pub hand_over_date: NaiveDateTime,
}
