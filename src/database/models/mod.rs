pub mod borrowing;
pub mod date_audit;
pub mod device;
pub mod employee;
pub mod log_entry;
pub mod role;

pub use borrowing::{Borrowing, NewBorrowing};
pub use date_audit::DateAudit;
pub use device::{Device, DeviceDraft};
pub use employee::{Employee, EmployeeDraft};
pub use log_entry::LogEntry;
pub use role::Role;
