use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Borrowing, Device, DeviceDraft, Employee, EmployeeDraft, LogEntry, NewBorrowing, Role,
};
use crate::types::{DeviceType, RateType};
use crate::validation::SortOrder;

/// Zero-based page window with an optional validated ordering
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<SortOrder>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size, sort: None }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

/// One page of results plus the totals clients need to walk the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size.max(1) as i64;
        Self {
            content,
            page_number: request.page,
            page_size: request.size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Device finders
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceQuery {
    All,
    ItemName(String),
    /// Inclusive range on the creation timestamp
    CreatedBetween(NaiveDateTime, NaiveDateTime),
    Type(DeviceType),
    RateType(RateType),
}

/// Borrowing finders
#[derive(Debug, Clone, PartialEq)]
pub enum BorrowingQuery {
    All,
    /// Borrowings holding a device with this item name
    DeviceItemName(String),
    /// Inclusive range on the hand-over date
    HandOverBetween(NaiveDateTime, NaiveDateTime),
    /// Borrowings holding a device of this type
    DeviceType(DeviceType),
    TotalPrice(f64),
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError>;

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, DatabaseError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Employee>, DatabaseError>;

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Employee>, DatabaseError>;

    async fn find_all(&self) -> Result<Vec<Employee>, DatabaseError>;

    /// Conflict when the user name is taken
    async fn insert(&self, draft: EmployeeDraft) -> Result<Employee, DatabaseError>;

    /// Replace every column and the role set; NotFound when missing
    async fn update(&self, id: i32, draft: EmployeeDraft) -> Result<Employee, DatabaseError>;

    /// Conflict while a borrowing references the employee
    async fn delete(&self, id: i32) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Device>, DatabaseError>;

    async fn insert(&self, draft: DeviceDraft) -> Result<Device, DatabaseError>;

    async fn update(&self, id: i32, draft: DeviceDraft) -> Result<Device, DatabaseError>;

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError>;

    async fn find_page(&self, query: DeviceQuery, page: &PageRequest) -> Result<Page<Device>, DatabaseError>;

    /// Id of the borrowing currently holding the device
    async fn borrowing_of(&self, device_id: i32) -> Result<Option<i32>, DatabaseError>;
}

#[async_trait]
pub trait BorrowingRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Borrowing>, DatabaseError>;

    async fn insert(&self, borrowing: NewBorrowing) -> Result<Borrowing, DatabaseError>;

    /// Persist several borrowings atomically; device moves between them are
    /// applied as a whole
    async fn save_all(&self, borrowings: &[Borrowing]) -> Result<Vec<Borrowing>, DatabaseError>;

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError>;

    async fn find_page(&self, query: BorrowingQuery, page: &PageRequest) -> Result<Page<Borrowing>, DatabaseError>;

    async fn save(&self, borrowing: &Borrowing) -> Result<Borrowing, DatabaseError> {
        self.save_all(std::slice::from_ref(borrowing))
            .await?
            .pop()
            .ok_or_else(|| DatabaseError::NotFound(format!("Borrowing with ID {} not found", borrowing.id)))
    }
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn save(&self, entry: LogEntry) -> Result<LogEntry, DatabaseError>;

    /// Newest first
    async fn find_page(&self, page: &PageRequest) -> Result<Page<LogEntry>, DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Every repository behind one storage backend
#[derive(Clone)]
pub struct Repositories {
    pub roles: Arc<dyn RoleRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub devices: Arc<dyn DeviceRepository>,
    pub borrowings: Arc<dyn BorrowingRepository>,
    pub logs: Arc<dyn LogRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// Wire every repository to one store implementing them all
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RoleRepository
            + EmployeeRepository
            + DeviceRepository
            + BorrowingRepository
            + LogRepository
            + HealthCheck
            + 'static,
    {
        Self {
            roles: store.clone(),
            employees: store.clone(),
            devices: store.clone(),
            borrowings: store.clone(),
            logs: store.clone(),
            health: store,
        }
    }
}
