use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::auth::roles;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Borrowing, DateAudit, Device, DeviceDraft, Employee, EmployeeDraft, LogEntry, NewBorrowing, Role,
};
use crate::database::repository::{
    BorrowingQuery, BorrowingRepository, DeviceQuery, DeviceRepository, EmployeeRepository, HealthCheck,
    LogRepository, Page, PageRequest, RoleRepository,
};
use crate::types::SortDirection;

/// Borrowing as stored; employee and devices are resolved on read
#[derive(Debug, Clone)]
struct BorrowingRecord {
    id: i32,
    employee_id: i32,
    total_price: f64,
    date_audit: DateAudit,
    device_ids: Vec<i32>,
}

#[derive(Debug, Default)]
struct State {
    roles: BTreeMap<i32, Role>,
    employees: BTreeMap<i32, Employee>,
    devices: BTreeMap<i32, Device>,
    borrowings: BTreeMap<i32, BorrowingRecord>,
    logs: BTreeMap<i64, LogEntry>,
    next_employee_id: i32,
    next_device_id: i32,
    next_borrowing_id: i32,
    next_log_id: i64,
}

impl State {
    fn hydrate(&self, record: &BorrowingRecord) -> Result<Borrowing, DatabaseError> {
        let employee = self
            .employees
            .get(&record.employee_id)
            .cloned()
            .ok_or_else(|| DatabaseError::QueryError(format!("borrowing {} has no employee", record.id)))?;

        let devices = record
            .device_ids
            .iter()
            .map(|id| {
                self.devices
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DatabaseError::QueryError(format!("borrowing {} lost device {}", record.id, id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Borrowing {
            id: record.id,
            date_audit: record.date_audit.clone(),
            total_price: record.total_price,
            employee,
            devices,
        })
    }

    fn holder_of(&self, device_id: i32) -> Option<i32> {
        self.borrowings
            .values()
            .find(|b| b.device_ids.contains(&device_id))
            .map(|b| b.id)
    }

    /// Devices must exist, appear once, and not be held by a borrowing
    /// outside `replacing`
    fn check_devices(&self, device_ids: &[i32], replacing: &[i32], claimed: &mut HashSet<i32>) -> Result<(), DatabaseError> {
        for id in device_ids {
            if !self.devices.contains_key(id) {
                return Err(DatabaseError::NotFound(format!("Device with ID {} not found", id)));
            }
            if !claimed.insert(*id) {
                return Err(DatabaseError::Conflict(format!("Device with ID {} is listed twice", id)));
            }
            if let Some(holder) = self.holder_of(*id) {
                if !replacing.contains(&holder) {
                    return Err(DatabaseError::Conflict(format!(
                        "Device with ID {} is already in borrowing {}",
                        id, holder
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_user_name(&self, user_name: &str, except: Option<i32>) -> Result<(), DatabaseError> {
        let taken = self
            .employees
            .values()
            .any(|e| e.user_name == user_name && Some(e.id) != except);
        if taken {
            Err(DatabaseError::Conflict(format!("Username '{}' is already taken", user_name)))
        } else {
            Ok(())
        }
    }
}

/// Repositories held in process memory
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Empty store with the two roles seeded
    pub fn new() -> Self {
        let mut state = State {
            next_employee_id: 1,
            next_device_id: 1,
            next_borrowing_id: 1,
            next_log_id: 1,
            ..State::default()
        };
        for (index, name) in roles::ALL.iter().enumerate() {
            let id = index as i32 + 1;
            state.roles.insert(id, Role { id, name: name.to_string() });
        }

        Self { state: RwLock::new(state) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Filtered items, already in id order, cut to one page. Sorting goes through
/// the serialized form so the dotted paths match the wire names; missing
/// values sort last in both directions.
fn paginate<T: Serialize>(items: Vec<T>, page: &PageRequest) -> Result<Page<T>, DatabaseError> {
    let total = items.len() as i64;

    let ordered = match &page.sort {
        None => items,
        Some(sort) => {
            let mut keyed = items
                .into_iter()
                .map(|item| -> Result<(Option<Value>, T), DatabaseError> {
                    let value = serde_json::to_value(&item).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
                    let key = json_path(&value, &sort.path).cloned();
                    Ok((key, item))
                })
                .collect::<Result<Vec<_>, DatabaseError>>()?;

            keyed.sort_by(|(a, _), (b, _)| match (a, b) {
                (Some(a), Some(b)) => match sort.direction {
                    SortDirection::Asc => compare_json(a, b),
                    SortDirection::Desc => compare_json(b, a),
                },
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });

            keyed.into_iter().map(|(_, item)| item).collect()
        }
    };

    let content = ordered
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();

    Ok(Page::new(content, page, total))
}

fn device_matches(device: &Device, query: &DeviceQuery) -> bool {
    match query {
        DeviceQuery::All => true,
        DeviceQuery::ItemName(name) => &device.item_name == name,
        DeviceQuery::CreatedBetween(start, end) => {
            (*start..=*end).contains(&device.date_audit.created_at)
        }
        DeviceQuery::Type(device_type) => device.device_type == *device_type,
        DeviceQuery::RateType(rate_type) => device.rate_type == *rate_type,
    }
}

fn borrowing_matches(borrowing: &Borrowing, query: &BorrowingQuery) -> bool {
    match query {
        BorrowingQuery::All => true,
        BorrowingQuery::DeviceItemName(name) => borrowing.devices.iter().any(|d| &d.item_name == name),
        BorrowingQuery::HandOverBetween(start, end) => borrowing
            .date_audit
            .hand_over_date
            .map(|date| (*start..=*end).contains(&date))
            .unwrap_or(false),
        BorrowingQuery::DeviceType(device_type) => borrowing.devices.iter().any(|d| d.device_type == *device_type),
        BorrowingQuery::TotalPrice(total) => borrowing.total_price == *total,
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .filter(|r| names.contains(&r.name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Employee>, DatabaseError> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Employee>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.employees.values().find(|e| e.user_name == user_name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Employee>, DatabaseError> {
        Ok(self.state.read().await.employees.values().cloned().collect())
    }

    async fn insert(&self, draft: EmployeeDraft) -> Result<Employee, DatabaseError> {
        let mut state = self.state.write().await;
        state.check_user_name(&draft.user_name, None)?;

        let id = state.next_employee_id;
        state.next_employee_id += 1;

        let employee = Employee {
            id,
            user_name: draft.user_name,
            password: draft.password_hash,
            full_name: draft.full_name,
            address: draft.address,
            phone_number: draft.phone_number,
            account_balance: draft.account_balance,
            roles: draft.roles,
        };
        state.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: i32, draft: EmployeeDraft) -> Result<Employee, DatabaseError> {
        let mut state = self.state.write().await;
        state.check_user_name(&draft.user_name, Some(id))?;

        let employee = state
            .employees
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Employee with ID {} not found", id)))?;

        employee.user_name = draft.user_name;
        employee.password = draft.password_hash;
        employee.full_name = draft.full_name;
        employee.address = draft.address;
        employee.phone_number = draft.phone_number;
        employee.account_balance = draft.account_balance;
        employee.roles = draft.roles;
        Ok(employee.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.employees.contains_key(&id) {
            return Ok(false);
        }
        if state.borrowings.values().any(|b| b.employee_id == id) {
            return Err(DatabaseError::Conflict("record is still referenced by another record".to_string()));
        }
        state.employees.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl DeviceRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Device>, DatabaseError> {
        Ok(self.state.read().await.devices.get(&id).cloned())
    }

    async fn insert(&self, draft: DeviceDraft) -> Result<Device, DatabaseError> {
        let mut state = self.state.write().await;
        let id = state.next_device_id;
        state.next_device_id += 1;

        let device = Device {
            id,
            device_type: draft.device_type,
            unit_price: draft.unit_price,
            rate_type: draft.rate_type,
            date_audit: DateAudit::new(),
            branch_name: draft.branch_name,
            item_name: draft.item_name,
            version: draft.version,
            original_price: draft.original_price,
        };
        state.devices.insert(id, device.clone());
        Ok(device)
    }

    async fn update(&self, id: i32, draft: DeviceDraft) -> Result<Device, DatabaseError> {
        let mut state = self.state.write().await;
        let device = state
            .devices
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Device with ID {} not found", id)))?;

        device.device_type = draft.device_type;
        device.unit_price = draft.unit_price;
        device.rate_type = draft.rate_type;
        device.branch_name = draft.branch_name;
        device.item_name = draft.item_name;
        device.version = draft.version;
        device.original_price = draft.original_price;
        device.date_audit.touch();
        Ok(device.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.devices.contains_key(&id) {
            return Ok(false);
        }
        if state.holder_of(id).is_some() {
            return Err(DatabaseError::Conflict("record is still referenced by another record".to_string()));
        }
        state.devices.remove(&id);
        Ok(true)
    }

    async fn find_page(&self, query: DeviceQuery, page: &PageRequest) -> Result<Page<Device>, DatabaseError> {
        let state = self.state.read().await;
        let matching = state
            .devices
            .values()
            .filter(|d| device_matches(d, &query))
            .cloned()
            .collect();
        paginate(matching, page)
    }

    async fn borrowing_of(&self, device_id: i32) -> Result<Option<i32>, DatabaseError> {
        Ok(self.state.read().await.holder_of(device_id))
    }
}

#[async_trait]
impl BorrowingRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Borrowing>, DatabaseError> {
        let state = self.state.read().await;
        state.borrowings.get(&id).map(|record| state.hydrate(record)).transpose()
    }

    async fn insert(&self, borrowing: NewBorrowing) -> Result<Borrowing, DatabaseError> {
        let mut state = self.state.write().await;

        if !state.employees.contains_key(&borrowing.employee_id) {
            return Err(DatabaseError::NotFound(format!(
                "Employee with ID {} not found",
                borrowing.employee_id
            )));
        }
        state.check_devices(&borrowing.device_ids, &[], &mut HashSet::new())?;

        let id = state.next_borrowing_id;
        state.next_borrowing_id += 1;

        let mut date_audit = DateAudit::new();
        date_audit.hand_over_date = Some(borrowing.hand_over_date);

        let record = BorrowingRecord {
            id,
            employee_id: borrowing.employee_id,
            total_price: borrowing.total_price,
            date_audit,
            device_ids: borrowing.device_ids,
        };
        let hydrated = state.hydrate(&record)?;
        state.borrowings.insert(id, record);
        Ok(hydrated)
    }

    async fn save_all(&self, borrowings: &[Borrowing]) -> Result<Vec<Borrowing>, DatabaseError> {
        let mut state = self.state.write().await;
        let ids: Vec<i32> = borrowings.iter().map(|b| b.id).collect();

        // Validate the whole batch before touching anything
        let mut claimed = HashSet::new();
        for borrowing in borrowings {
            if !state.borrowings.contains_key(&borrowing.id) {
                return Err(DatabaseError::NotFound(format!("Borrowing with ID {} not found", borrowing.id)));
            }
            if !state.employees.contains_key(&borrowing.employee.id) {
                return Err(DatabaseError::NotFound(format!(
                    "Employee with ID {} not found",
                    borrowing.employee.id
                )));
            }
            state.check_devices(&borrowing.device_ids(), &ids, &mut claimed)?;
        }

        let mut saved = Vec::with_capacity(borrowings.len());
        for borrowing in borrowings {
            let record = BorrowingRecord {
                id: borrowing.id,
                employee_id: borrowing.employee.id,
                total_price: borrowing.total_price,
                date_audit: borrowing.date_audit.clone(),
                device_ids: borrowing.device_ids(),
            };
            state.borrowings.insert(record.id, record);
        }
        for id in &ids {
            if let Some(record) = state.borrowings.get(id) {
                saved.push(state.hydrate(record)?);
            }
        }
        Ok(saved)
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.state.write().await.borrowings.remove(&id).is_some())
    }

    async fn find_page(&self, query: BorrowingQuery, page: &PageRequest) -> Result<Page<Borrowing>, DatabaseError> {
        let state = self.state.read().await;
        let mut matching = Vec::new();
        for record in state.borrowings.values() {
            let borrowing = state.hydrate(record)?;
            if borrowing_matches(&borrowing, &query) {
                matching.push(borrowing);
            }
        }
        paginate(matching, page)
    }
}

#[async_trait]
impl LogRepository for MemoryStore {
    async fn save(&self, entry: LogEntry) -> Result<LogEntry, DatabaseError> {
        let mut state = self.state.write().await;
        let id = state.next_log_id;
        state.next_log_id += 1;

        let entry = LogEntry { id: Some(id), ..entry };
        state.logs.insert(id, entry.clone());
        Ok(entry)
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<LogEntry>, DatabaseError> {
        let state = self.state.read().await;
        let mut entries: Vec<LogEntry> = state.logs.values().cloned().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        paginate(entries, &PageRequest { sort: None, ..page.clone() })
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::date_audit::now;
    use crate::types::{DeviceType, RateType};
    use crate::validation::SortOrder;

    fn draft(item_name: &str, device_type: DeviceType, original_price: f64) -> DeviceDraft {
        DeviceDraft {
            device_type,
            unit_price: 10.0,
            rate_type: RateType::New,
            branch_name: "Branch".to_string(),
            item_name: item_name.to_string(),
            version: None,
            original_price,
        }
    }

    fn employee(user_name: &str) -> EmployeeDraft {
        EmployeeDraft {
            user_name: user_name.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Jane Doe".to_string(),
            address: "1 Main St".to_string(),
            phone_number: "0912345678".to_string(),
            account_balance: 100.0,
            roles: vec![],
        }
    }

    async fn lend(store: &MemoryStore, employee_id: i32, device_ids: Vec<i32>) -> Result<Borrowing, DatabaseError> {
        BorrowingRepository::insert(
            store,
            NewBorrowing { employee_id, device_ids, total_price: 0.0, hand_over_date: now() },
        )
        .await
    }

    #[tokio::test]
    async fn seeds_both_roles() {
        let store = MemoryStore::new();
        let roles = store
            .find_by_names(&["ROLE_ADMIN".to_string(), "ROLE_USER".to_string()])
            .await
            .unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(store.find_by_name("ROLE_USER").await.unwrap().unwrap().id, 2);
    }

    #[tokio::test]
    async fn user_names_are_unique() {
        let store = MemoryStore::new();
        EmployeeRepository::insert(&store, employee("jdoe")).await.unwrap();
        let err = EmployeeRepository::insert(&store, employee("jdoe")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn a_device_is_lent_once() {
        let store = MemoryStore::new();
        let emp = EmployeeRepository::insert(&store, employee("jdoe")).await.unwrap();
        let device = DeviceRepository::insert(&store, draft("Mouse", DeviceType::Mouse, 10.0)).await.unwrap();

        let first = lend(&store, emp.id, vec![device.id]).await.unwrap();
        assert_eq!(first.devices.len(), 1);
        assert_eq!(store.borrowing_of(device.id).await.unwrap(), Some(first.id));

        let err = lend(&store, emp.id, vec![device.id]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        // Referenced rows cannot go away
        assert!(matches!(DeviceRepository::delete(&store, device.id).await, Err(DatabaseError::Conflict(_))));
        assert!(matches!(EmployeeRepository::delete(&store, emp.id).await, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn save_all_moves_devices_between_borrowings() {
        let store = MemoryStore::new();
        let emp = EmployeeRepository::insert(&store, employee("jdoe")).await.unwrap();
        let a = DeviceRepository::insert(&store, draft("A", DeviceType::Mouse, 10.0)).await.unwrap();
        let b = DeviceRepository::insert(&store, draft("B", DeviceType::Case, 10.0)).await.unwrap();

        let mut from = lend(&store, emp.id, vec![a.id]).await.unwrap();
        let mut to = lend(&store, emp.id, vec![b.id]).await.unwrap();

        let moved = from.remove_device(a.id).unwrap();
        to.add_device(moved);

        let saved = store.save_all(&[from.clone(), to.clone()]).await.unwrap();
        assert!(saved[0].devices.is_empty());
        assert_eq!(saved[1].device_ids(), vec![b.id, a.id]);
        assert_eq!(store.borrowing_of(a.id).await.unwrap(), Some(to.id));
    }

    #[tokio::test]
    async fn pages_filter_and_sort() {
        let store = MemoryStore::new();
        for (name, price) in [("Keyboard", 30.0), ("Mouse", 10.0), ("Monitor", 20.0)] {
            DeviceRepository::insert(&store, draft(name, DeviceType::Keyboard, price)).await.unwrap();
        }

        let page = PageRequest::new(0, 2).sorted(SortOrder {
            path: "originalPrice".to_string(),
            column: "d.original_price".to_string(),
            direction: SortDirection::Desc,
        });
        let result = DeviceRepository::find_page(&store, DeviceQuery::All, &page).await.unwrap();
        assert_eq!(result.total_elements, 3);
        assert_eq!(result.total_pages, 2);
        let names: Vec<_> = result.content.iter().map(|d| d.item_name.as_str()).collect();
        assert_eq!(names, vec!["Keyboard", "Monitor"]);

        let mice = DeviceRepository::find_page(&store, DeviceQuery::ItemName("Mouse".to_string()), &PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(mice.content.len(), 1);
    }

    #[test]
    fn missing_sort_values_go_last() {
        #[derive(Serialize)]
        struct Row {
            id: i32,
            score: Option<i32>,
        }

        let rows = || {
            vec![
                Row { id: 1, score: None },
                Row { id: 2, score: Some(1) },
                Row { id: 3, score: Some(5) },
            ]
        };
        let order = |direction| SortOrder { path: "score".to_string(), column: "score".to_string(), direction };

        let desc = paginate(rows(), &PageRequest::new(0, 10).sorted(order(SortDirection::Desc))).unwrap();
        assert_eq!(desc.content.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let asc = paginate(rows(), &PageRequest::new(0, 10).sorted(order(SortDirection::Asc))).unwrap();
        assert_eq!(asc.content.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }
}
