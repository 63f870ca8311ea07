use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Borrowing, DateAudit, Device, DeviceDraft, Employee, EmployeeDraft, LogEntry, NewBorrowing, Role,
};
use crate::database::models::date_audit::now;
use crate::database::repository::{
    BorrowingQuery, BorrowingRepository, DeviceQuery, DeviceRepository, EmployeeRepository, HealthCheck,
    LogRepository, Page, PageRequest, RoleRepository,
};
use crate::types::NamedEnum;

const EMPLOYEE_COLUMNS: &str =
    "e.id, e.user_name, e.password, e.full_name, e.address, e.phone_number, e.account_balance";

const DEVICE_COLUMNS: &str = "d.id, d.device_type, d.unit_price, d.rate_type, d.branch_name, d.item_name, \
     d.version, d.original_price, d.created_at, d.updated_at, d.hand_over_date, d.eviction_date";

const BORROWING_COLUMNS: &str =
    "b.id, b.employee_id, b.total_price, b.created_at, b.updated_at, b.hand_over_date, b.eviction_date";

const LOG_COLUMNS: &str = "id, timestamp, level, method, message, action, execution_time, user_name, \
     ip_address, parameters, result, stack_trace";

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: i32,
    user_name: String,
    password: String,
    full_name: String,
    address: String,
    phone_number: String,
    account_balance: f64,
}

#[derive(Debug, FromRow)]
struct EmployeeRoleRow {
    employee_id: i32,
    #[sqlx(flatten)]
    role: Role,
}

#[derive(Debug, FromRow)]
struct DeviceRow {
    id: i32,
    device_type: String,
    unit_price: f64,
    rate_type: String,
    branch_name: String,
    item_name: String,
    version: Option<String>,
    original_price: f64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    hand_over_date: Option<NaiveDateTime>,
    eviction_date: Option<NaiveDateTime>,
}

#[derive(Debug, FromRow)]
struct BorrowedDeviceRow {
    borrowing_id: i32,
    #[sqlx(flatten)]
    device: DeviceRow,
}

#[derive(Debug, FromRow)]
struct BorrowingRow {
    id: i32,
    employee_id: i32,
    total_price: f64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    hand_over_date: Option<NaiveDateTime>,
    eviction_date: Option<NaiveDateTime>,
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: i64,
    timestamp: NaiveDateTime,
    level: String,
    method: String,
    message: String,
    action: String,
    execution_time: i64,
    user_name: String,
    ip_address: String,
    parameters: Option<String>,
    result: Option<String>,
    stack_trace: Option<String>,
}

fn parse_name<E: NamedEnum>(value: &str) -> Result<E, DatabaseError> {
    E::from_name(value).ok_or_else(|| {
        DatabaseError::QueryError(format!("unexpected {} value '{}' in database", E::TYPE_NAME, value))
    })
}

impl TryFrom<DeviceRow> for Device {
    type Error = DatabaseError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        Ok(Device {
            id: row.id,
            device_type: parse_name(&row.device_type)?,
            unit_price: row.unit_price,
            rate_type: parse_name(&row.rate_type)?,
            date_audit: DateAudit {
                created_at: row.created_at,
                updated_at: row.updated_at,
                hand_over_date: row.hand_over_date,
                eviction_date: row.eviction_date,
            },
            branch_name: row.branch_name,
            item_name: row.item_name,
            version: row.version,
            original_price: row.original_price,
        })
    }
}

impl TryFrom<LogRow> for LogEntry {
    type Error = DatabaseError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(LogEntry {
            id: Some(row.id),
            timestamp: row.timestamp,
            level: parse_name(&row.level)?,
            method: row.method,
            message: row.message,
            action: parse_name(&row.action)?,
            execution_time_ms: row.execution_time,
            user_name: row.user_name,
            ip_address: row.ip_address,
            parameters: row.parameters,
            result: row.result,
            stack_trace: row.stack_trace,
        })
    }
}

/// Appends `ORDER BY` for the requested sort, falling back to (and breaking
/// ties by) `tiebreak`
fn push_order(qb: &mut QueryBuilder<'_, Postgres>, page: &PageRequest, tiebreak: &str) {
    qb.push(" ORDER BY ");
    if let Some(sort) = &page.sort {
        qb.push(sort.to_sql()).push(" NULLS LAST");
        if sort.column == tiebreak {
            return;
        }
        qb.push(", ");
    }
    qb.push(tiebreak).push(" ASC");
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, page: &PageRequest) {
    qb.push(" LIMIT ").push_bind(page.limit());
    qb.push(" OFFSET ").push_bind(page.offset());
}

fn push_device_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &DeviceQuery) {
    match query {
        DeviceQuery::All => {}
        DeviceQuery::ItemName(name) => {
            qb.push(" WHERE d.item_name = ").push_bind(name.clone());
        }
        DeviceQuery::CreatedBetween(start, end) => {
            qb.push(" WHERE d.created_at BETWEEN ")
                .push_bind(*start)
                .push(" AND ")
                .push_bind(*end);
        }
        DeviceQuery::Type(device_type) => {
            qb.push(" WHERE d.device_type = ").push_bind(device_type.name());
        }
        DeviceQuery::RateType(rate_type) => {
            qb.push(" WHERE d.rate_type = ").push_bind(rate_type.name());
        }
    }
}

fn push_borrowing_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &BorrowingQuery) {
    const HOLDS_DEVICE: &str = " WHERE EXISTS (SELECT 1 FROM borrowing_devices bd \
         JOIN devices d ON d.id = bd.device_id WHERE bd.borrowing_id = b.id AND ";

    match query {
        BorrowingQuery::All => {}
        BorrowingQuery::DeviceItemName(name) => {
            qb.push(HOLDS_DEVICE).push("d.item_name = ").push_bind(name.clone()).push(")");
        }
        BorrowingQuery::HandOverBetween(start, end) => {
            qb.push(" WHERE b.hand_over_date BETWEEN ")
                .push_bind(*start)
                .push(" AND ")
                .push_bind(*end);
        }
        BorrowingQuery::DeviceType(device_type) => {
            qb.push(HOLDS_DEVICE)
                .push("d.device_type = ")
                .push_bind(device_type.name())
                .push(")");
        }
        BorrowingQuery::TotalPrice(total) => {
            qb.push(" WHERE b.total_price = ").push_bind(*total);
        }
    }
}

/// Repositories backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate_employees(&self, rows: Vec<EmployeeRow>) -> Result<Vec<Employee>, DatabaseError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let role_rows: Vec<EmployeeRoleRow> = sqlx::query_as(
            "SELECT er.employee_id, r.id, r.name FROM employee_roles er \
             JOIN roles r ON r.id = er.role_id WHERE er.employee_id = ANY($1) ORDER BY r.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut roles: HashMap<i32, Vec<Role>> = HashMap::new();
        for row in role_rows {
            roles.entry(row.employee_id).or_default().push(row.role);
        }

        Ok(rows
            .into_iter()
            .map(|row| Employee {
                roles: roles.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_name: row.user_name,
                password: row.password,
                full_name: row.full_name,
                address: row.address,
                phone_number: row.phone_number,
                account_balance: row.account_balance,
            })
            .collect())
    }

    async fn hydrate_borrowings(&self, rows: Vec<BorrowingRow>) -> Result<Vec<Borrowing>, DatabaseError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let borrowing_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut employee_ids: Vec<i32> = rows.iter().map(|r| r.employee_id).collect();
        employee_ids.sort_unstable();
        employee_ids.dedup();

        let employee_rows: Vec<EmployeeRow> =
            sqlx::query_as(&format!("SELECT {} FROM employees e WHERE e.id = ANY($1)", EMPLOYEE_COLUMNS))
                .bind(&employee_ids)
                .fetch_all(&self.pool)
                .await?;
        let employees: HashMap<i32, Employee> = self
            .hydrate_employees(employee_rows)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let device_rows: Vec<BorrowedDeviceRow> = sqlx::query_as(&format!(
            "SELECT bd.borrowing_id, {} FROM borrowing_devices bd JOIN devices d ON d.id = bd.device_id \
             WHERE bd.borrowing_id = ANY($1) ORDER BY bd.borrowing_id, bd.position",
            DEVICE_COLUMNS
        ))
        .bind(&borrowing_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut devices: HashMap<i32, Vec<Device>> = HashMap::new();
        for row in device_rows {
            devices.entry(row.borrowing_id).or_default().push(Device::try_from(row.device)?);
        }

        rows.into_iter()
            .map(|row| -> Result<Borrowing, DatabaseError> {
                let employee = employees.get(&row.employee_id).cloned().ok_or_else(|| {
                    DatabaseError::QueryError(format!("borrowing {} has no employee", row.id))
                })?;
                Ok(Borrowing {
                    id: row.id,
                    date_audit: DateAudit {
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                        hand_over_date: row.hand_over_date,
                        eviction_date: row.eviction_date,
                    },
                    total_price: row.total_price,
                    employee,
                    devices: devices.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn borrowings_by_ids(&self, ids: &[i32]) -> Result<Vec<Borrowing>, DatabaseError> {
        let rows: Vec<BorrowingRow> =
            sqlx::query_as(&format!("SELECT {} FROM borrowings b WHERE b.id = ANY($1)", BORROWING_COLUMNS))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        let mut by_id: HashMap<i32, Borrowing> =
            self.hydrate_borrowings(rows).await?.into_iter().map(|b| (b.id, b)).collect();

        // Keep the caller's order
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn link_devices(conn: &mut PgConnection, borrowing_id: i32, device_ids: &[i32]) -> Result<(), DatabaseError> {
        for (position, device_id) in device_ids.iter().enumerate() {
            sqlx::query("INSERT INTO borrowing_devices (borrowing_id, device_id, position) VALUES ($1, $2, $3)")
                .bind(borrowing_id)
                .bind(device_id)
                .bind(position as i32)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn link_roles(conn: &mut PgConnection, employee_id: i32, roles: &[Role]) -> Result<(), DatabaseError> {
        for role in roles {
            sqlx::query("INSERT INTO employee_roles (employee_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(employee_id)
                .bind(role.id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn employee_or_not_found(&self, id: i32) -> Result<Employee, DatabaseError> {
        EmployeeRepository::find_by_id(self, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Employee with ID {} not found", id)))
    }

    async fn borrowing_or_not_found(&self, id: i32) -> Result<Borrowing, DatabaseError> {
        BorrowingRepository::find_by_id(self, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Borrowing with ID {} not found", id)))
    }
}

#[async_trait]
impl RoleRepository for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = ANY($1) ORDER BY id")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }
}

#[async_trait]
impl EmployeeRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Employee>, DatabaseError> {
        let rows: Vec<EmployeeRow> =
            sqlx::query_as(&format!("SELECT {} FROM employees e WHERE e.id = $1", EMPLOYEE_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate_employees(rows).await?.pop())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<Employee>, DatabaseError> {
        let rows: Vec<EmployeeRow> =
            sqlx::query_as(&format!("SELECT {} FROM employees e WHERE e.user_name = $1", EMPLOYEE_COLUMNS))
                .bind(user_name)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate_employees(rows).await?.pop())
    }

    async fn find_all(&self) -> Result<Vec<Employee>, DatabaseError> {
        let rows: Vec<EmployeeRow> =
            sqlx::query_as(&format!("SELECT {} FROM employees e ORDER BY e.id", EMPLOYEE_COLUMNS))
                .fetch_all(&self.pool)
                .await?;
        self.hydrate_employees(rows).await
    }

    async fn insert(&self, draft: EmployeeDraft) -> Result<Employee, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO employees (user_name, password, full_name, address, phone_number, account_balance) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&draft.user_name)
        .bind(&draft.password_hash)
        .bind(&draft.full_name)
        .bind(&draft.address)
        .bind(&draft.phone_number)
        .bind(draft.account_balance)
        .fetch_one(&mut *tx)
        .await?;

        Self::link_roles(&mut tx, id, &draft.roles).await?;
        tx.commit().await?;

        self.employee_or_not_found(id).await
    }

    async fn update(&self, id: i32, draft: EmployeeDraft) -> Result<Employee, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE employees SET user_name = $2, password = $3, full_name = $4, address = $5, \
             phone_number = $6, account_balance = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(id)
        .bind(&draft.user_name)
        .bind(&draft.password_hash)
        .bind(&draft.full_name)
        .bind(&draft.address)
        .bind(&draft.phone_number)
        .bind(draft.account_balance)
        .bind(now())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Employee with ID {} not found", id)));
        }

        sqlx::query("DELETE FROM employee_roles WHERE employee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::link_roles(&mut tx, id, &draft.roles).await?;
        tx.commit().await?;

        self.employee_or_not_found(id).await
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DeviceRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Device>, DatabaseError> {
        let row: Option<DeviceRow> =
            sqlx::query_as(&format!("SELECT {} FROM devices d WHERE d.id = $1", DEVICE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Device::try_from).transpose()
    }

    async fn insert(&self, draft: DeviceDraft) -> Result<Device, DatabaseError> {
        let created = now();
        let row: DeviceRow = sqlx::query_as(
            "INSERT INTO devices AS d (device_type, unit_price, rate_type, branch_name, item_name, version, \
             original_price, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING d.id, d.device_type, d.unit_price, d.rate_type, d.branch_name, d.item_name, \
             d.version, d.original_price, d.created_at, d.updated_at, d.hand_over_date, d.eviction_date",
        )
        .bind(draft.device_type.name())
        .bind(draft.unit_price)
        .bind(draft.rate_type.name())
        .bind(&draft.branch_name)
        .bind(&draft.item_name)
        .bind(&draft.version)
        .bind(draft.original_price)
        .bind(created)
        .fetch_one(&self.pool)
        .await?;
        Device::try_from(row)
    }

    async fn update(&self, id: i32, draft: DeviceDraft) -> Result<Device, DatabaseError> {
        let row: Option<DeviceRow> = sqlx::query_as(&format!(
            "UPDATE devices AS d SET device_type = $2, unit_price = $3, rate_type = $4, branch_name = $5, \
             item_name = $6, version = $7, original_price = $8, updated_at = $9 WHERE d.id = $1 RETURNING {}",
            DEVICE_COLUMNS
        ))
        .bind(id)
        .bind(draft.device_type.name())
        .bind(draft.unit_price)
        .bind(draft.rate_type.name())
        .bind(&draft.branch_name)
        .bind(&draft.item_name)
        .bind(&draft.version)
        .bind(draft.original_price)
        .bind(now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Device::try_from)
            .transpose()?
            .ok_or_else(|| DatabaseError::NotFound(format!("Device with ID {} not found", id)))
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_page(&self, query: DeviceQuery, page: &PageRequest) -> Result<Page<Device>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM devices d");
        push_device_filter(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM devices d", DEVICE_COLUMNS));
        push_device_filter(&mut select, &query);
        push_order(&mut select, page, "d.id");
        push_window(&mut select, page);

        let rows: Vec<DeviceRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let devices = rows.into_iter().map(Device::try_from).collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(devices, page, total))
    }

    async fn borrowing_of(&self, device_id: i32) -> Result<Option<i32>, DatabaseError> {
        let borrowing_id = sqlx::query_scalar("SELECT borrowing_id FROM borrowing_devices WHERE device_id = $1")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(borrowing_id)
    }
}

#[async_trait]
impl BorrowingRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Borrowing>, DatabaseError> {
        Ok(self.borrowings_by_ids(&[id]).await?.pop())
    }

    async fn insert(&self, borrowing: NewBorrowing) -> Result<Borrowing, DatabaseError> {
        let created = now();
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO borrowings (employee_id, total_price, created_at, updated_at, hand_over_date) \
             VALUES ($1, $2, $3, $3, $4) RETURNING id",
        )
        .bind(borrowing.employee_id)
        .bind(borrowing.total_price)
        .bind(created)
        .bind(borrowing.hand_over_date)
        .fetch_one(&mut *tx)
        .await?;

        Self::link_devices(&mut tx, id, &borrowing.device_ids).await?;
        tx.commit().await?;

        self.borrowing_or_not_found(id).await
    }

    async fn save_all(&self, borrowings: &[Borrowing]) -> Result<Vec<Borrowing>, DatabaseError> {
        let ids: Vec<i32> = borrowings.iter().map(|b| b.id).collect();
        let mut tx = self.pool.begin().await?;

        for borrowing in borrowings {
            let updated = sqlx::query(
                "UPDATE borrowings SET employee_id = $2, total_price = $3, updated_at = $4, \
                 hand_over_date = $5, eviction_date = $6 WHERE id = $1",
            )
            .bind(borrowing.id)
            .bind(borrowing.employee.id)
            .bind(borrowing.total_price)
            .bind(borrowing.date_audit.updated_at)
            .bind(borrowing.date_audit.hand_over_date)
            .bind(borrowing.date_audit.eviction_date)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DatabaseError::NotFound(format!("Borrowing with ID {} not found", borrowing.id)));
            }
        }

        // Unlink everything first so a device can move between borrowings in
        // the same save
        sqlx::query("DELETE FROM borrowing_devices WHERE borrowing_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        for borrowing in borrowings {
            Self::link_devices(&mut tx, borrowing.id, &borrowing.device_ids()).await?;
        }

        tx.commit().await?;

        self.borrowings_by_ids(&ids).await
    }

    async fn delete(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM borrowings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_page(&self, query: BorrowingQuery, page: &PageRequest) -> Result<Page<Borrowing>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM borrowings b");
        push_borrowing_filter(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM borrowings b JOIN employees e ON e.id = b.employee_id",
            BORROWING_COLUMNS
        ));
        push_borrowing_filter(&mut select, &query);
        push_order(&mut select, page, "b.id");
        push_window(&mut select, page);

        let rows: Vec<BorrowingRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let borrowings = self.hydrate_borrowings(rows).await?;

        Ok(Page::new(borrowings, page, total))
    }
}

#[async_trait]
impl LogRepository for PgStore {
    async fn save(&self, entry: LogEntry) -> Result<LogEntry, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO log_entries (timestamp, level, method, message, action, execution_time, user_name, \
             ip_address, parameters, result, stack_trace) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(entry.timestamp)
        .bind(entry.level.name())
        .bind(&entry.method)
        .bind(&entry.message)
        .bind(entry.action.name())
        .bind(entry.execution_time_ms)
        .bind(&entry.user_name)
        .bind(&entry.ip_address)
        .bind(&entry.parameters)
        .bind(&entry.result)
        .bind(&entry.stack_trace)
        .fetch_one(&self.pool)
        .await?;

        Ok(LogEntry { id: Some(id), ..entry })
    }

    async fn find_page(&self, page: &PageRequest) -> Result<Page<LogEntry>, DatabaseError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_entries")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<LogRow> = sqlx::query_as(&format!(
            "SELECT {} FROM log_entries ORDER BY timestamp DESC, id DESC LIMIT $1 OFFSET $2",
            LOG_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let entries = rows.into_iter().map(LogEntry::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(entries, page, total))
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
