use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use crate::database::models::date_audit::now;
use crate::database::models::{Borrowing, Device, Employee, NewBorrowing};
use crate::database::repository::{
    BorrowingQuery, BorrowingRepository, DeviceRepository, EmployeeRepository, Page, PageRequest, Repositories,
};
use crate::payload::{BorrowingRequest, BorrowingResponse};
use crate::services::device_service::check_range;
use crate::services::ServiceError;
use crate::types::DeviceType;

#[derive(Clone)]
pub struct BorrowingService {
    borrowings: Arc<dyn BorrowingRepository>,
    devices: Arc<dyn DeviceRepository>,
    employees: Arc<dyn EmployeeRepository>,
}

impl BorrowingService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            borrowings: repositories.borrowings.clone(),
            devices: repositories.devices.clone(),
            employees: repositories.employees.clone(),
        }
    }

    fn not_found(id: i32) -> ServiceError {
        ServiceError::NotFound(format!("Borrowing with ID {} not found", id))
    }

    async fn borrowing(&self, id: i32) -> Result<Borrowing, ServiceError> {
        self.borrowings.find_by_id(id).await?.ok_or_else(|| Self::not_found(id))
    }

    async fn employee(&self, id: i32) -> Result<Employee, ServiceError> {
        self.employees
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee with ID {} not found", id)))
    }

    /// Load the requested devices, refusing any held by a borrowing other
    /// than `owner`
    async fn available_devices(&self, request: &BorrowingRequest, owner: Option<i32>) -> Result<Vec<Device>, ServiceError> {
        let mut devices = Vec::new();
        for id in request.unique_device_ids() {
            let device = self
                .devices
                .find_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Device with ID {} not found", id)))?;

            if let Some(holder) = self.devices.borrowing_of(id).await? {
                if Some(holder) != owner {
                    return Err(ServiceError::Conflict(format!(
                        "Device with ID {} is already lent in borrowing {}",
                        id, holder
                    )));
                }
            }
            devices.push(device);
        }
        Ok(devices)
    }

    pub async fn create_borrowing(&self, request: BorrowingRequest) -> Result<BorrowingResponse, ServiceError> {
        let employee = self.employee(request.employee_id).await?;
        let devices = self.available_devices(&request, None).await?;

        let borrowing = self
            .borrowings
            .insert(NewBorrowing {
                employee_id: employee.id,
                device_ids: devices.iter().map(|d| d.id).collect(),
                total_price: Borrowing::total_price_of(&devices),
                hand_over_date: now(),
            })
            .await?;

        info!(
            "Created borrowing {} for employee {} with {} device(s)",
            borrowing.id,
            employee.id,
            borrowing.devices.len()
        );
        Ok(borrowing.into())
    }

    /// Replace employee and devices; the hand-over date restarts
    pub async fn update_borrowing(&self, id: i32, request: BorrowingRequest) -> Result<BorrowingResponse, ServiceError> {
        let mut borrowing = self.borrowing(id).await?;
        borrowing.employee = self.employee(request.employee_id).await?;
        borrowing.devices = self.available_devices(&request, Some(id)).await?;
        borrowing.update_total_price();
        borrowing.date_audit.update_hand_over_date();
        borrowing.date_audit.touch();

        let saved = self.borrowings.save(&borrowing).await?;
        info!("Updated borrowing {}", id);
        Ok(saved.into())
    }

    pub async fn delete_borrowing(&self, id: i32) -> Result<(), ServiceError> {
        if !self.borrowings.delete(id).await? {
            return Err(Self::not_found(id));
        }
        info!("Deleted borrowing {}", id);
        Ok(())
    }

    pub async fn get_borrowing_by_id(&self, id: i32) -> Result<BorrowingResponse, ServiceError> {
        Ok(self.borrowing(id).await?.into())
    }

    async fn page(&self, query: BorrowingQuery, page: &PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        let found = self.borrowings.find_page(query, page).await?;
        Ok(found.map(BorrowingResponse::from))
    }

    pub async fn get_all_borrowing(&self, page: PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        let page = PageRequest { sort: None, ..page };
        self.page(BorrowingQuery::All, &page).await
    }

    pub async fn get_borrowings_sorted_by(&self, page: PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        self.page(BorrowingQuery::All, &page).await
    }

    /// Borrowings holding a device with this item name
    pub async fn find_by_device_name(&self, item_name: &str, page: PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        self.page(BorrowingQuery::DeviceItemName(item_name.to_string()), &page).await
    }

    pub async fn find_by_hand_over_date(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        page: PageRequest,
    ) -> Result<Page<BorrowingResponse>, ServiceError> {
        check_range(start, end)?;
        self.page(BorrowingQuery::HandOverBetween(start, end), &page).await
    }

    pub async fn find_by_device_type(&self, device_type: DeviceType, page: PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        self.page(BorrowingQuery::DeviceType(device_type), &page).await
    }

    pub async fn find_by_total_price(&self, total_price: f64, page: PageRequest) -> Result<Page<BorrowingResponse>, ServiceError> {
        self.page(BorrowingQuery::TotalPrice(total_price), &page).await
    }

    /// Move one device between borrowings and reprice both. Returns
    /// `[from, to]` as saved.
    pub async fn transfer_device(&self, from_id: i32, to_id: i32, device_id: i32) -> Result<Vec<BorrowingResponse>, ServiceError> {
        if from_id == to_id {
            return Err(ServiceError::BadRequest(
                "Source and target borrowing must be different".to_string(),
            ));
        }

        let mut from = self.borrowing(from_id).await?;
        let mut to = self.borrowing(to_id).await?;

        let device = from.remove_device(device_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Device with ID {} not found in borrowing {}", device_id, from_id))
        })?;
        to.add_device(device);

        for borrowing in [&mut from, &mut to] {
            borrowing.update_total_price();
            borrowing.date_audit.touch();
        }

        let saved = self.borrowings.save_all(&[from, to]).await?;
        info!("Transferred device {} from borrowing {} to {}", device_id, from_id, to_id);
        Ok(saved.into_iter().map(BorrowingResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::testing::TestContext;
    use crate::types::SortDirection;
    use crate::validation::SortOrder;

    struct Fixture {
        ctx: TestContext,
        employee_id: i32,
        mouse: i32,
        laptop: i32,
        monitor: i32,
    }

    async fn fixture() -> Fixture {
        let ctx = TestContext::new();
        let employee_id = ctx.create_employee("jdoe").await.id;
        let mouse = ctx.create_device("Mouse", "MOUSE", "NEW", 100.0).await.id;
        let laptop = ctx.create_device("Laptop", "LAPTOP", "USED", 1000.0).await.id;
        let monitor = ctx.create_device("Monitor", "MONITOR", "BROKEN", 300.0).await.id;
        Fixture { ctx, employee_id, mouse, laptop, monitor }
    }

    fn request(employee_id: i32, devices_id: Vec<i32>) -> BorrowingRequest {
        BorrowingRequest { employee_id, devices_id }
    }

    #[tokio::test]
    async fn create_prices_devices_and_stamps_hand_over() {
        let f = fixture().await;
        let created = f
            .ctx
            .services
            .borrowings
            .create_borrowing(request(f.employee_id, vec![f.mouse, f.laptop, f.mouse]))
            .await
            .unwrap();

        assert_eq!(created.devices.len(), 2);
        assert_eq!(created.total_price, 600.0);
        assert!(created.date_audit.hand_over_date.is_some());
        assert_eq!(created.employee.user_name, "jdoe");
    }

    #[tokio::test]
    async fn create_rejects_unknown_references() {
        let f = fixture().await;
        let service = &f.ctx.services.borrowings;

        let err = service.create_borrowing(request(99, vec![f.mouse])).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Employee with ID 99 not found"));

        let err = service.create_borrowing(request(f.employee_id, vec![77])).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Device with ID 77 not found"));
    }

    #[tokio::test]
    async fn a_lent_device_cannot_be_lent_again() {
        let f = fixture().await;
        let service = &f.ctx.services.borrowings;
        let first = service.create_borrowing(request(f.employee_id, vec![f.mouse])).await.unwrap();

        let err = service.create_borrowing(request(f.employee_id, vec![f.mouse])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // ...but it may stay in its own borrowing on update
        let updated = service
            .update_borrowing(first.id, request(f.employee_id, vec![f.mouse, f.monitor]))
            .await
            .unwrap();
        assert_eq!(updated.total_price, 160.0);
        assert!(updated.date_audit.hand_over_date >= first.date_audit.hand_over_date);

        let err = f.ctx.services.devices.delete_device(f.mouse).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_frees_devices() {
        let f = fixture().await;
        let service = &f.ctx.services.borrowings;
        let created = service.create_borrowing(request(f.employee_id, vec![f.mouse])).await.unwrap();

        service.delete_borrowing(created.id).await.unwrap();
        assert!(matches!(service.get_borrowing_by_id(created.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.delete_borrowing(created.id).await, Err(ServiceError::NotFound(_))));

        f.ctx.services.devices.delete_device(f.mouse).await.unwrap();
    }

    #[tokio::test]
    async fn transfer_moves_the_device_and_reprices_both() {
        let f = fixture().await;
        let service = &f.ctx.services.borrowings;
        let a = service.create_borrowing(request(f.employee_id, vec![f.mouse, f.laptop])).await.unwrap();
        let b = service.create_borrowing(request(f.employee_id, vec![f.monitor])).await.unwrap();

        let saved = service.transfer_device(a.id, b.id, f.laptop).await.unwrap();
        assert_eq!(saved[0].id, a.id);
        assert_eq!(saved[0].total_price, 100.0);
        assert_eq!(saved[1].total_price, 560.0);
        assert_eq!(saved[1].devices.iter().map(|d| d.id).collect::<Vec<_>>(), vec![f.monitor, f.laptop]);

        let err = service.transfer_device(a.id, b.id, f.laptop).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == format!("Device with ID {} not found in borrowing {}", f.laptop, a.id)));

        let err = service.transfer_device(a.id, a.id, f.mouse).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let err = service.transfer_device(a.id, 999, f.mouse).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn finders_and_sorting() {
        let f = fixture().await;
        let service = &f.ctx.services.borrowings;
        let cheap = service.create_borrowing(request(f.employee_id, vec![f.monitor])).await.unwrap();
        let pricey = service.create_borrowing(request(f.employee_id, vec![f.laptop, f.mouse])).await.unwrap();
        let page = || PageRequest::new(0, 10);

        let by_name = service.find_by_device_name("Laptop", page()).await.unwrap();
        assert_eq!(by_name.content.iter().map(|b| b.id).collect::<Vec<_>>(), vec![pricey.id]);

        let by_type = service.find_by_device_type(DeviceType::Monitor, page()).await.unwrap();
        assert_eq!(by_type.content[0].id, cheap.id);

        let by_price = service.find_by_total_price(600.0, page()).await.unwrap();
        assert_eq!(by_price.total_elements, 1);

        let today = now();
        let by_date = service
            .find_by_hand_over_date(today - Duration::minutes(5), today + Duration::minutes(5), page())
            .await
            .unwrap();
        assert_eq!(by_date.total_elements, 2);

        let sorted = service
            .get_borrowings_sorted_by(PageRequest::new(0, 10).sorted(SortOrder {
                path: "totalPrice".to_string(),
                column: "b.total_price".to_string(),
                direction: SortDirection::Desc,
            }))
            .await
            .unwrap();
        assert_eq!(sorted.content.iter().map(|b| b.id).collect::<Vec<_>>(), vec![pricey.id, cheap.id]);
    }
}
