use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{Device, DeviceDraft};
use crate::database::repository::{DeviceQuery, DeviceRepository, Page, PageRequest, Repositories};
use crate::services::ServiceError;
use crate::types::{DeviceType, RateType};

#[derive(Clone)]
pub struct DeviceService {
    devices: Arc<dyn DeviceRepository>,
}

pub(crate) fn check_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ServiceError> {
    if start > end {
        return Err(ServiceError::BadRequest("startDate must not be after endDate".to_string()));
    }
    Ok(())
}

impl DeviceService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            devices: repositories.devices.clone(),
        }
    }

    fn not_found(id: i32) -> ServiceError {
        ServiceError::NotFound(format!("Device with ID {} not found", id))
    }

    pub async fn create_device(&self, draft: DeviceDraft) -> Result<Device, ServiceError> {
        let device = self.devices.insert(draft).await?;
        info!("Created device {} ({})", device.id, device.item_name);
        Ok(device)
    }

    pub async fn update_device(&self, id: i32, draft: DeviceDraft) -> Result<Device, ServiceError> {
        match self.devices.update(id, draft).await {
            Err(DatabaseError::NotFound(_)) => Err(Self::not_found(id)),
            other => Ok(other?),
        }
    }

    pub async fn get_device_by_id(&self, id: i32) -> Result<Device, ServiceError> {
        self.devices.find_by_id(id).await?.ok_or_else(|| Self::not_found(id))
    }

    /// Lent devices stay until their borrowing releases them
    pub async fn delete_device(&self, id: i32) -> Result<(), ServiceError> {
        if let Some(borrowing_id) = self.devices.borrowing_of(id).await? {
            return Err(ServiceError::Conflict(format!(
                "Device with ID {} is lent in borrowing {}",
                id, borrowing_id
            )));
        }

        match self.devices.delete(id).await {
            Ok(true) => {
                info!("Deleted device {}", id);
                Ok(())
            }
            Ok(false) => Err(Self::not_found(id)),
            Err(DatabaseError::Conflict(_)) => Err(ServiceError::Conflict(format!("Device with ID {} is lent", id))),
            Err(e) => Err(e.into()),
        }
    }

    /// Unsorted pages come back in id order
    pub async fn get_all_devices(&self, page: PageRequest) -> Result<Page<Device>, ServiceError> {
        let page = PageRequest { sort: None, ..page };
        Ok(self.devices.find_page(DeviceQuery::All, &page).await?)
    }

    pub async fn get_devices_sorted_by(&self, page: PageRequest) -> Result<Page<Device>, ServiceError> {
        Ok(self.devices.find_page(DeviceQuery::All, &page).await?)
    }

    pub async fn find_device_by_item_name(&self, item_name: &str, page: PageRequest) -> Result<Page<Device>, ServiceError> {
        Ok(self
            .devices
            .find_page(DeviceQuery::ItemName(item_name.to_string()), &page)
            .await?)
    }

    /// Devices created within `[start, end]`
    pub async fn find_device_by_date(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        page: PageRequest,
    ) -> Result<Page<Device>, ServiceError> {
        check_range(start, end)?;
        Ok(self.devices.find_page(DeviceQuery::CreatedBetween(start, end), &page).await?)
    }

    pub async fn find_device_by_type(&self, device_type: DeviceType, page: PageRequest) -> Result<Page<Device>, ServiceError> {
        Ok(self.devices.find_page(DeviceQuery::Type(device_type), &page).await?)
    }

    pub async fn find_device_by_rate_type(&self, rate_type: RateType, page: PageRequest) -> Result<Page<Device>, ServiceError> {
        Ok(self.devices.find_page(DeviceQuery::RateType(rate_type), &page).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::database::models::date_audit::now;
    use crate::database::repository::PageRequest;
    use crate::services::ServiceError;
    use crate::testing::TestContext;
    use crate::types::{DeviceType, RateType, SortDirection};
    use crate::validation::SortOrder;

    #[tokio::test]
    async fn create_update_and_get() {
        let ctx = TestContext::new();
        let device = ctx.create_device("Mouse 1", "MOUSE", "NEW", 20.0).await;
        assert_eq!(device.device_type, DeviceType::Mouse);

        let mut request = TestContext::device_request("Mouse 2", "MOUSE", "USED", 30.0);
        request.version = "2.0".to_string();
        let updated = ctx
            .services
            .devices
            .update_device(device.id, request.to_draft().unwrap())
            .await
            .unwrap();
        assert_eq!(updated.item_name, "Mouse 2");
        assert_eq!(updated.rate_type, RateType::Used);
        assert_eq!(updated.version.as_deref(), Some("2.0"));
        assert!(updated.date_audit.updated_at >= device.date_audit.updated_at);

        let fetched = ctx.services.devices.get_device_by_id(device.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn missing_devices_are_not_found() {
        let ctx = TestContext::new();
        let draft = TestContext::device_request("X", "CASE", "NEW", 1.0).to_draft().unwrap();

        let err = ctx.services.devices.update_device(5, draft).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Device with ID 5 not found"));
        assert!(matches!(ctx.services.devices.delete_device(5).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn finders_filter_by_each_criterion() {
        let ctx = TestContext::new();
        ctx.create_device("Keyboard", "KEYBOARD", "NEW", 50.0).await;
        ctx.create_device("Laptop", "LAPTOP", "LIKENEW", 900.0).await;
        ctx.create_device("Laptop", "LAPTOP", "BROKEN", 400.0).await;
        let devices = &ctx.services.devices;
        let page = || PageRequest::new(0, 10);

        assert_eq!(devices.find_device_by_item_name("Laptop", page()).await.unwrap().total_elements, 2);
        assert_eq!(devices.find_device_by_type(DeviceType::Keyboard, page()).await.unwrap().total_elements, 1);
        assert_eq!(devices.find_device_by_rate_type(RateType::Broken, page()).await.unwrap().total_elements, 1);

        let today = now();
        let found = devices
            .find_device_by_date(today - Duration::hours(1), today + Duration::hours(1), page())
            .await
            .unwrap();
        assert_eq!(found.total_elements, 3);

        let err = devices
            .find_device_by_date(today, today - Duration::days(1), page())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn sorted_pages_follow_the_requested_order() {
        let ctx = TestContext::new();
        ctx.create_device("B", "CASE", "NEW", 2.0).await;
        ctx.create_device("C", "CASE", "NEW", 3.0).await;
        ctx.create_device("A", "CASE", "NEW", 1.0).await;

        let page = PageRequest::new(0, 2).sorted(SortOrder {
            path: "itemName".to_string(),
            column: "d.item_name".to_string(),
            direction: SortDirection::Asc,
        });
        let sorted = ctx.services.devices.get_devices_sorted_by(page.clone()).await.unwrap();
        let names: Vec<_> = sorted.content.iter().map(|d| d.item_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(sorted.total_pages, 2);

        // getAll ignores any sort and walks ids
        let all = ctx.services.devices.get_all_devices(page).await.unwrap();
        let names: Vec<_> = all.content.iter().map(|d| d.item_name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}
