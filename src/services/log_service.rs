use std::sync::Arc;

use crate::database::models::LogEntry;
use crate::database::repository::{LogRepository, Page, PageRequest, Repositories};
use crate::services::ServiceError;

/// Request audit trail
#[derive(Clone)]
pub struct LogService {
    logs: Arc<dyn LogRepository>,
}

impl LogService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            logs: repositories.logs.clone(),
        }
    }

    pub async fn record(&self, entry: LogEntry) -> Result<LogEntry, ServiceError> {
        Ok(self.logs.save(entry).await?)
    }

    /// Newest first
    pub async fn get_all_logs(&self, page: PageRequest) -> Result<Page<LogEntry>, ServiceError> {
        Ok(self.logs.find_page(&page).await?)
    }
}
