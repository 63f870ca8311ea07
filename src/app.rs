use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, StorageBackend};
use crate::database::{DatabaseError, DatabaseManager, MemoryStore, PgStore, Repositories};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, request_log_middleware};
use crate::services::Services;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Services,
}

impl AppState {
    pub fn new(config: AppConfig, repositories: &Repositories) -> Self {
        let services = Services::new(repositories, &config);
        Self {
            config: Arc::new(config),
            services,
        }
    }
}

/// Open the configured storage backend
pub async fn connect_repositories(config: &AppConfig) -> Result<Repositories, DatabaseError> {
    match config.database.storage {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            Ok(Repositories::from_store(Arc::new(PgStore::new(pool))))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/log", get(public::system::log))
        .route("/api/auth/login", post(public::auth::login))
        // Protected
        .merge(api_routes(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    let api = Router::new()
        .nest("/api/v1/employee", employee_routes())
        .nest("/api/v1/device", device_routes())
        .nest("/api/v1/borrowing", borrowing_routes())
        .route("/api/v1/logs/getAll", get(protected::logs::get_all_logs))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    if state.config.api.enable_request_logging {
        api.layer(from_fn_with_state(state, request_log_middleware))
    } else {
        api
    }
}

fn employee_routes() -> Router<AppState> {
    use protected::employee;

    Router::new()
        .route("/get", get(employee::get_employee))
        .route("/getAll", get(employee::get_all_employees))
        .route("/delete", delete(employee::delete_employee))
        .route("/create", post(employee::create_employee))
        .route("/update", put(employee::update_employee))
}

fn device_routes() -> Router<AppState> {
    use protected::device;

    Router::new()
        .route("/create", post(device::create_device))
        .route("/get", get(device::get_device))
        .route("/getAll", get(device::get_all_devices))
        .route("/getDevicesSortBy", get(device::get_devices_sort_by))
        .route("/findByItemName", get(device::find_by_item_name))
        .route("/findByCreatedDate", get(device::find_by_created_date))
        .route("/findByType", get(device::find_by_type))
        .route("/findByRateType", get(device::find_by_rate_type))
        .route("/update", put(device::update_device))
        .route("/delete", delete(device::delete_device))
}

fn borrowing_routes() -> Router<AppState> {
    use protected::borrowing;

    Router::new()
        .route("/get", get(borrowing::get_borrowing))
        .route("/getAll", get(borrowing::get_all_borrowings))
        .route("/getBorrowingsSortedBy", get(borrowing::get_borrowings_sorted_by))
        .route("/delete", delete(borrowing::delete_borrowing))
        .route("/create", post(borrowing::create_borrowing))
        .route("/update", put(borrowing::update_borrowing))
        .route("/findByItemName", get(borrowing::find_by_item_name))
        .route("/findByHandOverDate", get(borrowing::find_by_hand_over_date))
        .route("/findByItemType", get(borrowing::find_by_item_type))
        .route("/findByTotalPrice", get(borrowing::find_by_total_price))
        .route("/transferDevice", put(borrowing::transfer_device))
}

/// `*` allows any origin; otherwise only the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
