use crate::config::AppConfig;
use crate::db::orders::OrderService;
use crate::db::products::ProductService;
use crate::db::users::UserService;
use crate::db::Database;
use crate::query::QueryPipeline;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: QueryPipeline,
    pub users: UserService,
    pub products: ProductService,
    pub orders: OrderService,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database, pipeline: QueryPipeline) -> Self {
        Self {
            config,
            pipeline,
            users: UserService::new(db.clone()),
            products: ProductService::new(db.clone()),
            orders: OrderService::new(db),
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }
}
