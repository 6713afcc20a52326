pub mod health;
pub mod locations;
pub mod transfers;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::locations::LocationDirectoryService;
use crate::services::stock_orders::StockOrderService;
use crate::services::transfers::TransferService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub transfers: Arc<TransferService>,
    pub locations: Arc<LocationDirectoryService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let locations = LocationDirectoryService::new(db_pool.clone());
        let orders = StockOrderService::new(db_pool);
        let transfers = TransferService::new(orders, locations.clone(), event_sender);

        Self {
            transfers: Arc::new(transfers),
            locations: Arc::new(locations),
        }
    }
}
