//! Shared fixture for workflow integration tests.
//!
//! Tests run against an in-memory SQLite database through the real
//! migrator and services, so they need no external infrastructure. The
//! pool is capped at one connection: every in-memory SQLite connection is
//! its own database.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

use stocktransfer_api::auth::AuthUser;
use stocktransfer_api::entities::{location, location_assignment};
use stocktransfer_api::events::{Event, EventSender};
use stocktransfer_api::migrator::Migrator;
use stocktransfer_api::services::locations::LocationDirectoryService;
use stocktransfer_api::services::stock_orders::StockOrderService;
use stocktransfer_api::services::transfers::TransferService;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub tenant_id: Uuid,
    pub transfers: TransferService,
    pub orders: StockOrderService,
    pub locations: LocationDirectoryService,
    // Held so event emission never hits a closed channel
    #[allow(dead_code)]
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
        opt.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("sqlite connection");
        Migrator::up(&db, None).await.expect("migrations");

        let db = Arc::new(db);
        let (event_tx, events) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);

        let locations = LocationDirectoryService::new(db.clone());
        let orders = StockOrderService::new(db.clone());
        let transfers = TransferService::new(orders.clone(), locations.clone(), event_sender);

        Self {
            db,
            tenant_id: Uuid::new_v4(),
            transfers,
            orders,
            locations,
            events,
        }
    }

    /// Seeds an active store; `routing_code: None` makes it unusable.
    pub async fn seed_location(&self, store_name: &str, routing_code: Option<&str>) -> Uuid {
        self.seed_location_for_tenant(self.tenant_id, store_name, routing_code, true)
            .await
    }

    pub async fn seed_inactive_location(&self, store_name: &str, routing_code: Option<&str>) -> Uuid {
        self.seed_location_for_tenant(self.tenant_id, store_name, routing_code, false)
            .await
    }

    pub async fn seed_location_for_tenant(
        &self,
        tenant_id: Uuid,
        store_name: &str,
        routing_code: Option<&str>,
        active: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        location::ActiveModel {
            id: Set(id),
            tenant_id: Set(tenant_id),
            store_name: Set(store_name.to_string()),
            routing_code: Set(routing_code.map(str::to_string)),
            active: Set(active),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("seed location");
        id
    }

    /// Creates a user working out of the given store and returns their
    /// request-scoped identity.
    pub async fn seed_employee(&self, name: &str, location_id: Option<Uuid>) -> AuthUser {
        let user_id = Uuid::new_v4();

        if let Some(location_id) = location_id {
            location_assignment::ActiveModel {
                user_id: Set(user_id),
                tenant_id: Set(self.tenant_id),
                location_id: Set(location_id),
                created_at: Set(Utc::now()),
            }
            .insert(&*self.db)
            .await
            .expect("seed location assignment");
        }

        AuthUser {
            user_id,
            tenant_id: self.tenant_id,
            name: Some(name.to_string()),
            email: None,
            roles: vec!["employee".to_string()],
            token_id: Uuid::new_v4().to_string(),
        }
    }
}
