use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::entities::{location, stock_transfer_order};
use crate::errors::ServiceError;
use crate::workflow::TransferStatus;

/// Statuses that count as "active" for the duplicate-request invariant.
const ACTIVE_STATUSES: [TransferStatus; 3] = [
    TransferStatus::Pending,
    TransferStatus::Accepted,
    TransferStatus::Shipped,
];

/// Everything needed to open a new transfer request.
#[derive(Debug, Clone)]
pub struct NewStockOrder {
    pub tenant_id: Uuid,
    pub requester_id: Uuid,
    pub requester_location_id: Uuid,
    pub sender_location_id: Uuid,
    pub item_code: String,
    pub style_code: Option<String>,
}

/// Field updates accompanying a status transition. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct TransitionChanges {
    pub shipment_ref: Option<String>,
    pub remarks: Option<String>,
}

/// Durable store for transfer orders. Owns tenant isolation, the
/// duplicate-request invariant and the atomic conditional transition write.
#[derive(Clone)]
pub struct StockOrderService {
    db: Arc<DatabaseConnection>,
}

impl StockOrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a Pending order after enforcing the creation invariants:
    /// no self-transfer, a usable sender location, and no other active
    /// request for the same (requester, item, sender location) triple.
    #[instrument(skip(self, order), fields(
        tenant_id = %order.tenant_id,
        requester_id = %order.requester_id,
        item_code = %order.item_code,
    ))]
    pub async fn create(
        &self,
        order: NewStockOrder,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        if order.sender_location_id == order.requester_location_id {
            return Err(ServiceError::SelfTransfer);
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::db_error(e)
        })?;

        let sender = location::Entity::find_by_id(order.sender_location_id)
            .filter(location::Column::TenantId.eq(order.tenant_id))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let Some(sender) = sender else {
            return Err(ServiceError::InvalidLocation(
                "The sender location does not exist".to_string(),
            ));
        };

        let usable = sender.active
            && sender
                .routing_code
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .is_some();
        if !usable {
            return Err(ServiceError::InvalidLocation(format!(
                "Store '{}' is not available for transfers",
                sender.store_name
            )));
        }

        let active_duplicates = stock_transfer_order::Entity::find()
            .filter(stock_transfer_order::Column::TenantId.eq(order.tenant_id))
            .filter(stock_transfer_order::Column::RequesterId.eq(order.requester_id))
            .filter(stock_transfer_order::Column::ItemCode.eq(order.item_code.clone()))
            .filter(stock_transfer_order::Column::SenderLocationId.eq(order.sender_location_id))
            .filter(stock_transfer_order::Column::Status.is_in(ACTIVE_STATUSES))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        if active_duplicates > 0 {
            return Err(ServiceError::DuplicateActiveRequest);
        }

        let now = Utc::now();
        let created = stock_transfer_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(order.tenant_id),
            requester_id: Set(order.requester_id),
            requester_location_id: Set(order.requester_location_id),
            sender_location_id: Set(order.sender_location_id),
            item_code: Set(order.item_code),
            style_code: Set(order.style_code),
            status: Set(TransferStatus::Pending),
            shipment_ref: Set(None),
            remarks: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to insert stock transfer order: {}", e);
            ServiceError::db_error(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit order creation: {}", e);
            ServiceError::db_error(e)
        })?;

        info!(order_id = %created.id, "stock transfer order created");
        Ok(created)
    }

    /// Fetches one order, tenant-scoped.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id))]
    pub async fn find(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let db = &*self.db;

        stock_transfer_order::Entity::find_by_id(order_id)
            .filter(stock_transfer_order::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(|e| {
                error!("Failed to fetch order {}: {}", order_id, e);
                ServiceError::db_error(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Applies a status transition as one conditional UPDATE.
    ///
    /// The write succeeds only if the row's status still equals `expected`
    /// at write time; of two racing actors, at most one matches. Zero rows
    /// affected is disambiguated by re-reading: gone row vs lost race.
    #[instrument(skip(self, changes), fields(
        tenant_id = %tenant_id,
        order_id = %order_id,
        expected = %expected,
        next = %next,
    ))]
    pub async fn apply_transition(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        expected: TransferStatus,
        next: TransferStatus,
        changes: TransitionChanges,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let db = &*self.db;

        let mut updates = stock_transfer_order::ActiveModel {
            status: Set(next),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        if let Some(shipment_ref) = changes.shipment_ref {
            updates.shipment_ref = Set(Some(shipment_ref));
        }
        if let Some(remarks) = changes.remarks {
            updates.remarks = Set(Some(remarks));
        }

        let result = stock_transfer_order::Entity::update_many()
            .set(updates)
            .filter(stock_transfer_order::Column::Id.eq(order_id))
            .filter(stock_transfer_order::Column::TenantId.eq(tenant_id))
            .filter(stock_transfer_order::Column::Status.eq(expected))
            .exec(db)
            .await
            .map_err(|e| {
                error!("Failed to apply transition on order {}: {}", order_id, e);
                ServiceError::db_error(e)
            })?;

        if result.rows_affected == 0 {
            let current = stock_transfer_order::Entity::find_by_id(order_id)
                .filter(stock_transfer_order::Column::TenantId.eq(tenant_id))
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;

            return match current {
                None => Err(ServiceError::NotFound(format!(
                    "Order {} not found",
                    order_id
                ))),
                Some(order) => Err(ServiceError::InvalidTransition(format!(
                    "Order is no longer {}; it is now {}",
                    expected, order.status
                ))),
            };
        }

        info!(
            "order {} transitioned from '{}' to '{}'",
            order_id, expected, next
        );

        self.find(tenant_id, order_id).await
    }

    /// Open requests addressed to a location (its fulfillment queue),
    /// newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, sender_location_id = %sender_location_id))]
    pub async fn list_incoming(
        &self,
        tenant_id: Uuid,
        sender_location_id: Uuid,
    ) -> Result<Vec<stock_transfer_order::Model>, ServiceError> {
        let db = &*self.db;

        stock_transfer_order::Entity::find()
            .filter(stock_transfer_order::Column::TenantId.eq(tenant_id))
            .filter(stock_transfer_order::Column::SenderLocationId.eq(sender_location_id))
            .filter(stock_transfer_order::Column::Status.is_in([
                TransferStatus::Pending,
                TransferStatus::Accepted,
            ]))
            .order_by_desc(stock_transfer_order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// All of a requester's orders, newest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, requester_id = %requester_id))]
    pub async fn list_outgoing(
        &self,
        tenant_id: Uuid,
        requester_id: Uuid,
    ) -> Result<Vec<stock_transfer_order::Model>, ServiceError> {
        let db = &*self.db;

        stock_transfer_order::Entity::find()
            .filter(stock_transfer_order::Column::TenantId.eq(tenant_id))
            .filter(stock_transfer_order::Column::RequesterId.eq(requester_id))
            .order_by_desc(stock_transfer_order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
