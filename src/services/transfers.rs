use tracing::{instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::stock_transfer_order;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::locations::{HomeLocation, LocationDirectoryService};
use crate::services::stock_orders::{NewStockOrder, StockOrderService, TransitionChanges};
use crate::workflow::{self, ActionPayload, TransferAction, TransferActor};

/// Caller input for opening a transfer request.
#[derive(Debug, Clone)]
pub struct CreateTransferRequest {
    pub sender_location_id: Uuid,
    pub item_code: String,
    pub style_code: Option<String>,
}

/// The request gateway: one logical, all-or-nothing operation per call.
///
/// Resolves the actor's location, loads the order, runs the workflow engine
/// and persists through the store's conditional write. Any failure before
/// that single write aborts the whole call; partial mutation is never
/// observable.
#[derive(Clone)]
pub struct TransferService {
    orders: StockOrderService,
    locations: LocationDirectoryService,
    event_sender: EventSender,
}

impl TransferService {
    pub fn new(
        orders: StockOrderService,
        locations: LocationDirectoryService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            orders,
            locations,
            event_sender,
        }
    }

    /// Opens a new transfer request on behalf of the actor.
    #[instrument(skip(self, ctx, request), fields(
        tenant_id = %ctx.tenant_id,
        user_id = %ctx.user_id,
        sender_location_id = %request.sender_location_id,
    ))]
    pub async fn create_request(
        &self,
        ctx: &AuthUser,
        request: CreateTransferRequest,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let item_code = request.item_code.trim();
        if item_code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Item code is required".to_string(),
            ));
        }

        let home_location_id = match self
            .locations
            .resolve_home_location(ctx.tenant_id, ctx.user_id)
            .await?
        {
            HomeLocation::Linked { location_id, .. } => location_id,
            HomeLocation::NoLocationAssigned => {
                return Err(ServiceError::InvalidLocation(
                    "Your user is not linked to a store. Please contact an administrator."
                        .to_string(),
                ));
            }
            HomeLocation::LocationUnusable { store_name } => {
                return Err(ServiceError::InvalidLocation(format!(
                    "Your store '{}' is not linked to the inventory ledger. Please contact an administrator.",
                    store_name
                )));
            }
        };

        let order = self
            .orders
            .create(NewStockOrder {
                tenant_id: ctx.tenant_id,
                requester_id: ctx.user_id,
                requester_location_id: home_location_id,
                sender_location_id: request.sender_location_id,
                item_code: item_code.to_string(),
                style_code: request
                    .style_code
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            })
            .await?;

        self.emit(Event::TransferRequested {
            order_id: order.id,
            tenant_id: order.tenant_id,
            requester_id: order.requester_id,
            sender_location_id: order.sender_location_id,
            item_code: order.item_code.clone(),
        })
        .await;

        Ok(order)
    }

    /// Applies one action to one order.
    #[instrument(skip(self, ctx, payload), fields(
        tenant_id = %ctx.tenant_id,
        user_id = %ctx.user_id,
        order_id = %order_id,
        action = %action,
    ))]
    pub async fn act(
        &self,
        ctx: &AuthUser,
        order_id: Uuid,
        action: TransferAction,
        payload: ActionPayload,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let order = self.orders.find(ctx.tenant_id, order_id).await?;

        let home = self
            .locations
            .resolve_home_location(ctx.tenant_id, ctx.user_id)
            .await?;
        let actor = TransferActor {
            actor_id: ctx.user_id,
            location_id: home.location_id(),
        };

        let next = workflow::evaluate(&order, &actor, action, &payload)?;

        let changes = TransitionChanges {
            shipment_ref: match action {
                TransferAction::Ship => payload
                    .shipment_ref
                    .as_deref()
                    .map(str::trim)
                    .map(str::to_string),
                _ => None,
            },
            remarks: compose_remarks(order.remarks.as_deref(), action, payload.remarks.as_deref()),
        };

        let updated = self
            .orders
            .apply_transition(ctx.tenant_id, order_id, order.status, next, changes)
            .await?;

        self.emit(match action {
            TransferAction::Accept => Event::TransferAccepted { order_id },
            TransferAction::Reject => Event::TransferRejected { order_id },
            TransferAction::Ship => Event::TransferShipped {
                order_id,
                shipment_ref: updated.shipment_ref.clone().unwrap_or_default(),
            },
            TransferAction::Receive => Event::TransferReceived { order_id },
            TransferAction::Cancel => Event::TransferCancelled { order_id },
        })
        .await;

        Ok(updated)
    }

    /// Fetches one order, tenant-scoped.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id, order_id = %order_id))]
    pub async fn get(
        &self,
        ctx: &AuthUser,
        order_id: Uuid,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        self.orders.find(ctx.tenant_id, order_id).await
    }

    /// Requests waiting on the caller's location to fulfill.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id, user_id = %ctx.user_id))]
    pub async fn list_incoming(
        &self,
        ctx: &AuthUser,
    ) -> Result<Vec<stock_transfer_order::Model>, ServiceError> {
        match self
            .locations
            .resolve_home_location(ctx.tenant_id, ctx.user_id)
            .await?
        {
            HomeLocation::Linked { location_id, .. } => {
                self.orders.list_incoming(ctx.tenant_id, location_id).await
            }
            HomeLocation::NoLocationAssigned => Err(ServiceError::InvalidLocation(
                "Your user is not linked to a store. Please contact an administrator.".to_string(),
            )),
            HomeLocation::LocationUnusable { store_name } => {
                Err(ServiceError::InvalidLocation(format!(
                    "Your store '{}' is not linked to the inventory ledger. Please contact an administrator.",
                    store_name
                )))
            }
        }
    }

    /// The caller's own requests.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id, user_id = %ctx.user_id))]
    pub async fn list_outgoing(
        &self,
        ctx: &AuthUser,
    ) -> Result<Vec<stock_transfer_order::Model>, ServiceError> {
        self.orders.list_outgoing(ctx.tenant_id, ctx.user_id).await
    }

    /// Events are an audit trail, not part of the contract; a closed
    /// channel must not fail a call whose write already committed.
    async fn emit(&self, event: Event) {
        if let Err(err) = self.event_sender.send(event).await {
            warn!("failed to emit transfer event: {}", err);
        }
    }
}

/// Appends one remarks entry for the action, or returns `None` to leave the
/// column untouched. Entries accumulate one per line; nothing is ever
/// overwritten.
fn compose_remarks(
    existing: Option<&str>,
    action: TransferAction,
    note: Option<&str>,
) -> Option<String> {
    let note = note.map(str::trim).filter(|n| !n.is_empty());

    let entry = match (action, note) {
        (TransferAction::Cancel, None) => "Cancelled by requester".to_string(),
        (_, Some(note)) => format!("{}: {}", action.target(), note),
        (_, None) => return None,
    };

    match existing.map(str::trim).filter(|r| !r.is_empty()) {
        Some(existing) => Some(format!("{}\n{}", existing, entry)),
        None => Some(entry),
    }
}
