//! The transfer workflow state machine.
//!
//! Everything here is pure: the engine inspects an order snapshot, an actor
//! and an action, and either names the target status or refuses. Persistence
//! concerns (atomicity, races) live in the stock order store; the engine can
//! be unit-tested without a database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::stock_transfer_order;
use crate::errors::ServiceError;

/// Lifecycle status of a stock transfer order.
///
/// Stored as a string column; `Rejected`, `Cancelled` and `Received` are
/// terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransferStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Received")]
    Received,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Received | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Shipped => "Shipped",
            Self::Received => "Received",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action an actor can take against an existing order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferAction {
    Accept,
    Reject,
    Ship,
    Receive,
    Cancel,
}

/// Which side of the transfer an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorClass {
    /// Staff at the location holding the item (accept/reject/ship)
    Sender,
    /// The user who raised the request (cancel/receive)
    Requester,
}

impl TransferAction {
    /// The single centralized transition table: the one status an action
    /// may be applied from. Re-applying an action always fails because its
    /// own target is never its required prior.
    pub fn required_prior(self) -> TransferStatus {
        match self {
            Self::Accept | Self::Reject | Self::Cancel => TransferStatus::Pending,
            Self::Ship => TransferStatus::Accepted,
            Self::Receive => TransferStatus::Shipped,
        }
    }

    /// Status the order moves to when the action succeeds.
    pub fn target(self) -> TransferStatus {
        match self {
            Self::Accept => TransferStatus::Accepted,
            Self::Reject => TransferStatus::Rejected,
            Self::Ship => TransferStatus::Shipped,
            Self::Receive => TransferStatus::Received,
            Self::Cancel => TransferStatus::Cancelled,
        }
    }

    pub fn actor_class(self) -> ActorClass {
        match self {
            Self::Accept | Self::Reject | Self::Ship => ActorClass::Sender,
            Self::Receive | Self::Cancel => ActorClass::Requester,
        }
    }
}

/// Whether `action` may be applied to an order currently in `from`.
pub fn is_allowed(from: TransferStatus, action: TransferAction) -> bool {
    action.required_prior() == from
}

/// The acting identity, resolved per request: who they are and which
/// location (if any) they work out of.
#[derive(Debug, Clone)]
pub struct TransferActor {
    pub actor_id: Uuid,
    pub location_id: Option<Uuid>,
}

/// Caller-supplied data accompanying an action.
#[derive(Debug, Clone, Default)]
pub struct ActionPayload {
    pub shipment_ref: Option<String>,
    pub remarks: Option<String>,
}

/// Validates one action against one order.
///
/// Guards run in a fixed order and the first failure wins:
/// 1. actor authorization for the action class
/// 2. current-state legality for the requested transition
/// 3. payload completeness
///
/// Returns the target status; never mutates anything.
pub fn evaluate(
    order: &stock_transfer_order::Model,
    actor: &TransferActor,
    action: TransferAction,
    payload: &ActionPayload,
) -> Result<TransferStatus, ServiceError> {
    match action.actor_class() {
        ActorClass::Sender => {
            if actor.location_id != Some(order.sender_location_id) {
                return Err(ServiceError::Forbidden(format!(
                    "Only staff at the sender location may {} this request",
                    action
                )));
            }
        }
        ActorClass::Requester => {
            if actor.actor_id != order.requester_id {
                return Err(ServiceError::Forbidden(format!(
                    "Only the requester may {} this request",
                    action
                )));
            }
        }
    }

    if !is_allowed(order.status, action) {
        return Err(ServiceError::InvalidTransition(format!(
            "Cannot {} an order in status {}",
            action, order.status
        )));
    }

    if action == TransferAction::Ship {
        let has_ref = payload
            .shipment_ref
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_some();
        if !has_ref {
            return Err(ServiceError::ValidationError(
                "Shipment reference is required".to_string(),
            ));
        }
    }

    Ok(action.target())
}
