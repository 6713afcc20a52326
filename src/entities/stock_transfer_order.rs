use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::workflow::TransferStatus;

/// A single inter-location stock transfer request.
///
/// Both location references are stable foreign keys; the requester's own
/// location is captured once at creation and never re-resolved.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "stock_transfer_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub requester_id: Uuid,
    pub requester_location_id: Uuid,
    pub sender_location_id: Uuid,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Item code must be between 1 and 100 characters"
    ))]
    pub item_code: String,

    pub style_code: Option<String>,
    pub status: TransferStatus,

    /// Carrier reference, set exactly once when the order is shipped.
    pub shipment_ref: Option<String>,

    /// Append-only log of actor notes, one line per entry.
    pub remarks: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::SenderLocationId",
        to = "super::location::Column::Id"
    )]
    SenderLocation,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::RequesterLocationId",
        to = "super::location::Column::Id"
    )]
    RequesterLocation,
}

impl ActiveModelBehavior for ActiveModel {}
