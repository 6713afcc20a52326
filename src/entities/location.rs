use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// An internal store, mapped to an external inventory-ledger routing code.
///
/// A location with no routing code exists but is unusable for transfers;
/// callers must be able to tell that apart from "no location at all".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Store name must be between 1 and 100 characters"
    ))]
    pub store_name: String,

    /// External ledger routing identifier; None means the store is not yet
    /// linked and cannot take part in transfers.
    pub routing_code: Option<String>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::location_assignment::Entity")]
    LocationAssignments,
}

impl Related<super::location_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
