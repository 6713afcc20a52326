use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::entities::{location, location_assignment};
use crate::errors::ServiceError;

/// Outcome of resolving an actor's home location.
///
/// "No assignment" and "assigned but unusable" carry different remediation
/// messages, so they are distinct values rather than one error.
#[derive(Debug, Clone)]
pub enum HomeLocation {
    Linked {
        location_id: Uuid,
        routing_code: String,
        store_name: String,
    },
    NoLocationAssigned,
    LocationUnusable {
        store_name: String,
    },
}

impl HomeLocation {
    pub fn location_id(&self) -> Option<Uuid> {
        match self {
            HomeLocation::Linked { location_id, .. } => Some(*location_id),
            _ => None,
        }
    }
}

/// Maps actors to the location identifier every authorization guard runs
/// against, and validates locations referenced by orders.
#[derive(Clone)]
pub struct LocationDirectoryService {
    db: Arc<DatabaseConnection>,
}

impl LocationDirectoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves the location an actor works out of.
    ///
    /// Unhappy outcomes are values, not errors: only persistence failures
    /// surface as `Err`.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id))]
    pub async fn resolve_home_location(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<HomeLocation, ServiceError> {
        let db = &*self.db;

        let assignment = location_assignment::Entity::find_by_id(user_id)
            .filter(location_assignment::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(|e| {
                error!("Failed to load location assignment for {}: {}", user_id, e);
                ServiceError::db_error(e)
            })?;

        let Some(assignment) = assignment else {
            return Ok(HomeLocation::NoLocationAssigned);
        };

        let store = location::Entity::find_by_id(assignment.location_id)
            .filter(location::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(|e| {
                error!(
                    "Failed to load location {} for {}: {}",
                    assignment.location_id, user_id, e
                );
                ServiceError::db_error(e)
            })?;

        // A dangling assignment behaves like no assignment at all; the store
        // record is gone, so there is nothing to remediate on it.
        let Some(store) = store else {
            return Ok(HomeLocation::NoLocationAssigned);
        };

        if !store.active {
            return Ok(HomeLocation::LocationUnusable {
                store_name: store.store_name,
            });
        }

        match store
            .routing_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => Ok(HomeLocation::Linked {
                location_id: store.id,
                routing_code: code.to_string(),
                store_name: store.store_name,
            }),
            None => Ok(HomeLocation::LocationUnusable {
                store_name: store.store_name,
            }),
        }
    }

    /// True when the location exists, is active and belongs to the tenant.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, location_id = %location_id))]
    pub async fn validate_location(
        &self,
        tenant_id: Uuid,
        location_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db;

        let store = location::Entity::find_by_id(location_id)
            .filter(location::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(store.map(|s| s.active).unwrap_or(false))
    }

    /// Fetches one location, tenant-scoped.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, location_id = %location_id))]
    pub async fn get_location(
        &self,
        tenant_id: Uuid,
        location_id: Uuid,
    ) -> Result<location::Model, ServiceError> {
        let db = &*self.db;

        location::Entity::find_by_id(location_id)
            .filter(location::Column::TenantId.eq(tenant_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))
    }

    /// Active locations for a tenant, for the create-request form.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<location::Model>, ServiceError> {
        let db = &*self.db;

        location::Entity::find()
            .filter(location::Column::TenantId.eq(tenant_id))
            .filter(location::Column::Active.eq(true))
            .order_by_asc(location::Column::StoreName)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
