use axum::{extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthUser, ROLE_EMPLOYEE};
use crate::entities::location;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationSummary {
    pub id: Uuid,
    pub store_name: String,
    /// Whether the store is linked to the external ledger and can take part
    /// in transfers
    pub linked: bool,
}

impl From<location::Model> for LocationSummary {
    fn from(model: location::Model) -> Self {
        let linked = model
            .routing_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .is_some();
        Self {
            id: model.id,
            store_name: model.store_name,
            linked,
        }
    }
}

/// Active stores for the caller's tenant, for picking a sender location.
pub async fn list_locations(
    State(state): State<AppState>,
    ctx: AuthUser,
) -> ApiResult<Vec<LocationSummary>> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let locations = state.services.locations.list_active(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(LocationSummary::from).collect(),
    )))
}
