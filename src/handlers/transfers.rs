use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, ROLE_EMPLOYEE};
use crate::entities::stock_transfer_order;
use crate::errors::ServiceError;
use crate::services::transfers::CreateTransferRequest;
use crate::workflow::{ActionPayload, TransferAction, TransferStatus};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransferBody {
    /// Location holding the requested item
    pub sender_location_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Item code cannot be empty"))]
    pub item_code: String,
    /// Optional secondary descriptor (style code)
    pub style_code: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct RejectTransferBody {
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShipTransferBody {
    #[validate(length(min = 1, max = 100, message = "Shipment reference cannot be empty"))]
    pub shipment_ref: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferSummary {
    pub id: Uuid,
    pub item_code: String,
    pub style_code: Option<String>,
    pub status: TransferStatus,
    pub requester_id: Uuid,
    pub requester_location_id: Uuid,
    pub sender_location_id: Uuid,
    pub shipment_ref: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<stock_transfer_order::Model> for TransferSummary {
    fn from(model: stock_transfer_order::Model) -> Self {
        Self {
            id: model.id,
            item_code: model.item_code,
            style_code: model.style_code,
            status: model.status,
            requester_id: model.requester_id,
            requester_location_id: model.requester_location_id,
            sender_location_id: model.sender_location_id,
            shipment_ref: model.shipment_ref,
            remarks: model.remarks,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn create_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Json(payload): Json<CreateTransferBody>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let order = state
        .services
        .transfers
        .create_request(
            &ctx,
            CreateTransferRequest {
                sender_location_id: payload.sender_location_id,
                item_code: payload.item_code,
                style_code: payload.style_code,
            },
        )
        .await?;

    let message = format!("Stock request for {} created successfully", order.item_code);
    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        message,
    )))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let order = state.services.transfers.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(TransferSummary::from(order))))
}

pub async fn list_incoming_transfers(
    State(state): State<AppState>,
    ctx: AuthUser,
) -> ApiResult<Vec<TransferSummary>> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let orders = state.services.transfers.list_incoming(&ctx).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(TransferSummary::from).collect(),
    )))
}

pub async fn list_outgoing_transfers(
    State(state): State<AppState>,
    ctx: AuthUser,
) -> ApiResult<Vec<TransferSummary>> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let orders = state.services.transfers.list_outgoing(&ctx).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(TransferSummary::from).collect(),
    )))
}

pub async fn accept_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let order = state
        .services
        .transfers
        .act(&ctx, id, TransferAction::Accept, ActionPayload::default())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        "Order accepted".to_string(),
    )))
}

pub async fn reject_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<RejectTransferBody>>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;
    let body = payload.map(|Json(body)| body).unwrap_or_default();

    let order = state
        .services
        .transfers
        .act(
            &ctx,
            id,
            TransferAction::Reject,
            ActionPayload {
                shipment_ref: None,
                remarks: body.remarks,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        "Order rejected".to_string(),
    )))
}

pub async fn ship_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShipTransferBody>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let order = state
        .services
        .transfers
        .act(
            &ctx,
            id,
            TransferAction::Ship,
            ActionPayload {
                shipment_ref: Some(payload.shipment_ref),
                remarks: payload.remarks,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        "Order marked as shipped".to_string(),
    )))
}

pub async fn receive_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let order = state
        .services
        .transfers
        .act(&ctx, id, TransferAction::Receive, ActionPayload::default())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        "Order receipt confirmed. Transfer complete".to_string(),
    )))
}

pub async fn cancel_transfer(
    State(state): State<AppState>,
    ctx: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferSummary> {
    ctx.require_role(ROLE_EMPLOYEE)?;

    let order = state
        .services
        .transfers
        .act(&ctx, id, TransferAction::Cancel, ActionPayload::default())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        TransferSummary::from(order),
        "Request cancelled".to_string(),
    )))
}
