// src/handlers/staff.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::order::{OrderStatus, OrderWithItems},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

// Claim e/ou transição estrita numa mesma requisição (o claim roda
// primeiro, e um pedido `pending` já sai dele como `preparing`).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffUpdatePayload {
    #[serde(default)]
    #[schema(example = true)]
    pub assign: bool,

    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StaffOrdersQuery {
    pub status: Option<OrderStatus>,

    #[param(example = "drinks")]
    pub staff_type: Option<String>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/staff/orders
//
// A fila do staff: por padrão exclui pedidos `completed` (a fila é "o que
// ainda precisa de ação"). O dashboard refaz esta consulta após cada
// mutação; não há push — o contrato de tempo real é o re-fetch.
#[utoipa::path(
    get,
    path = "/api/staff/orders",
    tag = "Staff",
    responses(
        (status = 200, description = "Fila do staff, mais recentes primeiro (máx. 50)", body = [OrderWithItems])
    ),
    params(StaffOrdersQuery),
    security(("api_jwt" = []))
)]
pub async fn list_staff_orders(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<StaffOrdersQuery>,
) -> Result<Json<Vec<OrderWithItems>>, AppError> {
    let orders = app_state
        .order_service
        .list_for_staff(&user, query.status, query.staff_type.as_deref())
        .await?;

    Ok(Json(orders))
}

// PUT /api/staff/orders/{order_id}
#[utoipa::path(
    put,
    path = "/api/staff/orders/{order_id}",
    tag = "Staff",
    request_body = StaffUpdatePayload,
    responses(
        (status = 200, description = "Pedido atualizado", body = OrderWithItems),
        (status = 400, description = "Transição de status inválida (origem e destino no corpo)"),
        (status = 403, description = "Sem permissão ou workflow desativado"),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já atribuído a outro staff")
    ),
    params(("order_id" = Uuid, Path, description = "ID do Pedido")),
    security(("api_jwt" = []))
)]
pub async fn update_staff_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<StaffUpdatePayload>,
) -> Result<Json<OrderWithItems>, AppError> {
    let order = app_state
        .order_service
        .staff_update(order_id, &user, payload.assign, payload.status)
        .await?;

    Ok(Json(order))
}
