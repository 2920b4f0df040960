// src/handlers/orders.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::order::{OrderStatus, OrderWithItems, PublicOrder},
    services::order_service::{CreateOrderInput, OrderItemInput},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, serde::Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub menu_item_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade mínima é 1."))]
    #[schema(example = 2)]
    pub quantity: i32,

    #[schema(example = "Sem cebola")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[validate(length(min = 1, message = "É necessário pelo menos um item."), nested)]
    pub items: Vec<OrderItemPayload>,

    #[schema(example = "Ana")]
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[schema(example = "12")]
    pub table_number: Option<String>,
    pub notes: Option<String>,
}

// Edição direta do back office. `assignedStaff`/`staffType` distinguem
// "não enviado" (mantém) de "null" (limpa), por isso o Option duplo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorUpdatePayload {
    pub status: Option<OrderStatus>,

    #[serde(default)]
    pub assigned_staff: Option<Option<Uuid>>,

    #[serde(default)]
    #[schema(example = "grillade")]
    pub staff_type: Option<Option<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub staff_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrackOrderQuery {
    pub restaurant_id: Option<Uuid>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/restaurants/{id}/orders
#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com número YYYYMMDD-NNN", body = OrderWithItems),
        (status = 404, description = "Restaurante ou item de cardápio não encontrado"),
        (status = 503, description = "Alocação de número esgotou os retries")
    ),
    params(("id" = Uuid, Path, description = "ID do Restaurante")),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let input = CreateOrderInput {
        items: payload
            .items
            .into_iter()
            .map(|item| OrderItemInput {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                notes: item.notes,
            })
            .collect(),
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        table_number: payload.table_number,
        notes: payload.notes,
    };

    let order = app_state
        .order_service
        .create_order(restaurant_id, &user, input)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/restaurants/{id}/orders
//
// Visão do back office e do display da cozinha. O display re-consulta
// este endpoint a cada 3s (GET idempotente, uma query indexada e
// limitada por poll) e agrupa por status no cliente.
#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedidos do restaurante, mais recentes primeiro (máx. 100)", body = [OrderWithItems])
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Restaurante"),
        ListOrdersQuery
    ),
    security(("api_jwt" = []))
)]
pub async fn list_restaurant_orders(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderWithItems>>, AppError> {
    let orders = app_state
        .order_service
        .list_for_restaurant(
            restaurant_id,
            &user,
            query.status,
            query.staff_type.as_deref(),
        )
        .await?;

    Ok(Json(orders))
}

// GET /api/restaurants/{id}/orders/{order_id}
#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/orders/{order_id}",
    tag = "Orders",
    responses(
        (status = 200, description = "Detalhe do pedido", body = OrderWithItems),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Restaurante"),
        ("order_id" = Uuid, Path, description = "ID do Pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_restaurant_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((restaurant_id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OrderWithItems>, AppError> {
    let order = app_state
        .order_service
        .get_order_for_restaurant(restaurant_id, order_id, &user)
        .await?;

    Ok(Json(order))
}

// PUT /api/restaurants/{id}/orders/{order_id}
//
// Caminho permissivo do operador: status direto (sem a tabela
// forward-only do staff) e atribuição/especialização independentes.
#[utoipa::path(
    put,
    path = "/api/restaurants/{id}/orders/{order_id}",
    tag = "Orders",
    request_body = OperatorUpdatePayload,
    responses(
        (status = 200, description = "Pedido atualizado", body = OrderWithItems),
        (status = 403, description = "Apenas dono, gerente ou admin"),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Restaurante"),
        ("order_id" = Uuid, Path, description = "ID do Pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_restaurant_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((restaurant_id, order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<OperatorUpdatePayload>,
) -> Result<Json<OrderWithItems>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let order = app_state
        .order_service
        .operator_update(
            restaurant_id,
            order_id,
            &user,
            payload.status,
            payload.assigned_staff,
            payload.staff_type,
        )
        .await?;

    Ok(Json(order))
}

// GET /api/orders/{order_number}
//
// Endpoint público de acompanhamento: o cliente re-consulta a cada 5s.
// A visão pública nunca inclui as anotações internas do pedido.
#[utoipa::path(
    get,
    path = "/api/orders/{order_number}",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedido para acompanhamento do cliente", body = PublicOrder),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("order_number" = String, Path, description = "Número público do pedido (YYYYMMDD-NNN)"),
        TrackOrderQuery
    )
)]
pub async fn track_order(
    State(app_state): State<AppState>,
    Path(order_number): Path<String>,
    Query(query): Query<TrackOrderQuery>,
) -> Result<Json<PublicOrder>, AppError> {
    let order = app_state
        .order_service
        .track_by_number(query.restaurant_id, &order_number)
        .await?;

    Ok(Json(order))
}
