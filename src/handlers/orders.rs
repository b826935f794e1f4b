// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminRole, ConsumerRole, RequireRole},
    },
    models::order::{
        CreateOrderPayload, OrderDetail, OrderListQuery, OrderView, UpdateOrderStatusPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado (PENDING)", body = OrderView),
        (status = 400, description = "Itens inválidos"),
        (status = 403, description = "Sem vínculo aprovado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    guard: RequireRole<ConsumerRole>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let outcome = app_state.order_service.create_order(&guard.actor, payload).await?;
    let order = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses((status = 200, description = "Pedidos visíveis ao usuário", body = [OrderView])),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let orders = app_state
        .order_service
        .list_orders(&user.actor(), query.status)
        .await?;
    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Detalhe do pedido", body = OrderDetail),
        (status = 403, description = "Pedido de outro usuário ou fornecedor"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = app_state.order_service.get_order(&user.actor(), id).await?;
    Ok(Json(order))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "Orders",
    request_body = UpdateOrderStatusPayload,
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status atualizado", body = OrderView),
        (status = 409, description = "Transição inválida ou estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<OrderView>, AppError> {
    let outcome = app_state
        .order_service
        .update_status(&guard.actor, id, payload.status)
        .await?;
    Ok(Json(app_state.finish(outcome).await))
}
