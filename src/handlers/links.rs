// src/handlers/links.rs

use axum::{
    extract::{Path, State},
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
    models::{
        link::{CreateLinkPayload, Link, LinkDetail},
        supplier::Supplier,
    },
};

#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Links",
    responses((status = 200, description = "Fornecedores ativos", body = [Supplier])),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    guard: RequireRole<ConsumerRole>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = app_state.link_service.list_suppliers(&guard.actor).await?;
    Ok(Json(suppliers))
}

#[utoipa::path(
    post,
    path = "/api/links",
    tag = "Links",
    request_body = CreateLinkPayload,
    responses(
        (status = 201, description = "Pedido de vínculo criado (PENDING)", body = Link),
        (status = 404, description = "Fornecedor não encontrado"),
        (status = 409, description = "Vínculo já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_link(
    State(app_state): State<AppState>,
    guard: RequireRole<ConsumerRole>,
    Json(payload): Json<CreateLinkPayload>,
) -> Result<(StatusCode, Json<Link>), AppError> {
    let outcome = app_state
        .link_service
        .request_link(&guard.actor, payload.supplier_id)
        .await?;
    let link = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    get,
    path = "/api/links/me",
    tag = "Links",
    responses((status = 200, description = "Vínculos do usuário atual", body = [LinkDetail])),
    security(("api_jwt" = []))
)]
pub async fn my_links(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<LinkDetail>>, AppError> {
    let links = app_state.link_service.my_links(&user.actor()).await?;
    Ok(Json(links))
}

#[utoipa::path(
    get,
    path = "/api/links/pending",
    tag = "Links",
    responses((status = 200, description = "Pedidos de vínculo pendentes", body = [LinkDetail])),
    security(("api_jwt" = []))
)]
pub async fn pending_links(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
) -> Result<Json<Vec<LinkDetail>>, AppError> {
    let links = app_state.link_service.pending_links(&guard.actor).await?;
    Ok(Json(links))
}

#[utoipa::path(
    post,
    path = "/api/links/{id}/approve",
    tag = "Links",
    params(("id" = i64, Path, description = "ID do vínculo")),
    responses(
        (status = 200, description = "Vínculo aprovado", body = Link),
        (status = 409, description = "Vínculo não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_link(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, AppError> {
    let outcome = app_state.link_service.approve(&guard.actor, id).await?;
    Ok(Json(app_state.finish(outcome).await))
}

#[utoipa::path(
    post,
    path = "/api/links/{id}/reject",
    tag = "Links",
    params(("id" = i64, Path, description = "ID do vínculo")),
    responses(
        (status = 200, description = "Vínculo recusado", body = Link),
        (status = 409, description = "Vínculo não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_link(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, AppError> {
    let outcome = app_state.link_service.reject(&guard.actor, id).await?;
    Ok(Json(app_state.finish(outcome).await))
}

#[utoipa::path(
    post,
    path = "/api/links/{id}/block",
    tag = "Links",
    params(("id" = i64, Path, description = "ID do vínculo")),
    responses((status = 200, description = "Vínculo bloqueado", body = Link)),
    security(("api_jwt" = []))
)]
pub async fn block_link(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<Json<Link>, AppError> {
    let outcome = app_state.link_service.block(&guard.actor, id).await?;
    Ok(Json(app_state.finish(outcome).await))
}
