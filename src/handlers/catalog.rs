// src/handlers/catalog.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminRole, ConsumerRole, RequireRole, StaffRole},
    models::catalog::{CreateProductPayload, Product, UpdateProductPayload},
};

#[utoipa::path(
    get,
    path = "/api/supplier/products",
    tag = "Catalog",
    responses((status = 200, description = "Catálogo completo do fornecedor", body = [Product])),
    security(("api_jwt" = []))
)]
pub async fn list_own_products(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffRole>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state.catalog_service.list_own_products(&guard.actor).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/supplier/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Campos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let outcome = app_state
        .catalog_service
        .create_product(&guard.actor, payload)
        .await?;
    let product = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/supplier/products/{id}",
    tag = "Catalog",
    request_body = UpdateProductPayload,
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    let outcome = app_state
        .catalog_service
        .update_product(&guard.actor, id, payload)
        .await?;
    Ok(Json(app_state.finish(outcome).await))
}

#[utoipa::path(
    delete,
    path = "/api/supplier/products/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto removido"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let outcome = app_state.catalog_service.delete_product(&guard.actor, id).await?;
    app_state.finish(outcome).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}/products",
    tag = "Catalog",
    params(("id" = i64, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Produtos ativos do fornecedor", body = [Product]),
        (status = 403, description = "Sem vínculo aprovado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_supplier_products(
    State(app_state): State<AppState>,
    guard: RequireRole<ConsumerRole>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state
        .catalog_service
        .list_supplier_products(&guard.actor, id)
        .await?;
    Ok(Json(products))
}
