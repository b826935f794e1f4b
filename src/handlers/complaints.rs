// src/handlers/complaints.rs

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
        rbac::{ConsumerRole, RequireRole},
    },
    models::complaint::{
        Complaint, ComplaintDetail, ComplaintListQuery, CreateComplaintPayload,
        UpdateComplaintPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/orders/{id}/complaint",
    tag = "Complaints",
    request_body = CreateComplaintPayload,
    params(("id" = i64, Path, description = "ID do pedido")),
    responses(
        (status = 201, description = "Reclamação aberta", body = Complaint),
        (status = 409, description = "Já existe reclamação em aberto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_complaint(
    State(app_state): State<AppState>,
    guard: RequireRole<ConsumerRole>,
    Path(order_id): Path<i64>,
    Json(payload): Json<CreateComplaintPayload>,
) -> Result<(StatusCode, Json<Complaint>), AppError> {
    let outcome = app_state
        .complaint_service
        .create_complaint(&guard.actor, order_id, payload)
        .await?;
    let complaint = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(complaint)))
}

#[utoipa::path(
    get,
    path = "/api/complaints",
    tag = "Complaints",
    params(ComplaintListQuery),
    responses((status = 200, description = "Reclamações visíveis ao usuário", body = [ComplaintDetail])),
    security(("api_jwt" = []))
)]
pub async fn list_complaints(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ComplaintListQuery>,
) -> Result<Json<Vec<ComplaintDetail>>, AppError> {
    let complaints = app_state
        .complaint_service
        .list_complaints(&user.actor(), query.status)
        .await?;
    Ok(Json(complaints))
}

#[utoipa::path(
    put,
    path = "/api/complaints/{id}",
    tag = "Complaints",
    request_body = UpdateComplaintPayload,
    params(("id" = i64, Path, description = "ID da reclamação")),
    responses(
        (status = 200, description = "Reclamação atualizada", body = ComplaintDetail),
        (status = 403, description = "Sem permissão para esta ação"),
        (status = 409, description = "Reclamação já resolvida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_complaint(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateComplaintPayload>,
) -> Result<Json<ComplaintDetail>, AppError> {
    let outcome = app_state
        .complaint_service
        .update_complaint(&user.actor(), id, payload)
        .await?;
    Ok(Json(app_state.finish(outcome).await))
}
