// src/handlers/messages.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::message::{MessageView, SendMessagePayload},
};

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    tag = "Messages",
    params(("id" = i64, Path, description = "ID do vínculo")),
    responses(
        (status = 200, description = "Mensagens do vínculo (mais antigas primeiro)", body = [MessageView]),
        (status = 403, description = "Usuário não participa do vínculo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(link_id): Path<i64>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let messages = app_state
        .message_service
        .list_messages(&user.actor(), link_id)
        .await?;
    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/messages/{id}",
    tag = "Messages",
    request_body = SendMessagePayload,
    params(("id" = i64, Path, description = "ID do vínculo")),
    responses(
        (status = 201, description = "Mensagem enviada", body = MessageView),
        (status = 400, description = "Mensagem vazia")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(link_id): Path<i64>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let message = app_state
        .message_service
        .send_message(&user.actor(), link_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
