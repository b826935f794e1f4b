// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminRole, RequireRole},
    },
    models::auth::{
        AuthResponse, LoginUserPayload, MeResponse, RegisterConsumerPayload,
        RegisterStaffPayload, RegisterSupplierPayload, UserSummary,
    },
};

// Handler de registro de fornecedor (cria a empresa + OWNER)
#[utoipa::path(
    post,
    path = "/api/auth/register/supplier",
    tag = "Auth",
    request_body = RegisterSupplierPayload,
    responses(
        (status = 201, description = "Fornecedor e dono criados", body = AuthResponse),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterSupplierPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let outcome = app_state.auth_service.register_supplier(payload).await?;
    let response = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/consumer",
    tag = "Auth",
    request_body = RegisterConsumerPayload,
    responses(
        (status = 201, description = "Consumidor criado", body = AuthResponse),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register_consumer(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterConsumerPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let outcome = app_state.auth_service.register_consumer(payload).await?;
    let response = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(response)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = app_state.auth_service.login(payload).await?;
    Ok(Json(response))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Users",
    responses((status = 200, description = "Perfil do usuário atual", body = MeResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<MeResponse>, AppError> {
    let me = app_state.auth_service.me(&user).await?;
    Ok(Json(me))
}

#[utoipa::path(
    post,
    path = "/api/supplier/staff",
    tag = "Users",
    request_body = RegisterStaffPayload,
    responses(
        (status = 201, description = "Usuário da equipe criado", body = UserSummary),
        (status = 403, description = "Papel sem permissão para cadastrar este usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_staff(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminRole>,
    Json(payload): Json<RegisterStaffPayload>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let outcome = app_state
        .auth_service
        .register_staff(&guard.actor, payload)
        .await?;
    let staff = app_state.finish(outcome).await;
    Ok((StatusCode::CREATED, Json(staff)))
}
