// src/middleware/rbac.rs
//
// Guardiões por papel, checados antes do handler. O núcleo re-verifica tudo
// (inclusive a posse da entidade); aqui é só o corte grosso por papel.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, domain::Actor, middleware::auth::AuthenticatedUser};

/// 1. O Trait que define um requisito de papel
pub trait RoleRequirement: Send + Sync + 'static {
    fn check(actor: &Actor) -> Result<(), AppError>;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T> {
    pub actor: Actor,
    _requirement: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        // B. Verifica o papel
        let actor = user.actor();
        T::check(&actor)?;

        Ok(RequireRole {
            actor,
            _requirement: PhantomData,
        })
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

pub struct ConsumerRole;
impl RoleRequirement for ConsumerRole {
    fn check(actor: &Actor) -> Result<(), AppError> {
        actor.require_consumer()
    }
}

/// OWNER, MANAGER ou SALES com fornecedor
pub struct StaffRole;
impl RoleRequirement for StaffRole {
    fn check(actor: &Actor) -> Result<(), AppError> {
        actor.require_staff().map(|_| ())
    }
}

/// OWNER ou MANAGER com fornecedor
pub struct AdminRole;
impl RoleRequirement for AdminRole {
    fn check(actor: &Actor) -> Result<(), AppError> {
        actor.require_admin().map(|_| ())
    }
}
