// src/services.rs

use crate::{common::error::AppError, db::StoreTx, models::auth::UserSummary};

pub mod audit_service;
pub use audit_service::AuditService;
pub mod auth;
pub use auth::AuthService;
pub mod catalog_service;
pub use catalog_service::CatalogService;
pub mod complaint_service;
pub use complaint_service::ComplaintService;
pub mod link_service;
pub use link_service::LinkService;
pub mod message_service;
pub use message_service::MessageService;
pub mod order_service;
pub use order_service::OrderService;

// Resolve a versão pública de um usuário referenciado por id
pub(crate) async fn user_summary(
    tx: &mut dyn StoreTx,
    user_id: Option<i64>,
) -> Result<Option<UserSummary>, AppError> {
    match user_id {
        Some(id) => Ok(tx.find_user(id).await?.as_ref().map(UserSummary::from)),
        None => Ok(None),
    }
}
