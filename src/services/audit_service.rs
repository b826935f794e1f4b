// src/services/audit_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::Store,
    domain::{AuditEvent, EntityType},
    models::audit::AuditLog,
};

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn Store>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Grava os eventos numa transação própria, depois do commit da operação principal.
    pub async fn record(&self, events: &[AuditEvent]) -> Result<(), AppError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.store.begin().await?;
        for event in events {
            tx.insert_audit_log(
                event.user_id,
                &event.action.to_string(),
                event.entity_type.as_str(),
                event.entity_id,
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!("{} evento(s) de auditoria gravado(s).", events.len());
        Ok(())
    }

    /// Histórico de uma entidade, do mais antigo para o mais novo.
    pub async fn history(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.list_audit_logs(entity_type.as_str(), entity_id).await
    }
}
