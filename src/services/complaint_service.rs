// src/services/complaint_service.rs

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ComplaintFilter, Store, StoreTx},
    domain::{
        can_assign, can_transition, Actor, AuditAction, AuditEvent, EntityType, Outcome,
        Relationship, Transition,
    },
    models::complaint::{
        Complaint, ComplaintDetail, ComplaintStatus, CreateComplaintPayload, NewComplaint,
        UpdateComplaintPayload,
    },
    services::user_summary,
};

#[derive(Clone)]
pub struct ComplaintService {
    store: Arc<dyn Store>,
}

impl ComplaintService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_complaint(
        &self,
        actor: &Actor,
        order_id: i64,
        payload: CreateComplaintPayload,
    ) -> Result<Outcome<Complaint>, AppError> {
        actor.require_consumer()?;
        payload.validate()?;

        let mut tx = self.store.begin().await?;

        let order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", order_id))?;

        if order.consumer_id != actor.user_id {
            return Err(AppError::Forbidden(
                "Você só pode reclamar dos seus próprios pedidos.".into(),
            ));
        }

        if tx.find_unresolved_complaint(order.id).await?.is_some() {
            return Err(AppError::Conflict(
                "Já existe uma reclamação em aberto para este pedido.".into(),
            ));
        }

        let complaint = tx
            .insert_complaint(NewComplaint {
                order_id: order.id,
                raised_by_user_id: actor.user_id,
                description: payload.description,
            })
            .await?;
        tx.commit().await?;

        tracing::info!("📣 Reclamação {} aberta no pedido {}.", complaint.id, order.id);

        let event = AuditEvent::new(
            actor.user_id,
            AuditAction::ComplaintCreated,
            EntityType::Complaint,
            complaint.id,
        );
        Ok(Outcome::single(complaint, event))
    }

    /// Consumidor vê as que abriu; staff vê as dos pedidos do seu fornecedor.
    pub async fn list_complaints(
        &self,
        actor: &Actor,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<ComplaintDetail>, AppError> {
        let filter = if actor.is_consumer() {
            ComplaintFilter {
                raised_by_user_id: Some(actor.user_id),
                status,
                ..Default::default()
            }
        } else {
            ComplaintFilter {
                supplier_id: Some(actor.require_staff()?),
                status,
                ..Default::default()
            }
        };

        let mut tx = self.store.begin().await?;
        let complaints = tx.list_complaints(filter).await?;

        let mut details = Vec::with_capacity(complaints.len());
        for complaint in complaints {
            details.push(complaint_detail(&mut *tx, complaint).await?);
        }
        Ok(details)
    }

    pub async fn update_complaint(
        &self,
        actor: &Actor,
        complaint_id: i64,
        payload: UpdateComplaintPayload,
    ) -> Result<Outcome<ComplaintDetail>, AppError> {
        if payload.status.is_none() && payload.assigned_to_user_id.is_none() {
            return Err(AppError::ValidationFailed(
                "Informe um novo status ou um responsável.".into(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let mut complaint = tx
            .lock_complaint(complaint_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reclamação", complaint_id))?;
        let order = tx
            .find_order(complaint.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", complaint.order_id))?;

        // Consumidor só age sobre o que ele mesmo abriu
        let relationship = if actor.is_consumer() {
            if complaint.raised_by_user_id == actor.user_id {
                Relationship::Party
            } else {
                Relationship::Unrelated
            }
        } else {
            actor.relationship(order.consumer_id, order.supplier_id)
        };

        // 1. Permissões (atribuição primeiro: consumidor nunca atribui, em qualquer status)
        if payload.assigned_to_user_id.is_some() {
            can_assign(actor.role, complaint.status, relationship).into_result()?;
        }
        if let Some(target) = payload.status {
            can_transition(
                actor.role,
                Transition::Complaint { from: complaint.status, to: target },
                relationship,
            )
            .into_result()?;
        }

        // 2. Responsável precisa ser staff do fornecedor do pedido
        if let Some(assignee_id) = payload.assigned_to_user_id {
            let assignee = tx
                .find_user(assignee_id)
                .await?
                .ok_or_else(|| AppError::not_found("Usuário", assignee_id))?;
            if Actor::from(&assignee).staff_supplier() != Some(order.supplier_id) {
                return Err(AppError::ValidationFailed(
                    "O responsável deve ser da equipe do fornecedor do pedido.".into(),
                ));
            }
        }

        // 3. Aplica
        let mut events = Vec::new();
        if let Some(target) = payload.status {
            let from = complaint.status;
            complaint.status = target;
            if target == ComplaintStatus::Resolved && complaint.resolved_at.is_none() {
                complaint.resolved_at = Some(Utc::now());
            }
            events.push(AuditEvent::new(
                actor.user_id,
                AuditAction::ComplaintStatusChanged { from, to: target },
                EntityType::Complaint,
                complaint.id,
            ));
        }
        if let Some(assignee_id) = payload.assigned_to_user_id {
            complaint.assigned_to_user_id = Some(assignee_id);
            events.push(AuditEvent::new(
                actor.user_id,
                AuditAction::ComplaintAssigned,
                EntityType::Complaint,
                complaint.id,
            ));
        }

        let complaint = tx.update_complaint(&complaint).await?;
        let detail = complaint_detail(&mut *tx, complaint).await?;
        tx.commit().await?;

        tracing::info!(
            "📣 Reclamação {} atualizada por {} (status {}).",
            detail.complaint.id,
            actor.user_id,
            detail.complaint.status
        );

        Ok(Outcome::new(detail, events))
    }
}

async fn complaint_detail(
    tx: &mut dyn StoreTx,
    complaint: Complaint,
) -> Result<ComplaintDetail, AppError> {
    let raised_by_user = user_summary(tx, Some(complaint.raised_by_user_id)).await?;
    let assigned_to_user = user_summary(tx, complaint.assigned_to_user_id).await?;
    Ok(ComplaintDetail {
        complaint,
        raised_by_user,
        assigned_to_user,
    })
}
