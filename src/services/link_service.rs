// src/services/link_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{LinkFilter, Store, StoreTx},
    domain::{can_transition, Actor, AuditAction, AuditEvent, EntityType, Outcome, Transition},
    models::{
        link::{Link, LinkDetail, LinkStatus},
        supplier::Supplier,
    },
    services::user_summary,
};

#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn Store>,
}

impl LinkService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fornecedores ativos, para o consumidor procurar e pedir vínculo.
    pub async fn list_suppliers(&self, actor: &Actor) -> Result<Vec<Supplier>, AppError> {
        actor.require_consumer()?;
        let mut tx = self.store.begin().await?;
        tx.list_active_suppliers().await
    }

    pub async fn request_link(
        &self,
        actor: &Actor,
        supplier_id: i64,
    ) -> Result<Outcome<Link>, AppError> {
        actor.require_consumer()?;

        let mut tx = self.store.begin().await?;

        let supplier = tx
            .find_supplier(supplier_id)
            .await?
            .ok_or_else(|| AppError::not_found("Fornecedor", supplier_id))?;

        if !supplier.is_active {
            return Err(AppError::ValidationFailed("O fornecedor não está ativo.".into()));
        }

        if let Some(existing) = tx.find_link_by_pair(supplier_id, actor.user_id).await? {
            return Err(AppError::Conflict(format!(
                "Já existe um vínculo com este fornecedor (status: {}).",
                existing.status
            )));
        }

        let link = tx.insert_link(supplier_id, actor.user_id).await?;
        tx.commit().await?;

        tracing::info!(
            "🔗 Consumidor {} pediu vínculo com o fornecedor {} (link {}).",
            actor.user_id,
            supplier_id,
            link.id
        );

        let event = AuditEvent::new(actor.user_id, AuditAction::LinkRequested, EntityType::Link, link.id);
        Ok(Outcome::single(link, event))
    }

    /// Consumidor vê os seus vínculos com o fornecedor; staff vê os do seu fornecedor com o consumidor.
    pub async fn my_links(&self, actor: &Actor) -> Result<Vec<LinkDetail>, AppError> {
        let filter = if actor.is_consumer() {
            LinkFilter {
                consumer_id: Some(actor.user_id),
                ..Default::default()
            }
        } else {
            LinkFilter {
                supplier_id: Some(actor.require_staff()?),
                ..Default::default()
            }
        };

        let mut tx = self.store.begin().await?;
        let links = tx.list_links(filter).await?;
        detail_links(&mut *tx, links, actor.is_consumer()).await
    }

    pub async fn pending_links(&self, actor: &Actor) -> Result<Vec<LinkDetail>, AppError> {
        let supplier_id = actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let links = tx
            .list_links(LinkFilter {
                supplier_id: Some(supplier_id),
                status: Some(LinkStatus::Pending),
                ..Default::default()
            })
            .await?;
        detail_links(&mut *tx, links, false).await
    }

    pub async fn approve(&self, actor: &Actor, link_id: i64) -> Result<Outcome<Link>, AppError> {
        self.change_status(actor, link_id, LinkStatus::Approved).await
    }

    pub async fn reject(&self, actor: &Actor, link_id: i64) -> Result<Outcome<Link>, AppError> {
        self.change_status(actor, link_id, LinkStatus::Declined).await
    }

    pub async fn block(&self, actor: &Actor, link_id: i64) -> Result<Outcome<Link>, AppError> {
        self.change_status(actor, link_id, LinkStatus::Blocked).await
    }

    async fn change_status(
        &self,
        actor: &Actor,
        link_id: i64,
        target: LinkStatus,
    ) -> Result<Outcome<Link>, AppError> {
        let mut tx = self.store.begin().await?;

        let link = tx
            .lock_link(link_id)
            .await?
            .ok_or_else(|| AppError::not_found("Vínculo", link_id))?;

        let relationship = actor.relationship(link.consumer_id, link.supplier_id);
        can_transition(
            actor.role,
            Transition::Link { from: link.status, to: target },
            relationship,
        )
        .into_result()?;

        let updated = tx.update_link_status(link.id, target).await?;
        tx.commit().await?;

        tracing::info!(
            "🔗 Link {}: {} -> {} (por {}).",
            link.id,
            link.status,
            target,
            actor.user_id
        );

        let action = match target {
            LinkStatus::Approved => AuditAction::LinkApproved,
            LinkStatus::Declined => AuditAction::LinkDeclined,
            _ => AuditAction::LinkBlocked,
        };
        Ok(Outcome::single(
            updated,
            AuditEvent::new(actor.user_id, action, EntityType::Link, link.id),
        ))
    }
}

// Preenche a "outra ponta" de cada vínculo
async fn detail_links(
    tx: &mut dyn StoreTx,
    links: Vec<Link>,
    with_supplier: bool,
) -> Result<Vec<LinkDetail>, AppError> {
    let mut details = Vec::with_capacity(links.len());
    for link in links {
        let (supplier, consumer) = if with_supplier {
            (tx.find_supplier(link.supplier_id).await?, None)
        } else {
            (None, user_summary(tx, Some(link.consumer_id)).await?)
        };
        details.push(LinkDetail { link, supplier, consumer });
    }
    Ok(details)
}
