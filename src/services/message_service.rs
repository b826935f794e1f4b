// src/services/message_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::error::AppError,
    db::{Store, StoreTx},
    domain::Actor,
    models::{
        link::Link,
        message::{MessageView, NewMessage, SendMessagePayload},
    },
    services::user_summary,
};

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_messages(
        &self,
        actor: &Actor,
        link_id: i64,
    ) -> Result<Vec<MessageView>, AppError> {
        let mut tx = self.store.begin().await?;
        let link = accessible_link(&mut *tx, actor, link_id).await?;

        let messages = tx.list_messages(link.id).await?;
        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            let sender = user_summary(&mut *tx, Some(message.sender_id)).await?;
            views.push(MessageView { message, sender });
        }
        Ok(views)
    }

    pub async fn send_message(
        &self,
        actor: &Actor,
        link_id: i64,
        payload: SendMessagePayload,
    ) -> Result<MessageView, AppError> {
        payload.validate()?;
        if payload.content.trim().is_empty() {
            return Err(AppError::ValidationFailed("A mensagem não pode ser vazia.".into()));
        }

        let mut tx = self.store.begin().await?;
        let link = accessible_link(&mut *tx, actor, link_id).await?;

        let message = tx
            .insert_message(NewMessage {
                link_id: link.id,
                sender_id: actor.user_id,
                content: payload.content,
            })
            .await?;
        let sender = user_summary(&mut *tx, Some(actor.user_id)).await?;
        tx.commit().await?;

        tracing::debug!("💬 Mensagem {} enviada no link {}.", message.id, link.id);
        Ok(MessageView { message, sender })
    }
}

// O status do vínculo não é verificado: só quem são as pontas
async fn accessible_link(
    tx: &mut dyn StoreTx,
    actor: &Actor,
    link_id: i64,
) -> Result<Link, AppError> {
    let link = tx
        .find_link(link_id)
        .await?
        .ok_or_else(|| AppError::not_found("Vínculo", link_id))?;

    let allowed = if actor.is_consumer() {
        link.consumer_id == actor.user_id
    } else {
        actor.staff_supplier() == Some(link.supplier_id)
    };

    if !allowed {
        return Err(AppError::Forbidden(
            "Você não participa deste vínculo.".into(),
        ));
    }
    Ok(link)
}
