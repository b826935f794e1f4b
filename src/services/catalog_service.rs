// src/services/catalog_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::error::AppError,
    db::Store,
    domain::{Actor, AuditAction, AuditEvent, EntityType, Outcome},
    models::{
        catalog::{CreateProductPayload, NewProduct, Product, UpdateProductPayload},
        link::LinkStatus,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Catálogo completo do próprio fornecedor (ativos e inativos).
    pub async fn list_own_products(&self, actor: &Actor) -> Result<Vec<Product>, AppError> {
        let supplier_id = actor.require_staff()?;
        let mut tx = self.store.begin().await?;
        tx.list_products(supplier_id, false).await
    }

    /// Catálogo visto pelo consumidor: exige vínculo APPROVED e mostra só produtos ativos.
    pub async fn list_supplier_products(
        &self,
        actor: &Actor,
        supplier_id: i64,
    ) -> Result<Vec<Product>, AppError> {
        actor.require_consumer()?;

        let mut tx = self.store.begin().await?;
        let link = tx.find_link_by_pair(supplier_id, actor.user_id).await?;
        if !link.is_some_and(|l| l.status == LinkStatus::Approved) {
            return Err(AppError::Forbidden(
                "É necessário um vínculo aprovado com este fornecedor.".into(),
            ));
        }

        tx.list_products(supplier_id, true).await
    }

    pub async fn create_product(
        &self,
        actor: &Actor,
        payload: CreateProductPayload,
    ) -> Result<Outcome<Product>, AppError> {
        let supplier_id = actor.require_admin()?;
        payload.validate()?;

        let mut tx = self.store.begin().await?;
        let product = tx
            .insert_product(NewProduct {
                supplier_id,
                name: payload.name,
                description: payload.description,
                unit: payload.unit,
                price: payload.price,
                stock_quantity: payload.stock_quantity,
                min_order_quantity: payload.min_order_quantity,
            })
            .await?;
        tx.commit().await?;

        tracing::info!("📦 Produto {} criado no fornecedor {}.", product.id, supplier_id);

        let event = AuditEvent::new(
            actor.user_id,
            AuditAction::ProductCreated,
            EntityType::Product,
            product.id,
        );
        Ok(Outcome::single(product, event))
    }

    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: i64,
        payload: UpdateProductPayload,
    ) -> Result<Outcome<Product>, AppError> {
        let supplier_id = actor.require_admin()?;
        payload.validate()?;

        let mut tx = self.store.begin().await?;
        let mut product = owned_product(tx.find_product(product_id).await?, product_id, supplier_id)?;

        payload.apply_to(&mut product);
        let product = tx.update_product(&product).await?;
        tx.commit().await?;

        tracing::info!("📦 Produto {} atualizado.", product.id);

        let event = AuditEvent::new(
            actor.user_id,
            AuditAction::ProductUpdated,
            EntityType::Product,
            product.id,
        );
        Ok(Outcome::single(product, event))
    }

    pub async fn delete_product(
        &self,
        actor: &Actor,
        product_id: i64,
    ) -> Result<Outcome<()>, AppError> {
        let supplier_id = actor.require_admin()?;

        let mut tx = self.store.begin().await?;
        let product = owned_product(tx.find_product(product_id).await?, product_id, supplier_id)?;
        tx.delete_product(product.id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Produto {} removido do catálogo.", product.id);

        let event = AuditEvent::new(
            actor.user_id,
            AuditAction::ProductDeleted,
            EntityType::Product,
            product.id,
        );
        Ok(Outcome::single((), event))
    }
}

fn owned_product(
    product: Option<Product>,
    product_id: i64,
    supplier_id: i64,
) -> Result<Product, AppError> {
    let product = product.ok_or_else(|| AppError::not_found("Produto", product_id))?;
    if product.supplier_id != supplier_id {
        return Err(AppError::Forbidden(
            "Este produto pertence a outro fornecedor.".into(),
        ));
    }
    Ok(product)
}
