// src/services/order_service.rs

use std::{collections::HashMap, sync::Arc};

use validator::Validate;

use crate::{
    common::error::AppError,
    db::{OrderFilter, Store, StoreTx},
    domain::{
        can_transition,
        pricing::{order_total, price_order_lines},
        stock_policy::{demand_by_product, settle_stock, verify_availability, StockOutcome},
        Actor, AuditAction, AuditEvent, EntityType, Outcome, Transition,
    },
    models::{
        catalog::index_by_id,
        link::LinkStatus,
        order::{
            CreateOrderPayload, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem,
            OrderItemDetail, OrderStatus, OrderView,
        },
    },
    services::user_summary,
};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_order(
        &self,
        actor: &Actor,
        payload: CreateOrderPayload,
    ) -> Result<Outcome<OrderView>, AppError> {
        actor.require_consumer()?;
        payload.validate()?;

        let mut tx = self.store.begin().await?;

        // 1. Vínculo aprovado com o fornecedor
        let link = tx.find_link_by_pair(payload.supplier_id, actor.user_id).await?;
        if !link.is_some_and(|l| l.status == LinkStatus::Approved) {
            return Err(AppError::Forbidden(
                "É necessário um vínculo aprovado para fazer pedidos a este fornecedor.".into(),
            ));
        }

        // 2. Valida todas as linhas antes de escrever qualquer coisa
        let product_ids: Vec<i64> = payload.items.iter().map(|line| line.product_id).collect();
        let catalog = tx.find_products(&product_ids).await?;
        let priced = price_order_lines(payload.supplier_id, &payload.items, &catalog)?;

        // 3. Cabeçalho + itens (retrato do preço atual)
        let order = tx
            .insert_order(NewOrder {
                supplier_id: payload.supplier_id,
                consumer_id: actor.user_id,
                created_by_user_id: actor.user_id,
            })
            .await?;

        let items = tx
            .insert_order_items(
                priced
                    .into_iter()
                    .map(|line| NewOrderItem {
                        order_id: order.id,
                        product_id: line.product_id,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        subtotal: line.subtotal,
                    })
                    .collect(),
            )
            .await?;

        tx.commit().await?;

        let view = order_view(order, items)?;
        tracing::info!(
            "🧾 Pedido {} criado por {} para o fornecedor {} (total {}).",
            view.order.id,
            actor.user_id,
            view.order.supplier_id,
            view.total_amount
        );

        let event = AuditEvent::new(
            actor.user_id,
            AuditAction::OrderCreated,
            EntityType::Order,
            view.order.id,
        );
        Ok(Outcome::single(view, event))
    }

    /// Consumidor vê os próprios pedidos; staff vê os do seu fornecedor.
    pub async fn list_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>, AppError> {
        let filter = if actor.is_consumer() {
            OrderFilter {
                consumer_id: Some(actor.user_id),
                status,
                ..Default::default()
            }
        } else {
            OrderFilter {
                supplier_id: Some(actor.require_staff()?),
                status,
                ..Default::default()
            }
        };

        let mut tx = self.store.begin().await?;
        let orders = tx.list_orders(filter).await?;
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = tx.list_order_items(&order_ids).await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                order_view(order, items)
            })
            .collect()
    }

    pub async fn get_order(&self, actor: &Actor, order_id: i64) -> Result<OrderDetail, AppError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", order_id))?;
        ensure_can_read(actor, &order)?;

        let items = tx.list_order_items(&[order.id]).await?;
        let total_amount = order_total(&items)?;

        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        let mut products = index_by_id(tx.find_products(&product_ids).await?);
        let items: Vec<OrderItemDetail> = items
            .into_iter()
            .map(|item| OrderItemDetail {
                product: products.remove(&item.product_id),
                item,
            })
            .collect();

        let supplier = tx.find_supplier(order.supplier_id).await?;
        let consumer = user_summary(&mut *tx, Some(order.consumer_id)).await?;
        let has_complaint = tx.order_has_complaint(order.id).await?;

        Ok(OrderDetail {
            order,
            items,
            total_amount,
            supplier,
            consumer,
            has_complaint,
        })
    }

    /// Máquina de estados do pedido. Entrar em ACCEPTED baixa o estoque.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: i64,
        target: OrderStatus,
    ) -> Result<Outcome<OrderView>, AppError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", order_id))?;
        let from = order.status;

        let relationship = actor.relationship(order.consumer_id, order.supplier_id);
        can_transition(
            actor.role,
            Transition::Order { from, to: target },
            relationship,
        )
        .into_result()?;

        let items = tx.list_order_items(&[order.id]).await?;

        let mut events = vec![AuditEvent::new(
            actor.user_id,
            AuditAction::OrderStatusChanged { from, to: target },
            EntityType::Order,
            order.id,
        )];

        if target == OrderStatus::Accepted && from != OrderStatus::Accepted {
            let removed = apply_stock_decrement(&mut *tx, &items).await?;
            events.extend(removed.into_iter().map(|product_id| {
                AuditEvent::new(
                    actor.user_id,
                    AuditAction::ProductRemovedOutOfStock,
                    EntityType::Product,
                    product_id,
                )
            }));
        }

        let order = tx.update_order_status(order.id, target).await?;
        tx.commit().await?;

        tracing::info!(
            "🧾 Pedido {}: {} -> {} (por {}).",
            order.id,
            from,
            target,
            actor.user_id
        );

        Ok(Outcome::new(order_view(order, items)?, events))
    }
}

fn order_view(order: Order, items: Vec<OrderItem>) -> Result<OrderView, AppError> {
    let total_amount = order_total(&items)?;
    Ok(OrderView { order, items, total_amount })
}

fn ensure_can_read(actor: &Actor, order: &Order) -> Result<(), AppError> {
    if actor.is_consumer() {
        if order.consumer_id != actor.user_id {
            return Err(AppError::Forbidden("Você só pode ver os seus pedidos.".into()));
        }
        return Ok(());
    }
    if actor.staff_supplier() != Some(order.supplier_id) {
        return Err(AppError::Forbidden(
            "Você só pode ver pedidos do seu fornecedor.".into(),
        ));
    }
    Ok(())
}

/// Trava os produtos, revalida TODO o estoque e só então baixa.
/// Devolve os produtos removidos do catálogo por estoque zerado.
async fn apply_stock_decrement(
    tx: &mut dyn StoreTx,
    items: &[OrderItem],
) -> Result<Vec<i64>, AppError> {
    let demand = demand_by_product(items.iter().map(|i| (i.product_id, i.quantity)));
    let product_ids: Vec<i64> = demand.keys().copied().collect();

    let products = index_by_id(tx.lock_products(&product_ids).await?);
    verify_availability(&demand, &products)?;

    let mut removed = Vec::new();
    for (product_id, ordered) in &demand {
        let Some(product) = products.get(product_id) else {
            continue;
        };
        match settle_stock(product.stock_quantity, *ordered) {
            StockOutcome::Remaining(stock) => {
                tx.set_product_stock(*product_id, stock).await?;
            }
            StockOutcome::RemoveFromCatalog => {
                tx.delete_product(*product_id).await?;
                tracing::info!("📦 Produto {} saiu do catálogo (estoque zerado).", product_id);
                removed.push(*product_id);
            }
        }
    }
    Ok(removed)
}
