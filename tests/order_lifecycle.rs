//! Ciclo de vida do pedido: criação atômica, retrato de preço, máquina de
//! estados e baixa de estoque na aceitação.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::{order_payload, TestApp};
use rust_decimal_macros::dec;

use foodlink::{
    common::error::AppError,
    db::{Store, StoreTx},
    domain::EntityType,
    services::AuditService,
    models::{
        auth::Role,
        catalog::UpdateProductPayload,
        order::OrderStatus,
    },
};

#[tokio::test]
async fn accepting_an_order_decrements_stock() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;

    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 5)])
        .await;
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec!(39.50));
    // Criar o pedido não mexe no estoque
    assert_eq!(app.stock_of(&supplier.owner, tomato.id).await, Some(10));

    let accepted = app
        .set_order_status(&supplier.owner, order.order.id, OrderStatus::Accepted)
        .await;
    assert_eq!(accepted.order.status, OrderStatus::Accepted);
    assert_eq!(app.stock_of(&supplier.owner, tomato.id).await, Some(5));
}

#[tokio::test]
async fn draining_stock_to_zero_removes_product_and_audits_it() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let basil = app
        .create_product(&supplier.owner, "Manjericão", dec!(3.00), 5, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(basil.id, 5)])
        .await;

    app.set_order_status(&supplier.owner, order.order.id, OrderStatus::Accepted)
        .await;

    assert_eq!(app.stock_of(&supplier.owner, basil.id).await, None);

    let product_history = app
        .state
        .audit_service
        .history(EntityType::Product, basil.id)
        .await
        .unwrap();
    let actions: Vec<&str> = product_history.iter().map(|log| log.action.as_str()).collect();
    assert_eq!(actions, vec!["PRODUCT_CREATED", "PRODUCT_REMOVED_OUT_OF_STOCK"]);

    let order_history = app
        .state
        .audit_service
        .history(EntityType::Order, order.order.id)
        .await
        .unwrap();
    let actions: Vec<&str> = order_history.iter().map(|log| log.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["ORDER_CREATED", "ORDER_STATUS_CHANGED_PENDING_TO_ACCEPTED"]
    );

    // O item do pedido sobrevive à remoção do produto
    let detail = app
        .state
        .order_service
        .get_order(&consumer.actor, order.order.id)
        .await
        .unwrap();
    assert_eq!(detail.items.len(), 1);
    assert!(detail.items[0].product.is_none());
    assert_eq!(detail.total_amount, dec!(15.00));
}

#[tokio::test]
async fn one_bad_line_rejects_the_whole_order() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let onion = app
        .create_product(&supplier.owner, "Cebola", dec!(4.50), 3, 1)
        .await;

    let result = app
        .state
        .order_service
        .create_order(
            &consumer.actor,
            order_payload(supplier.supplier_id, &[(tomato.id, 2), (onion.id, 4)]),
        )
        .await;
    assert_matches!(result, Err(AppError::ValidationFailed(_)));

    let orders = app
        .state
        .order_service
        .list_orders(&consumer.actor, None)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn order_lines_are_validated_against_the_catalog() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let other = app.register_supplier("Laticínios Serra").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let potato = app
        .create_product(&supplier.owner, "Batata", dec!(5.00), 100, 10)
        .await;
    let cheese = app
        .create_product(&other.owner, "Queijo", dec!(40.00), 100, 1)
        .await;

    let cases = [
        // abaixo do mínimo
        vec![(potato.id, 9)],
        // produto de outro fornecedor
        vec![(cheese.id, 1)],
        // produto inexistente
        vec![(9_999, 1)],
        // produto repetido
        vec![(potato.id, 10), (potato.id, 10)],
        // lista vazia
        vec![],
    ];

    for lines in cases {
        let result = app
            .state
            .order_service
            .create_order(&consumer.actor, order_payload(supplier.supplier_id, &lines))
            .await;
        assert_matches!(result, Err(AppError::ValidationFailed(_)), "lines: {:?}", lines);
    }
}

#[tokio::test]
async fn inactive_products_cannot_be_ordered() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let outcome = app
        .state
        .catalog_service
        .update_product(
            &supplier.owner,
            tomato.id,
            UpdateProductPayload {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    app.state.finish(outcome).await;

    let result = app
        .state
        .order_service
        .create_order(&consumer.actor, order_payload(supplier.supplier_id, &[(tomato.id, 1)]))
        .await;
    assert_matches!(result, Err(AppError::ValidationFailed(_)));
}

#[tokio::test]
async fn ordering_requires_an_approved_link() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;

    let payload = || order_payload(supplier.supplier_id, &[(tomato.id, 1)]);

    // Sem vínculo
    let result = app.state.order_service.create_order(&consumer.actor, payload()).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    // Vínculo ainda pendente
    app.request_link(&consumer.actor, supplier.supplier_id).await;
    let result = app.state.order_service.create_order(&consumer.actor, payload()).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn order_items_keep_the_price_at_order_time() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 2)])
        .await;

    let outcome = app
        .state
        .catalog_service
        .update_product(
            &supplier.owner,
            tomato.id,
            UpdateProductPayload {
                price: Some(dec!(9.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    app.state.finish(outcome).await;

    let detail = app
        .state
        .order_service
        .get_order(&consumer.actor, order.order.id)
        .await
        .unwrap();
    assert_eq!(detail.items[0].item.unit_price, dec!(7.90));
    assert_eq!(detail.items[0].item.subtotal, dec!(15.80));
    assert_eq!(detail.total_amount, dec!(15.80));
    assert_eq!(detail.items[0].product.as_ref().map(|p| p.price), Some(dec!(9.00)));
}

#[tokio::test]
async fn completed_orders_are_terminal() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 1)])
        .await;

    // PENDING não pode pular direto para COMPLETED
    let skipped = app
        .state
        .order_service
        .update_status(&supplier.owner, order.order.id, OrderStatus::Completed)
        .await;
    assert_matches!(skipped, Err(AppError::InvalidState(_)));

    app.set_order_status(&supplier.owner, order.order.id, OrderStatus::Accepted)
        .await;
    app.set_order_status(&supplier.owner, order.order.id, OrderStatus::Completed)
        .await;

    for target in [OrderStatus::Rejected, OrderStatus::Accepted, OrderStatus::Completed] {
        let result = app
            .state
            .order_service
            .update_status(&supplier.owner, order.order.id, target)
            .await;
        assert_matches!(result, Err(AppError::InvalidState(_)));
    }

    let back_to_pending = app
        .state
        .order_service
        .update_status(&supplier.owner, order.order.id, OrderStatus::Pending)
        .await;
    assert_matches!(back_to_pending, Err(AppError::ValidationFailed(_)));
}

#[tokio::test]
async fn acceptance_fails_atomically_when_stock_ran_out() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let first = app.register_consumer("Cantina Roma").await;
    let second = app.register_consumer("Bistrô Lua").await;
    app.approved_link(&supplier, &first.actor).await;
    app.approved_link(&supplier, &second.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let onion = app
        .create_product(&supplier.owner, "Cebola", dec!(4.50), 10, 1)
        .await;

    let order_a = app
        .place_order(&first.actor, supplier.supplier_id, &[(tomato.id, 6)])
        .await;
    let order_b = app
        .place_order(
            &second.actor,
            supplier.supplier_id,
            &[(onion.id, 2), (tomato.id, 6)],
        )
        .await;

    app.set_order_status(&supplier.owner, order_a.order.id, OrderStatus::Accepted)
        .await;

    let result = app
        .state
        .order_service
        .update_status(&supplier.owner, order_b.order.id, OrderStatus::Accepted)
        .await;
    assert_matches!(result, Err(AppError::InvalidState(_)));

    // Nada do segundo pedido foi aplicado
    assert_eq!(app.stock_of(&supplier.owner, tomato.id).await, Some(4));
    assert_eq!(app.stock_of(&supplier.owner, onion.id).await, Some(10));
    let detail = app
        .state
        .order_service
        .get_order(&supplier.owner, order_b.order.id)
        .await
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);

    // Ainda dá para recusar
    let rejected = app
        .set_order_status(&supplier.owner, order_b.order.id, OrderStatus::Rejected)
        .await;
    assert_eq!(rejected.order.status, OrderStatus::Rejected);
}

#[tokio::test]
async fn only_admins_of_the_owning_supplier_change_order_status() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let other = app.register_supplier("Laticínios Serra").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let sales = app
        .add_staff(&supplier.owner, Role::Sales, "vendas@sol.test")
        .await;
    let manager = app
        .add_staff(&supplier.owner, Role::Manager, "gerente@sol.test")
        .await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 1)])
        .await;

    for actor in [&sales, &other.owner, &consumer.actor] {
        let result = app
            .state
            .order_service
            .update_status(actor, order.order.id, OrderStatus::Accepted)
            .await;
        assert_matches!(result, Err(AppError::Forbidden(_)));
    }

    let accepted = app
        .set_order_status(&manager, order.order.id, OrderStatus::Accepted)
        .await;
    assert_eq!(accepted.order.status, OrderStatus::Accepted);
}

#[tokio::test]
async fn orders_are_scoped_to_consumer_and_supplier() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let other = app.register_supplier("Laticínios Serra").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    let stranger = app.register_consumer("Bistrô Lua").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let sales = app
        .add_staff(&supplier.owner, Role::Sales, "vendas@sol.test")
        .await;
    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 1)])
        .await;

    // Staff de vendas enxerga os pedidos do fornecedor
    let listed = app
        .state
        .order_service
        .list_orders(&sales, Some(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let filtered = app
        .state
        .order_service
        .list_orders(&sales, Some(OrderStatus::Accepted))
        .await
        .unwrap();
    assert!(filtered.is_empty());

    for actor in [&stranger.actor, &other.owner] {
        let result = app.state.order_service.get_order(actor, order.order.id).await;
        assert_matches!(result, Err(AppError::Forbidden(_)));
    }

    let missing = app.state.order_service.get_order(&consumer.actor, 9_999).await;
    assert_matches!(missing, Err(AppError::NotFound(_)));
}

// Store de auditoria fora do ar: toda transação falha ao abrir
struct UnavailableStore;

#[async_trait]
impl Store for UnavailableStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        Err(AppError::InternalServerError(anyhow::anyhow!("auditoria indisponível")))
    }
}

#[tokio::test]
async fn audit_failure_keeps_the_accepted_order_and_its_stock_decrement() {
    let mut app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let tomato = app
        .create_product(&supplier.owner, "Tomate", dec!(7.90), 10, 1)
        .await;
    let order = app
        .place_order(&consumer.actor, supplier.supplier_id, &[(tomato.id, 4)])
        .await;

    let working_audit = app.state.audit_service.clone();
    app.state.audit_service = AuditService::new(Arc::new(UnavailableStore));

    // finish só loga a falha e devolve o valor
    let accepted = app
        .set_order_status(&supplier.owner, order.order.id, OrderStatus::Accepted)
        .await;
    assert_eq!(accepted.order.status, OrderStatus::Accepted);

    let reloaded = app
        .state
        .order_service
        .get_order(&consumer.actor, order.order.id)
        .await
        .unwrap();
    assert_eq!(reloaded.order.status, OrderStatus::Accepted);
    assert_eq!(app.stock_of(&supplier.owner, tomato.id).await, Some(6));

    let history = working_audit
        .history(EntityType::Order, order.order.id)
        .await
        .unwrap();
    let actions: Vec<&str> = history.iter().map(|log| log.action.as_str()).collect();
    assert_eq!(actions, vec!["ORDER_CREATED"]);
}

#[tokio::test]
async fn oversized_subtotal_is_rejected_without_creating_the_order() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;
    app.approved_link(&supplier, &consumer.actor).await;

    let truffle = app
        .create_product(&supplier.owner, "Trufa", dec!(99999999.99), 1_000, 1)
        .await;

    let result = app
        .state
        .order_service
        .create_order(
            &consumer.actor,
            order_payload(supplier.supplier_id, &[(truffle.id, 101)]),
        )
        .await;
    assert_matches!(result, Err(AppError::ValidationFailed(_)));

    let orders = app
        .state
        .order_service
        .list_orders(&consumer.actor, None)
        .await
        .unwrap();
    assert!(orders.is_empty());
}
