//! Base compartilhada dos testes de integração.
//!
//! Tudo roda sobre o store em memória com custo de bcrypt baixo, então a
//! suíte não precisa de banco. Os helpers passam pelos serviços reais e gravam
//! a auditoria do mesmo jeito que os handlers HTTP.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use foodlink::{
    common::security::{BcryptHasher, JwtIssuer},
    config::AppState,
    db::MemoryStore,
    domain::Actor,
    models::{
        auth::{RegisterConsumerPayload, RegisterStaffPayload, RegisterSupplierPayload, Role},
        catalog::{CreateProductPayload, Product},
        link::Link,
        order::{CreateOrderPayload, OrderLinePayload, OrderStatus, OrderView},
    },
    router::build_router,
};

pub const PASSWORD: &str = "segredo123";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

/// Um fornecedor recém-registrado e o seu OWNER.
pub struct SupplierFixture {
    pub supplier_id: i64,
    pub owner: Actor,
    pub token: String,
}

pub struct ConsumerFixture {
    pub actor: Actor,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let hasher = Arc::new(BcryptHasher::new(4));
        let tokens = Arc::new(JwtIssuer::new("test-secret", 1));

        let state = AppState::with_parts(store, hasher, tokens);
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn register_supplier(&self, company: &str) -> SupplierFixture {
        let outcome = self
            .state
            .auth_service
            .register_supplier(RegisterSupplierPayload {
                company_name: company.to_string(),
                address: Some("Rua das Flores, 10".to_string()),
                phone: None,
                owner_full_name: format!("Dono {}", company),
                owner_email: format!("owner@{}.test", slug(company)),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("register supplier");
        let token = self.state.finish(outcome).await.access_token;

        let owner = self.actor_for(&token).await;
        SupplierFixture {
            supplier_id: owner.supplier_id.expect("owner has supplier"),
            owner,
            token,
        }
    }

    pub async fn register_consumer(&self, restaurant: &str) -> ConsumerFixture {
        let outcome = self
            .state
            .auth_service
            .register_consumer(RegisterConsumerPayload {
                full_name: format!("Chef {}", restaurant),
                restaurant_name: restaurant.to_string(),
                email: format!("chef@{}.test", slug(restaurant)),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("register consumer");
        let token = self.state.finish(outcome).await.access_token;

        let actor = self.actor_for(&token).await;
        ConsumerFixture { actor, token }
    }

    pub async fn add_staff(&self, admin: &Actor, role: Role, email: &str) -> Actor {
        let outcome = self
            .state
            .auth_service
            .register_staff(
                admin,
                RegisterStaffPayload {
                    full_name: format!("Equipe {}", email),
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    role,
                },
            )
            .await
            .expect("register staff");
        let staff = self.state.finish(outcome).await;
        Actor {
            user_id: staff.id,
            role: staff.role,
            supplier_id: staff.supplier_id,
        }
    }

    pub async fn actor_for(&self, token: &str) -> Actor {
        let user = self
            .state
            .auth_service
            .authenticate(token)
            .await
            .expect("token should authenticate");
        Actor::from(&user)
    }

    pub async fn request_link(&self, consumer: &Actor, supplier_id: i64) -> Link {
        let outcome = self
            .state
            .link_service
            .request_link(consumer, supplier_id)
            .await
            .expect("request link");
        self.state.finish(outcome).await
    }

    /// Pede e aprova o vínculo entre o consumidor e o fornecedor.
    pub async fn approved_link(&self, supplier: &SupplierFixture, consumer: &Actor) -> Link {
        let link = self.request_link(consumer, supplier.supplier_id).await;
        let outcome = self
            .state
            .link_service
            .approve(&supplier.owner, link.id)
            .await
            .expect("approve link");
        self.state.finish(outcome).await
    }

    pub async fn create_product(
        &self,
        admin: &Actor,
        name: &str,
        price: Decimal,
        stock: i32,
        min_order: i32,
    ) -> Product {
        let outcome = self
            .state
            .catalog_service
            .create_product(
                admin,
                CreateProductPayload {
                    name: name.to_string(),
                    description: None,
                    unit: "kg".to_string(),
                    price,
                    stock_quantity: stock,
                    min_order_quantity: min_order,
                },
            )
            .await
            .expect("create product");
        self.state.finish(outcome).await
    }

    pub async fn place_order(
        &self,
        consumer: &Actor,
        supplier_id: i64,
        lines: &[(i64, i32)],
    ) -> OrderView {
        let outcome = self
            .state
            .order_service
            .create_order(consumer, order_payload(supplier_id, lines))
            .await
            .expect("create order");
        self.state.finish(outcome).await
    }

    pub async fn set_order_status(
        &self,
        admin: &Actor,
        order_id: i64,
        status: OrderStatus,
    ) -> OrderView {
        let outcome = self
            .state
            .order_service
            .update_status(admin, order_id, status)
            .await
            .expect("update order status");
        self.state.finish(outcome).await
    }

    pub async fn stock_of(&self, admin: &Actor, product_id: i64) -> Option<i32> {
        self.state
            .catalog_service
            .list_own_products(admin)
            .await
            .expect("list products")
            .into_iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock_quantity)
    }

    // ---
    // HTTP
    // ---

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn order_payload(supplier_id: i64, lines: &[(i64, i32)]) -> CreateOrderPayload {
    CreateOrderPayload {
        supplier_id,
        items: lines
            .iter()
            .map(|&(product_id, quantity)| OrderLinePayload { product_id, quantity })
            .collect(),
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
