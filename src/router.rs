// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register/supplier", post(handlers::auth::register_supplier))
        .route("/register/consumer", post(handlers::auth::register_consumer))
        .route("/login", post(handlers::auth::login));

    // Tudo abaixo exige Bearer token válido
    let protected_routes = Router::new()
        // --- Usuário / Equipe ---
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/supplier/staff", post(handlers::auth::register_staff))
        // --- Vínculos ---
        .route("/suppliers", get(handlers::links::list_suppliers))
        .route("/links", post(handlers::links::create_link))
        .route("/links/me", get(handlers::links::my_links))
        .route("/links/pending", get(handlers::links::pending_links))
        .route("/links/{id}/approve", post(handlers::links::approve_link))
        .route("/links/{id}/reject", post(handlers::links::reject_link))
        .route("/links/{id}/block", post(handlers::links::block_link))
        // --- Mensagens ---
        .route(
            "/messages/{id}",
            get(handlers::messages::list_messages).post(handlers::messages::send_message),
        )
        // --- Catálogo ---
        .route(
            "/supplier/products",
            get(handlers::catalog::list_own_products).post(handlers::catalog::create_product),
        )
        .route(
            "/supplier/products/{id}",
            put(handlers::catalog::update_product).delete(handlers::catalog::delete_product),
        )
        .route(
            "/suppliers/{id}/products",
            get(handlers::catalog::list_supplier_products),
        )
        // --- Pedidos ---
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order).put(handlers::orders::update_order_status),
        )
        // --- Reclamações ---
        .route(
            "/orders/{id}/complaint",
            post(handlers::complaints::create_complaint),
        )
        .route("/complaints", get(handlers::complaints::list_complaints))
        .route("/complaints/{id}", put(handlers::complaints::update_complaint))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/", get(handlers::system::root))
        .route("/api/health", get(handlers::system::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .with_state(app_state)
}
