// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- System ---
        handlers::system::root,
        handlers::system::health,

        // --- Auth ---
        handlers::auth::register_supplier,
        handlers::auth::register_consumer,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::register_staff,

        // --- Links ---
        handlers::links::list_suppliers,
        handlers::links::create_link,
        handlers::links::my_links,
        handlers::links::pending_links,
        handlers::links::approve_link,
        handlers::links::reject_link,
        handlers::links::block_link,

        // --- Catalog ---
        handlers::catalog::list_own_products,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::list_supplier_products,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,

        // --- Complaints ---
        handlers::complaints::create_complaint,
        handlers::complaints::list_complaints,
        handlers::complaints::update_complaint,

        // --- Messages ---
        handlers::messages::list_messages,
        handlers::messages::send_message,
    ),
    components(
        schemas(
            handlers::system::ServiceInfo,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::UserSummary,
            models::auth::MeResponse,
            models::auth::RegisterSupplierPayload,
            models::auth::RegisterConsumerPayload,
            models::auth::RegisterStaffPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Suppliers / Links ---
            models::supplier::Supplier,
            models::link::LinkStatus,
            models::link::Link,
            models::link::LinkDetail,
            models::link::CreateLinkPayload,

            // --- Catalog ---
            models::catalog::Product,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,

            // --- Orders ---
            models::order::OrderStatus,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderView,
            models::order::OrderItemDetail,
            models::order::OrderDetail,
            models::order::OrderLinePayload,
            models::order::CreateOrderPayload,
            models::order::UpdateOrderStatusPayload,

            // --- Complaints ---
            models::complaint::ComplaintStatus,
            models::complaint::Complaint,
            models::complaint::ComplaintDetail,
            models::complaint::CreateComplaintPayload,
            models::complaint::UpdateComplaintPayload,

            // --- Messages ---
            models::message::Message,
            models::message::MessageView,
            models::message::SendMessagePayload,

            // --- Audit ---
            models::audit::AuditLog,
        )
    ),
    tags(
        (name = "System", description = "Saúde e informações do serviço"),
        (name = "Auth", description = "Autenticação, Registro e Equipe"),
        (name = "Links", description = "Vínculos entre Restaurantes e Fornecedores"),
        (name = "Catalog", description = "Catálogo de Produtos do Fornecedor"),
        (name = "Orders", description = "Pedidos e Máquina de Estados"),
        (name = "Complaints", description = "Reclamações sobre Pedidos"),
        (name = "Messages", description = "Mensagens dentro de um Vínculo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_protected_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/orders/{id}"));
        assert!(doc.paths.paths.contains_key("/api/messages/{id}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
