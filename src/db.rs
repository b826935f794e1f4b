// src/db.rs
//
// Persistência atrás de um `Store` que abre transações. Cada operação do
// núcleo roda numa única `StoreTx`: ou faz `commit`, ou o drop desfaz tudo.

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        audit::AuditLog,
        auth::{NewUser, User},
        catalog::{NewProduct, Product},
        complaint::{Complaint, ComplaintStatus, NewComplaint},
        link::{Link, LinkStatus},
        message::{Message, NewMessage},
        order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
        supplier::{NewSupplier, Supplier},
    },
};

pub mod memory_store;
pub use memory_store::MemoryStore;
pub mod pg_store;
pub use pg_store::PgStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFilter {
    pub supplier_id: Option<i64>,
    pub consumer_id: Option<i64>,
    pub status: Option<LinkStatus>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub supplier_id: Option<i64>,
    pub consumer_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

// Reclamações filtradas pelo autor ou pelo fornecedor do pedido
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplaintFilter {
    pub raised_by_user_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub status: Option<ComplaintStatus>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

#[async_trait]
pub trait StoreTx: Send {
    // --- Fornecedores ---
    async fn insert_supplier(&mut self, new: NewSupplier) -> Result<Supplier, AppError>;
    async fn find_supplier(&mut self, id: i64) -> Result<Option<Supplier>, AppError>;
    async fn list_active_suppliers(&mut self) -> Result<Vec<Supplier>, AppError>;

    // --- Usuários ---
    /// E-mail duplicado vira `EmailAlreadyExists`.
    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError>;
    async fn find_user(&mut self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, AppError>;

    // --- Vínculos ---
    /// Par (fornecedor, consumidor) duplicado vira `Conflict`.
    async fn insert_link(&mut self, supplier_id: i64, consumer_id: i64) -> Result<Link, AppError>;
    async fn find_link(&mut self, id: i64) -> Result<Option<Link>, AppError>;
    async fn lock_link(&mut self, id: i64) -> Result<Option<Link>, AppError>;
    async fn find_link_by_pair(
        &mut self,
        supplier_id: i64,
        consumer_id: i64,
    ) -> Result<Option<Link>, AppError>;
    async fn update_link_status(&mut self, id: i64, status: LinkStatus) -> Result<Link, AppError>;
    async fn list_links(&mut self, filter: LinkFilter) -> Result<Vec<Link>, AppError>;

    // --- Produtos ---
    async fn insert_product(&mut self, new: NewProduct) -> Result<Product, AppError>;
    async fn find_product(&mut self, id: i64) -> Result<Option<Product>, AppError>;
    async fn find_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError>;
    /// Trava as linhas (ordenadas por id) até o fim da transação.
    async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError>;
    async fn list_products(
        &mut self,
        supplier_id: i64,
        active_only: bool,
    ) -> Result<Vec<Product>, AppError>;
    async fn update_product(&mut self, product: &Product) -> Result<Product, AppError>;
    async fn set_product_stock(&mut self, id: i64, stock_quantity: i32) -> Result<(), AppError>;
    async fn delete_product(&mut self, id: i64) -> Result<bool, AppError>;

    // --- Pedidos ---
    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, AppError>;
    async fn insert_order_items(
        &mut self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, AppError>;
    async fn find_order(&mut self, id: i64) -> Result<Option<Order>, AppError>;
    async fn lock_order(&mut self, id: i64) -> Result<Option<Order>, AppError>;
    async fn update_order_status(&mut self, id: i64, status: OrderStatus)
        -> Result<Order, AppError>;
    async fn list_orders(&mut self, filter: OrderFilter) -> Result<Vec<Order>, AppError>;
    /// Itens de vários pedidos de uma vez, ordenados por (pedido, id).
    async fn list_order_items(&mut self, order_ids: &[i64]) -> Result<Vec<OrderItem>, AppError>;

    // --- Reclamações ---
    /// Segunda reclamação não resolvida no mesmo pedido vira `Conflict`.
    async fn insert_complaint(&mut self, new: NewComplaint) -> Result<Complaint, AppError>;
    async fn find_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError>;
    async fn lock_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError>;
    async fn find_unresolved_complaint(
        &mut self,
        order_id: i64,
    ) -> Result<Option<Complaint>, AppError>;
    async fn order_has_complaint(&mut self, order_id: i64) -> Result<bool, AppError>;
    async fn update_complaint(&mut self, complaint: &Complaint) -> Result<Complaint, AppError>;
    async fn list_complaints(&mut self, filter: ComplaintFilter)
        -> Result<Vec<Complaint>, AppError>;

    // --- Mensagens ---
    async fn insert_message(&mut self, new: NewMessage) -> Result<Message, AppError>;
    async fn list_messages(&mut self, link_id: i64) -> Result<Vec<Message>, AppError>;

    // --- Auditoria ---
    async fn insert_audit_log(
        &mut self,
        user_id: i64,
        action: &str,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<AuditLog, AppError>;
    async fn list_audit_logs(
        &mut self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
