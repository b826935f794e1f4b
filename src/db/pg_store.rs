// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;

use crate::{
    common::error::AppError,
    db::{ComplaintFilter, LinkFilter, OrderFilter, Store, StoreTx},
    models::{
        audit::AuditLog,
        auth::{NewUser, User},
        catalog::{NewProduct, Product},
        complaint::{Complaint, NewComplaint},
        link::{Link, LinkStatus},
        message::{Message, NewMessage},
        order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
        supplier::{NewSupplier, Supplier},
    },
};

const SUPPLIER_COLUMNS: &str = "id, company_name, address, phone, is_active, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, supplier_id, restaurant_name, created_at, updated_at";
const LINK_COLUMNS: &str = "id, supplier_id, consumer_id, status, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, supplier_id, name, description, unit, price, stock_quantity, \
     min_order_quantity, is_active, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, supplier_id, consumer_id, status, created_by_user_id, created_at, updated_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, subtotal";
const COMPLAINT_COLUMNS: &str = "id, order_id, raised_by_user_id, assigned_to_user_id, status, \
     description, created_at, updated_at, resolved_at";
const MESSAGE_COLUMNS: &str = "id, link_id, sender_id, content, attachment_url, created_at";
const AUDIT_COLUMNS: &str = "id, user_id, action, entity_type, entity_id, created_at";

// Traduz violações de unicidade para a taxonomia do domínio
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_email_key" => AppError::EmailAlreadyExists,
                    "uq_links_supplier_consumer" => AppError::Conflict(
                        "Já existe um vínculo entre este consumidor e este fornecedor.".into(),
                    ),
                    "uq_complaints_open_per_order" => AppError::Conflict(
                        "Já existe uma reclamação em aberto para este pedido.".into(),
                    ),
                    _ => AppError::Conflict(format!("Registro duplicado ({}).", constraint)),
                };
            }
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }
}

pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    // --- Fornecedores ---

    async fn insert_supplier(&mut self, new: NewSupplier) -> Result<Supplier, AppError> {
        let sql = format!(
            "INSERT INTO suppliers (company_name, address, phone) VALUES ($1, $2, $3) RETURNING {}",
            SUPPLIER_COLUMNS
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(new.company_name)
            .bind(new.address)
            .bind(new.phone)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(supplier)
    }

    async fn find_supplier(&mut self, id: i64) -> Result<Option<Supplier>, AppError> {
        let sql = format!("SELECT {} FROM suppliers WHERE id = $1", SUPPLIER_COLUMNS);
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(supplier)
    }

    async fn list_active_suppliers(&mut self) -> Result<Vec<Supplier>, AppError> {
        let sql = format!(
            "SELECT {} FROM suppliers WHERE is_active = TRUE ORDER BY company_name, id",
            SUPPLIER_COLUMNS
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(suppliers)
    }

    // --- Usuários ---

    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, supplier_id, restaurant_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(new.email)
            .bind(new.password_hash)
            .bind(new.full_name)
            .bind(new.role)
            .bind(new.supplier_id)
            .bind(new.restaurant_name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_user(&mut self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    // --- Vínculos ---

    async fn insert_link(&mut self, supplier_id: i64, consumer_id: i64) -> Result<Link, AppError> {
        let sql = format!(
            "INSERT INTO links (supplier_id, consumer_id, status) VALUES ($1, $2, 'PENDING') RETURNING {}",
            LINK_COLUMNS
        );
        sqlx::query_as::<_, Link>(&sql)
            .bind(supplier_id)
            .bind(consumer_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_link(&mut self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {} FROM links WHERE id = $1", LINK_COLUMNS);
        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(link)
    }

    async fn lock_link(&mut self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {} FROM links WHERE id = $1 FOR UPDATE", LINK_COLUMNS);
        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(link)
    }

    async fn find_link_by_pair(
        &mut self,
        supplier_id: i64,
        consumer_id: i64,
    ) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "SELECT {} FROM links WHERE supplier_id = $1 AND consumer_id = $2",
            LINK_COLUMNS
        );
        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(supplier_id)
            .bind(consumer_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(link)
    }

    async fn update_link_status(&mut self, id: i64, status: LinkStatus) -> Result<Link, AppError> {
        let sql = format!(
            "UPDATE links SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            LINK_COLUMNS
        );
        sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::not_found("Vínculo", id))
    }

    async fn list_links(&mut self, filter: LinkFilter) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM links
            WHERE ($1::BIGINT IS NULL OR supplier_id = $1)
              AND ($2::BIGINT IS NULL OR consumer_id = $2)
              AND ($3::link_status IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            "#,
            LINK_COLUMNS
        );
        let links = sqlx::query_as::<_, Link>(&sql)
            .bind(filter.supplier_id)
            .bind(filter.consumer_id)
            .bind(filter.status)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(links)
    }

    // --- Produtos ---

    async fn insert_product(&mut self, new: NewProduct) -> Result<Product, AppError> {
        let sql = format!(
            r#"
            INSERT INTO products (supplier_id, name, description, unit, price, stock_quantity, min_order_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(new.supplier_id)
            .bind(new.name)
            .bind(new.description)
            .bind(new.unit)
            .bind(new.price)
            .bind(new.stock_quantity)
            .bind(new.min_order_quantity)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn find_product(&mut self, id: i64) -> Result<Option<Product>, AppError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn find_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(products)
    }

    async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        // Ordem fixa por id para duas aceitações não se travarem mutuamente
        let sql = format!(
            "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(products)
    }

    async fn list_products(
        &mut self,
        supplier_id: i64,
        active_only: bool,
    ) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM products
            WHERE supplier_id = $1 AND ($2 = FALSE OR is_active = TRUE)
            ORDER BY name, id
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .bind(active_only)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(products)
    }

    async fn update_product(&mut self, product: &Product) -> Result<Product, AppError> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, unit = $4, price = $5,
                stock_quantity = $6, min_order_quantity = $7, is_active = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.unit)
            .bind(product.price)
            .bind(product.stock_quantity)
            .bind(product.min_order_quantity)
            .bind(product.is_active)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::not_found("Produto", product.id))
    }

    async fn set_product_stock(&mut self, id: i64, stock_quantity: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE products SET stock_quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(stock_quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_product(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Pedidos ---

    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, AppError> {
        let sql = format!(
            r#"
            INSERT INTO orders (supplier_id, consumer_id, status, created_by_user_id)
            VALUES ($1, $2, 'PENDING', $3)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(new.supplier_id)
            .bind(new.consumer_id)
            .bind(new.created_by_user_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, AppError> {
        let sql = format!(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ORDER_ITEM_COLUMNS
        );

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(&sql)
                .bind(item.order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.subtotal)
                .fetch_one(&mut *self.tx)
                .await?;
            saved.push(row);
        }
        Ok(saved)
    }

    async fn find_order(&mut self, id: i64) -> Result<Option<Order>, AppError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(order)
    }

    async fn lock_order(&mut self, id: i64) -> Result<Option<Order>, AppError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(order)
    }

    async fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let sql = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", id))
    }

    async fn list_orders(&mut self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM orders
            WHERE ($1::BIGINT IS NULL OR supplier_id = $1)
              AND ($2::BIGINT IS NULL OR consumer_id = $2)
              AND ($3::order_status IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            "#,
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(filter.supplier_id)
            .bind(filter.consumer_id)
            .bind(filter.status)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(orders)
    }

    async fn list_order_items(&mut self, order_ids: &[i64]) -> Result<Vec<OrderItem>, AppError> {
        let sql = format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, id",
            ORDER_ITEM_COLUMNS
        );
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_ids.to_vec())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(items)
    }

    // --- Reclamações ---

    async fn insert_complaint(&mut self, new: NewComplaint) -> Result<Complaint, AppError> {
        let sql = format!(
            r#"
            INSERT INTO complaints (order_id, raised_by_user_id, status, description)
            VALUES ($1, $2, 'OPEN', $3)
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        );
        sqlx::query_as::<_, Complaint>(&sql)
            .bind(new.order_id)
            .bind(new.raised_by_user_id)
            .bind(new.description)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError> {
        let sql = format!("SELECT {} FROM complaints WHERE id = $1", COMPLAINT_COLUMNS);
        let complaint = sqlx::query_as::<_, Complaint>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(complaint)
    }

    async fn lock_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError> {
        let sql = format!(
            "SELECT {} FROM complaints WHERE id = $1 FOR UPDATE",
            COMPLAINT_COLUMNS
        );
        let complaint = sqlx::query_as::<_, Complaint>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(complaint)
    }

    async fn find_unresolved_complaint(
        &mut self,
        order_id: i64,
    ) -> Result<Option<Complaint>, AppError> {
        let sql = format!(
            "SELECT {} FROM complaints WHERE order_id = $1 AND status <> 'RESOLVED'",
            COMPLAINT_COLUMNS
        );
        let complaint = sqlx::query_as::<_, Complaint>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(complaint)
    }

    async fn order_has_complaint(&mut self, order_id: i64) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM complaints WHERE order_id = $1)")
                .bind(order_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn update_complaint(&mut self, complaint: &Complaint) -> Result<Complaint, AppError> {
        let sql = format!(
            r#"
            UPDATE complaints
            SET status = $2, assigned_to_user_id = $3, resolved_at = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        );
        sqlx::query_as::<_, Complaint>(&sql)
            .bind(complaint.id)
            .bind(complaint.status)
            .bind(complaint.assigned_to_user_id)
            .bind(complaint.resolved_at)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::not_found("Reclamação", complaint.id))
    }

    async fn list_complaints(
        &mut self,
        filter: ComplaintFilter,
    ) -> Result<Vec<Complaint>, AppError> {
        let columns = COMPLAINT_COLUMNS
            .split(", ")
            .map(|c| format!("c.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT {} FROM complaints c
            JOIN orders o ON o.id = c.order_id
            WHERE ($1::BIGINT IS NULL OR c.raised_by_user_id = $1)
              AND ($2::BIGINT IS NULL OR o.supplier_id = $2)
              AND ($3::complaint_status IS NULL OR c.status = $3)
            ORDER BY c.created_at DESC, c.id DESC
            "#,
            columns
        );
        let complaints = sqlx::query_as::<_, Complaint>(&sql)
            .bind(filter.raised_by_user_id)
            .bind(filter.supplier_id)
            .bind(filter.status)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(complaints)
    }

    // --- Mensagens ---

    async fn insert_message(&mut self, new: NewMessage) -> Result<Message, AppError> {
        let sql = format!(
            "INSERT INTO messages (link_id, sender_id, content) VALUES ($1, $2, $3) RETURNING {}",
            MESSAGE_COLUMNS
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(new.link_id)
            .bind(new.sender_id)
            .bind(new.content)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(message)
    }

    async fn list_messages(&mut self, link_id: i64) -> Result<Vec<Message>, AppError> {
        let sql = format!(
            "SELECT {} FROM messages WHERE link_id = $1 ORDER BY created_at, id",
            MESSAGE_COLUMNS
        );
        let messages = sqlx::query_as::<_, Message>(&sql)
            .bind(link_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(messages)
    }

    // --- Auditoria ---

    async fn insert_audit_log(
        &mut self,
        user_id: i64,
        action: &str,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<AuditLog, AppError> {
        let sql = format!(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            AUDIT_COLUMNS
        );
        let log = sqlx::query_as::<_, AuditLog>(&sql)
            .bind(user_id)
            .bind(action)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(log)
    }

    async fn list_audit_logs(
        &mut self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let sql = format!(
            "SELECT {} FROM audit_logs WHERE entity_type = $1 AND entity_id = $2 ORDER BY id",
            AUDIT_COLUMNS
        );
        let logs = sqlx::query_as::<_, AuditLog>(&sql)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(logs)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
