// src/db/memory_store.rs
//
// Store em memória: arena com ids inteiros por tabela. Uma transação segura o
// mutex global, trabalha numa cópia e troca a cópia no commit. Drop sem commit
// descarta a cópia (rollback).

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    common::error::AppError,
    db::{ComplaintFilter, LinkFilter, OrderFilter, Store, StoreTx},
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

#[derive(Debug, Clone, Default)]
struct Sequences {
    suppliers: i64,
    users: i64,
    links: i64,
    products: i64,
    orders: i64,
    order_items: i64,
    complaints: i64,
    messages: i64,
    audit_logs: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct Arena {
    seq: Sequences,
    suppliers: BTreeMap<i64, Supplier>,
    users: BTreeMap<i64, User>,
    links: BTreeMap<i64, Link>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<i64, OrderItem>,
    complaints: BTreeMap<i64, Complaint>,
    messages: BTreeMap<i64, Message>,
    audit_logs: BTreeMap<i64, AuditLog>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    arena: Arc<Mutex<Arena>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.arena.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Arena>,
    work: Arena,
}

// Ordenação "mais recente primeiro" usada nas listagens
fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl StoreTx for MemoryTx {
    // --- Fornecedores ---

    async fn insert_supplier(&mut self, new: NewSupplier) -> Result<Supplier, AppError> {
        let now = Utc::now();
        let supplier = Supplier {
            id: next(&mut self.work.seq.suppliers),
            company_name: new.company_name,
            address: new.address,
            phone: new.phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn find_supplier(&mut self, id: i64) -> Result<Option<Supplier>, AppError> {
        Ok(self.work.suppliers.get(&id).cloned())
    }

    async fn list_active_suppliers(&mut self) -> Result<Vec<Supplier>, AppError> {
        let mut suppliers: Vec<Supplier> =
            self.work.suppliers.values().filter(|s| s.is_active).cloned().collect();
        suppliers.sort_by(|a, b| (&a.company_name, a.id).cmp(&(&b.company_name, b.id)));
        Ok(suppliers)
    }

    // --- Usuários ---

    async fn insert_user(&mut self, new: NewUser) -> Result<User, AppError> {
        if self.work.users.values().any(|u| u.email == new.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: next(&mut self.work.seq.users),
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            supplier_id: new.supplier_id,
            restaurant_name: new.restaurant_name,
            created_at: now,
            updated_at: now,
        };
        self.work.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    // --- Vínculos ---

    async fn insert_link(&mut self, supplier_id: i64, consumer_id: i64) -> Result<Link, AppError> {
        if self
            .work
            .links
            .values()
            .any(|l| l.supplier_id == supplier_id && l.consumer_id == consumer_id)
        {
            return Err(AppError::Conflict(
                "Já existe um vínculo entre este consumidor e este fornecedor.".into(),
            ));
        }
        let now = Utc::now();
        let link = Link {
            id: next(&mut self.work.seq.links),
            supplier_id,
            consumer_id,
            status: LinkStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.work.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn find_link(&mut self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.work.links.get(&id).cloned())
    }

    // O mutex global já serializa as transações
    async fn lock_link(&mut self, id: i64) -> Result<Option<Link>, AppError> {
        self.find_link(id).await
    }

    async fn find_link_by_pair(
        &mut self,
        supplier_id: i64,
        consumer_id: i64,
    ) -> Result<Option<Link>, AppError> {
        Ok(self
            .work
            .links
            .values()
            .find(|l| l.supplier_id == supplier_id && l.consumer_id == consumer_id)
            .cloned())
    }

    async fn update_link_status(&mut self, id: i64, status: LinkStatus) -> Result<Link, AppError> {
        let link = self
            .work
            .links
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Vínculo", id))?;
        link.status = status;
        link.updated_at = Utc::now();
        Ok(link.clone())
    }

    async fn list_links(&mut self, filter: LinkFilter) -> Result<Vec<Link>, AppError> {
        let links: Vec<Link> = self
            .work
            .links
            .values()
            .filter(|l| filter.supplier_id.is_none_or(|id| l.supplier_id == id))
            .filter(|l| filter.consumer_id.is_none_or(|id| l.consumer_id == id))
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        Ok(newest_first(links, |l| (l.created_at, l.id)))
    }

    // --- Produtos ---

    async fn insert_product(&mut self, new: NewProduct) -> Result<Product, AppError> {
        let now = Utc::now();
        let product = Product {
            id: next(&mut self.work.seq.products),
            supplier_id: new.supplier_id,
            name: new.name,
            description: new.description,
            unit: new.unit,
            price: new.price,
            stock_quantity: new.stock_quantity,
            min_order_quantity: new.min_order_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product(&mut self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn find_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        Ok(self
            .work
            .products
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        self.find_products(ids).await
    }

    async fn list_products(
        &mut self,
        supplier_id: i64,
        active_only: bool,
    ) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self
            .work
            .products
            .values()
            .filter(|p| p.supplier_id == supplier_id && (!active_only || p.is_active))
            .cloned()
            .collect();
        products.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(products)
    }

    async fn update_product(&mut self, product: &Product) -> Result<Product, AppError> {
        let stored = self
            .work
            .products
            .get_mut(&product.id)
            .ok_or_else(|| AppError::not_found("Produto", product.id))?;
        *stored = Product {
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn set_product_stock(&mut self, id: i64, stock_quantity: i32) -> Result<(), AppError> {
        if let Some(product) = self.work.products.get_mut(&id) {
            product.stock_quantity = stock_quantity;
            product.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_product(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(self.work.products.remove(&id).is_some())
    }

    // --- Pedidos ---

    async fn insert_order(&mut self, new: NewOrder) -> Result<Order, AppError> {
        let now = Utc::now();
        let order = Order {
            id: next(&mut self.work.seq.orders),
            supplier_id: new.supplier_id,
            consumer_id: new.consumer_id,
            status: OrderStatus::Pending,
            created_by_user_id: new.created_by_user_id,
            created_at: now,
            updated_at: now,
        };
        self.work.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, AppError> {
        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            if !self.work.orders.contains_key(&item.order_id) {
                return Err(AppError::not_found("Pedido", item.order_id));
            }
            let row = OrderItem {
                id: next(&mut self.work.seq.order_items),
                order_id: item.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            };
            self.work.order_items.insert(row.id, row.clone());
            saved.push(row);
        }
        Ok(saved)
    }

    async fn find_order(&mut self, id: i64) -> Result<Option<Order>, AppError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: i64) -> Result<Option<Order>, AppError> {
        self.find_order(id).await
    }

    async fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self
            .work
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Pedido", id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn list_orders(&mut self, filter: OrderFilter) -> Result<Vec<Order>, AppError> {
        let orders: Vec<Order> = self
            .work
            .orders
            .values()
            .filter(|o| filter.supplier_id.is_none_or(|id| o.supplier_id == id))
            .filter(|o| filter.consumer_id.is_none_or(|id| o.consumer_id == id))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, |o| (o.created_at, o.id)))
    }

    async fn list_order_items(&mut self, order_ids: &[i64]) -> Result<Vec<OrderItem>, AppError> {
        let mut items: Vec<OrderItem> = self
            .work
            .order_items
            .values()
            .filter(|i| order_ids.contains(&i.order_id))
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.order_id, i.id));
        Ok(items)
    }

    // --- Reclamações ---

    async fn insert_complaint(&mut self, new: NewComplaint) -> Result<Complaint, AppError> {
        if self.find_unresolved_complaint(new.order_id).await?.is_some() {
            return Err(AppError::Conflict(
                "Já existe uma reclamação em aberto para este pedido.".into(),
            ));
        }
        let now = Utc::now();
        let complaint = Complaint {
            id: next(&mut self.work.seq.complaints),
            order_id: new.order_id,
            raised_by_user_id: new.raised_by_user_id,
            assigned_to_user_id: None,
            status: ComplaintStatus::Open,
            description: new.description,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        self.work.complaints.insert(complaint.id, complaint.clone());
        Ok(complaint)
    }

    async fn find_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError> {
        Ok(self.work.complaints.get(&id).cloned())
    }

    async fn lock_complaint(&mut self, id: i64) -> Result<Option<Complaint>, AppError> {
        self.find_complaint(id).await
    }

    async fn find_unresolved_complaint(
        &mut self,
        order_id: i64,
    ) -> Result<Option<Complaint>, AppError> {
        Ok(self
            .work
            .complaints
            .values()
            .find(|c| c.order_id == order_id && c.status != ComplaintStatus::Resolved)
            .cloned())
    }

    async fn order_has_complaint(&mut self, order_id: i64) -> Result<bool, AppError> {
        Ok(self.work.complaints.values().any(|c| c.order_id == order_id))
    }

    async fn update_complaint(&mut self, complaint: &Complaint) -> Result<Complaint, AppError> {
        let stored = self
            .work
            .complaints
            .get_mut(&complaint.id)
            .ok_or_else(|| AppError::not_found("Reclamação", complaint.id))?;
        stored.status = complaint.status;
        stored.assigned_to_user_id = complaint.assigned_to_user_id;
        stored.resolved_at = complaint.resolved_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_complaints(
        &mut self,
        filter: ComplaintFilter,
    ) -> Result<Vec<Complaint>, AppError> {
        let orders = &self.work.orders;
        let complaints: Vec<Complaint> = self
            .work
            .complaints
            .values()
            .filter(|c| filter.raised_by_user_id.is_none_or(|id| c.raised_by_user_id == id))
            .filter(|c| {
                filter.supplier_id.is_none_or(|id| {
                    orders.get(&c.order_id).is_some_and(|o| o.supplier_id == id)
                })
            })
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        Ok(newest_first(complaints, |c| (c.created_at, c.id)))
    }

    // --- Mensagens ---

    async fn insert_message(&mut self, new: NewMessage) -> Result<Message, AppError> {
        let message = Message {
            id: next(&mut self.work.seq.messages),
            link_id: new.link_id,
            sender_id: new.sender_id,
            content: new.content,
            attachment_url: None,
            created_at: Utc::now(),
        };
        self.work.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn list_messages(&mut self, link_id: i64) -> Result<Vec<Message>, AppError> {
        // ids crescem com o tempo: a ordem da BTreeMap já é a de criação
        Ok(self
            .work
            .messages
            .values()
            .filter(|m| m.link_id == link_id)
            .cloned()
            .collect())
    }

    // --- Auditoria ---

    async fn insert_audit_log(
        &mut self,
        user_id: i64,
        action: &str,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<AuditLog, AppError> {
        let log = AuditLog {
            id: next(&mut self.work.seq.audit_logs),
            user_id: Some(user_id),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            created_at: Utc::now(),
        };
        self.work.audit_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn list_audit_logs(
        &mut self,
        entity_type: &str,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        Ok(self
            .work
            .audit_logs
            .values()
            .filter(|l| l.entity_type == entity_type && l.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_supplier() -> NewSupplier {
        NewSupplier {
            company_name: "Hortifruti Central".into(),
            address: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_supplier(new_supplier()).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_active_suppliers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let supplier = tx.insert_supplier(new_supplier()).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_supplier(supplier.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn link_pair_is_unique() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_link(1, 2).await.unwrap();
        assert_matches!(tx.insert_link(1, 2).await, Err(AppError::Conflict(_)));
        assert!(tx.insert_link(1, 3).await.is_ok());
    }
}
