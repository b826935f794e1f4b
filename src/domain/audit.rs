// src/domain/audit.rs
//
// O núcleo não grava auditoria: cada operação devolve a lista de eventos
// (`Outcome`) e quem chamou persiste depois do commit.

use std::fmt;

use crate::models::{complaint::ComplaintStatus, order::OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Supplier,
    User,
    Link,
    Product,
    Order,
    Complaint,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Supplier => "SUPPLIER",
            EntityType::User => "USER",
            EntityType::Link => "LINK",
            EntityType::Product => "PRODUCT",
            EntityType::Order => "ORDER",
            EntityType::Complaint => "COMPLAINT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    SupplierRegistered,
    ConsumerRegistered,
    StaffRegistered,
    LinkRequested,
    LinkApproved,
    LinkDeclined,
    LinkBlocked,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    ProductRemovedOutOfStock,
    OrderCreated,
    OrderStatusChanged { from: OrderStatus, to: OrderStatus },
    ComplaintCreated,
    ComplaintStatusChanged { from: ComplaintStatus, to: ComplaintStatus },
    ComplaintAssigned,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::SupplierRegistered => f.write_str("SUPPLIER_REGISTERED"),
            AuditAction::ConsumerRegistered => f.write_str("CONSUMER_REGISTERED"),
            AuditAction::StaffRegistered => f.write_str("STAFF_REGISTERED"),
            AuditAction::LinkRequested => f.write_str("LINK_REQUESTED"),
            AuditAction::LinkApproved => f.write_str("LINK_APPROVED"),
            AuditAction::LinkDeclined => f.write_str("LINK_DECLINED"),
            AuditAction::LinkBlocked => f.write_str("LINK_BLOCKED"),
            AuditAction::ProductCreated => f.write_str("PRODUCT_CREATED"),
            AuditAction::ProductUpdated => f.write_str("PRODUCT_UPDATED"),
            AuditAction::ProductDeleted => f.write_str("PRODUCT_DELETED"),
            AuditAction::ProductRemovedOutOfStock => f.write_str("PRODUCT_REMOVED_OUT_OF_STOCK"),
            AuditAction::OrderCreated => f.write_str("ORDER_CREATED"),
            AuditAction::OrderStatusChanged { from, to } => {
                write!(f, "ORDER_STATUS_CHANGED_{}_TO_{}", from, to)
            }
            AuditAction::ComplaintCreated => f.write_str("COMPLAINT_CREATED"),
            AuditAction::ComplaintStatusChanged { from, to } => {
                write!(f, "COMPLAINT_STATUS_CHANGED_{}_TO_{}", from, to)
            }
            AuditAction::ComplaintAssigned => f.write_str("COMPLAINT_ASSIGNED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub user_id: i64,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: i64,
}

impl AuditEvent {
    pub fn new(user_id: i64, action: AuditAction, entity_type: EntityType, entity_id: i64) -> Self {
        Self { user_id, action, entity_type, entity_id }
    }
}

/// Resultado de uma operação do núcleo + os eventos de auditoria que ela gerou.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<AuditEvent>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, events: Vec<AuditEvent>) -> Self {
        Self { value, events }
    }

    pub fn single(value: T, event: AuditEvent) -> Self {
        Self { value, events: vec![event] }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome { value: f(self.value), events: self.events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_change_actions_encode_both_ends() {
        let action = AuditAction::OrderStatusChanged {
            from: OrderStatus::Pending,
            to: OrderStatus::Accepted,
        };
        assert_eq!(action.to_string(), "ORDER_STATUS_CHANGED_PENDING_TO_ACCEPTED");

        let action = AuditAction::ComplaintStatusChanged {
            from: ComplaintStatus::Open,
            to: ComplaintStatus::Escalated,
        };
        assert_eq!(action.to_string(), "COMPLAINT_STATUS_CHANGED_OPEN_TO_ESCALATED");
    }
}
