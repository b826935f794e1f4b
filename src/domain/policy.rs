// src/domain/policy.rs
//
// Decisão de permissões pura: dado o papel, a transição pedida e a relação do
// ator com a entidade, diz se a transição é permitida. Nada aqui toca no banco.

use crate::{
    common::error::AppError,
    models::{
        auth::{Role, User},
        complaint::ComplaintStatus,
        link::LinkStatus,
        order::OrderStatus,
    },
};

/// Quem está agindo: a parte do usuário autenticado que as regras precisam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
    pub supplier_id: Option<i64>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            supplier_id: user.supplier_id,
        }
    }
}

impl Actor {
    pub fn is_consumer(&self) -> bool {
        self.role == Role::Consumer
    }

    /// "Staff do fornecedor": OWNER, MANAGER ou SALES com fornecedor definido.
    /// Devolve o fornecedor para evitar um segundo unwrap no chamador.
    pub fn staff_supplier(&self) -> Option<i64> {
        match self.role {
            Role::Owner | Role::Manager | Role::Sales => self.supplier_id,
            Role::Consumer => None,
        }
    }

    /// "Admin do fornecedor": OWNER ou MANAGER com fornecedor definido.
    pub fn admin_supplier(&self) -> Option<i64> {
        match self.role {
            Role::Owner | Role::Manager => self.supplier_id,
            Role::Sales | Role::Consumer => None,
        }
    }

    pub fn require_consumer(&self) -> Result<(), AppError> {
        if self.is_consumer() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Apenas consumidores podem realizar esta ação.".into(),
            ))
        }
    }

    pub fn require_staff(&self) -> Result<i64, AppError> {
        self.staff_supplier().ok_or_else(|| {
            AppError::Forbidden("Apenas a equipe do fornecedor pode realizar esta ação.".into())
        })
    }

    pub fn require_admin(&self) -> Result<i64, AppError> {
        self.admin_supplier().ok_or_else(|| {
            AppError::Forbidden(
                "Apenas donos ou gerentes do fornecedor podem realizar esta ação.".into(),
            )
        })
    }

    /// Relação do ator com uma entidade que pertence ao par (consumidor, fornecedor).
    pub fn relationship(&self, consumer_id: i64, supplier_id: i64) -> Relationship {
        if self.is_consumer() {
            if self.user_id == consumer_id {
                return Relationship::Party;
            }
            return Relationship::Unrelated;
        }
        match self.staff_supplier() {
            Some(own) if own == supplier_id => Relationship::SupplierStaff,
            _ => Relationship::Unrelated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// O consumidor dono da entidade (consumidor do link/pedido, autor da reclamação)
    Party,
    /// Staff do fornecedor dono da entidade
    SupplierStaff,
    Unrelated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Link { from: LinkStatus, to: LinkStatus },
    Order { from: OrderStatus, to: OrderStatus },
    Complaint { from: ComplaintStatus, to: ComplaintStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Forbidden(String),
    InvalidState(String),
    InvalidTarget(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    fn forbidden(msg: &str) -> Self {
        Decision::Deny(Denial::Forbidden(msg.to_string()))
    }

    fn invalid_state(msg: impl Into<String>) -> Self {
        Decision::Deny(Denial::InvalidState(msg.into()))
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial.into()),
        }
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Forbidden(msg) => AppError::Forbidden(msg),
            Denial::InvalidState(msg) => AppError::InvalidState(msg),
            Denial::InvalidTarget(msg) => AppError::ValidationFailed(msg),
        }
    }
}

pub fn can_transition(role: Role, transition: Transition, relationship: Relationship) -> Decision {
    match transition {
        Transition::Link { from, to } => link_transition(role, from, to, relationship),
        Transition::Order { from, to } => order_transition(role, from, to, relationship),
        Transition::Complaint { from, to } => complaint_transition(role, from, to, relationship),
    }
}

fn is_admin_role(role: Role) -> bool {
    matches!(role, Role::Owner | Role::Manager)
}

fn link_transition(role: Role, from: LinkStatus, to: LinkStatus, rel: Relationship) -> Decision {
    if rel != Relationship::SupplierStaff || !is_admin_role(role) {
        return Decision::forbidden(
            "Apenas donos ou gerentes do fornecedor podem alterar este vínculo.",
        );
    }

    match to {
        LinkStatus::Approved | LinkStatus::Declined => {
            if from == LinkStatus::Pending {
                Decision::Allow
            } else {
                Decision::invalid_state(format!(
                    "O vínculo não está pendente (status atual: {}).",
                    from
                ))
            }
        }
        // Bloqueio não tem pré-condição
        LinkStatus::Blocked => Decision::Allow,
        LinkStatus::Pending => Decision::invalid_state("Um vínculo não pode voltar para PENDING."),
    }
}

fn order_transition(role: Role, from: OrderStatus, to: OrderStatus, rel: Relationship) -> Decision {
    if rel != Relationship::SupplierStaff || !is_admin_role(role) {
        return Decision::forbidden(
            "Apenas donos ou gerentes do fornecedor podem alterar pedidos do fornecedor.",
        );
    }

    if to == OrderStatus::Pending {
        return Decision::Deny(Denial::InvalidTarget(
            "Status inválido. Permitidos: ACCEPTED, REJECTED, COMPLETED.".into(),
        ));
    }

    if from == OrderStatus::Completed {
        return Decision::invalid_state("Não é possível alterar o status de um pedido concluído.");
    }

    match (from, to) {
        (OrderStatus::Pending, OrderStatus::Accepted)
        | (OrderStatus::Pending, OrderStatus::Rejected)
        | (OrderStatus::Accepted, OrderStatus::Completed) => Decision::Allow,
        _ => Decision::invalid_state(format!(
            "Transição de pedido inválida: {} -> {}.",
            from, to
        )),
    }
}

fn complaint_transition(
    role: Role,
    from: ComplaintStatus,
    to: ComplaintStatus,
    rel: Relationship,
) -> Decision {
    // 1. Regras por papel
    match (role, rel) {
        (_, Relationship::Unrelated) => {
            return Decision::forbidden(
                "Você só pode alterar suas reclamações ou as dos pedidos do seu fornecedor.",
            );
        }
        (Role::Consumer, Relationship::Party) => {
            if to != ComplaintStatus::Resolved {
                return Decision::forbidden(
                    "Consumidores só podem marcar reclamações como resolvidas.",
                );
            }
        }
        (Role::Sales, Relationship::SupplierStaff) => match from {
            ComplaintStatus::Open => {
                if !matches!(to, ComplaintStatus::Escalated | ComplaintStatus::Resolved) {
                    return Decision::forbidden(
                        "Vendas só pode escalar ou resolver reclamações abertas.",
                    );
                }
            }
            ComplaintStatus::Escalated => {
                return Decision::forbidden(
                    "Vendas não pode alterar reclamações escaladas (requer gerente ou dono).",
                );
            }
            ComplaintStatus::Resolved => {}
        },
        (Role::Owner | Role::Manager, Relationship::SupplierStaff) => {}
        _ => {
            return Decision::forbidden("Você não pode alterar esta reclamação.");
        }
    }

    // 2. Máquina de estados, igual para todos
    match (from, to) {
        (ComplaintStatus::Resolved, ComplaintStatus::Resolved) => {
            Decision::invalid_state("A reclamação já está resolvida.")
        }
        (ComplaintStatus::Resolved, _) => {
            Decision::invalid_state("Reclamações resolvidas não podem ser reabertas.")
        }
        (_, ComplaintStatus::Open) => {
            Decision::invalid_state("Uma reclamação não pode voltar para OPEN.")
        }
        (ComplaintStatus::Escalated, ComplaintStatus::Escalated) => {
            Decision::invalid_state("Só é possível escalar reclamações abertas.")
        }
        (ComplaintStatus::Open, ComplaintStatus::Escalated)
        | (ComplaintStatus::Open, ComplaintStatus::Resolved)
        | (ComplaintStatus::Escalated, ComplaintStatus::Resolved) => Decision::Allow,
    }
}

/// Atribuição de responsável: nunca para consumidor; staff só do próprio fornecedor.
/// Vendas também não mexe em reclamação escalada.
pub fn can_assign(role: Role, current: ComplaintStatus, relationship: Relationship) -> Decision {
    if role == Role::Consumer {
        return Decision::forbidden("Consumidores não podem atribuir reclamações.");
    }
    if relationship != Relationship::SupplierStaff {
        return Decision::forbidden("Você só pode atribuir reclamações do seu fornecedor.");
    }
    if role == Role::Sales && current == ComplaintStatus::Escalated {
        return Decision::forbidden(
            "Vendas não pode alterar reclamações escaladas (requer gerente ou dono).",
        );
    }
    Decision::Allow
}
