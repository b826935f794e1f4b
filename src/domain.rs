pub mod audit;
pub use audit::{AuditAction, AuditEvent, EntityType, Outcome};
pub mod policy;
pub use policy::{can_assign, can_transition, Actor, Decision, Relationship, Transition};
pub mod pricing;
pub mod stock_policy;
