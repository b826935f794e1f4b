pub mod audit;
pub mod auth;
pub mod catalog;
pub mod complaint;
pub mod link;
pub mod message;
pub mod order;
pub mod supplier;
