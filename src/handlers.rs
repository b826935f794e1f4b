pub mod auth;
pub mod catalog;
pub mod complaints;
pub mod links;
pub mod messages;
pub mod orders;
pub mod system;
