pub mod account;
pub mod auth;
pub mod client;
pub mod endpoint;
pub mod eventlog;
pub mod groups;
pub mod models;
pub mod nodes;
pub mod pagination;
pub mod public;
pub mod users;

pub use client::{DracoonClient, API_PATH};
pub use endpoint::{Endpoint, ListQuery};
