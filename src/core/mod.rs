pub mod auth;
pub mod chat_template;
pub mod error;
pub mod http;
pub mod message;
pub mod profile;
