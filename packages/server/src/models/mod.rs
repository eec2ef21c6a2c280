pub mod auth;
pub mod document;
pub mod tokens;
pub mod upload;
