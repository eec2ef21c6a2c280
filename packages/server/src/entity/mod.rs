pub mod document;
pub mod folder;
pub mod folder_entry;
pub mod token_transaction;
pub mod user;
