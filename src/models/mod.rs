pub mod chat;
pub mod recipe;
