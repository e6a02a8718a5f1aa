pub mod admin_access;
pub mod badge;
pub mod badge_store;
pub mod chat;
pub mod curated;
pub mod dictionary;
pub mod extractor;
pub mod practice;
pub mod reminder;
pub mod translation;
pub mod validation;
pub mod word_store;
