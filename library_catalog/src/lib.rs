pub mod api;
pub mod catalog;
pub mod catalog_storage;
