pub mod api;
pub mod circulation_desk;
