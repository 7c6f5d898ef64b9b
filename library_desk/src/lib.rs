pub mod app_config;
pub mod desk;
pub mod render;
pub mod telemetry;
