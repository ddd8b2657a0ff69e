pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod form;
pub mod providers;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
