pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod report;
pub mod slug;
pub mod spectrum;
pub mod store;
pub mod table;
