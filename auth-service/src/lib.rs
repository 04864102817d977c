pub mod app;
pub mod config;
pub mod ledger;
pub mod session_handlers;
pub mod store;
pub mod tenant_directory;

pub use app::AppState;
