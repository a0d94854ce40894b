pub mod api;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod fixture;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod reconcile;
pub mod source;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
