pub mod app;
pub mod cell;
pub mod client;
pub mod config;
pub mod edit;
pub mod errors;
pub mod handlers;
pub mod life;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod theme;
pub mod ui;
pub mod value;

pub use app::router;
pub use cell::CellKind;
pub use client::{ApiClient, ChatPoller};
pub use config::Config;
pub use state::AppState;
pub use stats::{MonthlyStats, monthly_stats};
pub use storage::load_data;
pub use sync::{MonthState, RecordStore, SyncController, SyncOutcome};
