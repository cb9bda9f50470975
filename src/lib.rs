// Hikyaku offline cache and background sync library

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod queue;
pub mod router;
pub mod sync;
pub mod worker;

pub use error::HikyakuError;
pub use worker::ServiceWorker;
