pub mod database;
pub mod metrics;
pub mod repository;

pub use self::metrics::{get_metrics, init_metrics};
pub use database::Database;
pub use repository::{AccountRepository, InMemoryAccountRepository};
