pub mod accounts;
pub mod health;

pub use accounts::{create_account, delete_account, list_accounts, read_account, update_account};
pub use health::{health_check, index, metrics_endpoint, readiness_check};
