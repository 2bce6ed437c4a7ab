//! Domain models for account-service.

mod account;

pub use account::{Account, DataValidationError};
