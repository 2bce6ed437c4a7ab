//! Account Service - CRUD REST API for customer accounts.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
