//! Command handlers.

pub mod classify;
pub mod config;
pub mod interactive;
pub mod models;
