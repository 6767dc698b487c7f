// donorwatch library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod poller;
