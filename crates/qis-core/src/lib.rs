pub mod config;
pub mod error;
pub mod logging;

pub mod filename;
pub mod message;
pub mod orchestrator;
pub mod platform;
pub mod profile;
pub mod service;
pub mod watcher;
