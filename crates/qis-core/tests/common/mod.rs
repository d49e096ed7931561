//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod fake_platform;
pub mod image_server;
