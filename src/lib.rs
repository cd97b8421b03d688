//! Relaycode: build Substrate extrinsics from runtime metadata in a TUI.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
