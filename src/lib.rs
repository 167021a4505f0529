//! Linkflow: a personal link library that moves captured bookmarks through a
//! triage lifecycle and derives projects and reference collections from them.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod rpc_handler;
pub mod types;
