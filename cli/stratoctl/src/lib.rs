//! stratoctl - command-line client for the Strato cloud API.
//!
//! Most commands are thin: fetch a list, resolve what the user typed, call an
//! endpoint, print the result. The shared pieces live here:
//!
//! - [`resolve`]: free-text term → exactly one resource
//! - [`table`] and [`output`]: table, CSV and JSON rendering of any [`table::Tabular`] record
//! - [`order`] and [`progress`]: waiting for asynchronous provisioning with a spinner

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod logging;
pub mod order;
pub mod output;
pub mod progress;
pub mod resolve;
pub mod table;
