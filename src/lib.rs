//! Client for a local AI agent that streams its replies over HTTP.
//!
//! The engine lives in [`api::streaming`] (framing), [`session`] (dispatch
//! and the per-request state machine) and [`history`] (context window). The
//! [`ui`] module is one rendering layer on top of it.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod session;
pub mod ui;

pub use error::{ChatError, Result};
