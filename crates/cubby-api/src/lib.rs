//! Cubby API
//!
//! HTTP surface over the storage core. Handlers are glue: credential
//! resolution, header parsing, and response shaping; every decision that
//! matters happens in `cubby-services`.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
