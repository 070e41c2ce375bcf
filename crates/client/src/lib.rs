//! Polling client for Hexline.
//!
//! The rules engine is the sole authority over the board. This crate fetches
//! its state on a fixed cadence, decides locally whether we may move, and
//! turns two point clicks into a move request.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod session;
pub mod sync;
pub mod ticker;

pub use api::{GameApi, HttpGameApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::ClientSession;
pub use sync::{Mutation, RefreshOutcome, SyncEngine};
