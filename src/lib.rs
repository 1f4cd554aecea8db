//! Async client for the Trassir video surveillance HTTP API.
//!
//! [`SessionEngine`] logs in, keeps the session alive with a periodic probe,
//! re-authenticates with a fixed backoff when the session is lost, refreshes
//! the settings and channel caches, and gates every data operation on a
//! usable session. [`ClientRegistry`] keeps one engine per server.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod media;
pub mod transport;

pub use api::logging::init_tracing;
pub use api::registry::ClientRegistry;
pub use config::{ConnectionId, ConnectionOptions, SessionTimings};
pub use engine::session::SessionEngine;
pub use engine::state::Phase;
pub use engine::stats::StatsSnapshot;
pub use error::{ClientError, Result};
pub use media::container::VideoContainer;
