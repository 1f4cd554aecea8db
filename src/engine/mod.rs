// Engine orchestration: session lifecycle, background timers and gated data operations.

pub mod archive;
pub mod auth;
pub mod health;
pub mod live;
pub mod refresh;
pub mod session;
pub mod state;
pub mod stats;
