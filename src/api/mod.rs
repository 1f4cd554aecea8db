// Application-facing surface: client registry and tracing setup.

pub mod logging;
pub mod registry;
