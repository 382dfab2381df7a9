//! # Orchestra Extension Kernel
//!
//! Application wiring for the extension engine.
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application)
//!   builds the storage, configuration, memory and catalog from
//!   [`Settings`](settings::Settings) and runs the shutdown hook.
//! - **Core Constants**: manifest and bootstrap file names, configuration and
//!   memory keys, and the reserved extension names in `constants`.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) and `Result`
//!   alias in `error`.
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod settings;

pub use bootstrap::Application;
pub use error::{Error, Result};
pub use settings::Settings;
// Test module declaration
#[cfg(test)]
mod tests;
