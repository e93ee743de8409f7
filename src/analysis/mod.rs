//! Text Analysis Layer
//!
//! Decides which parts of the recognized text are secret.

pub mod secrets;

pub use secrets::{load_secret_patterns, SecretLocator, SecretPattern, DEFAULT_PADDING};
