//! InternPath Assistant: keyword dialogue engine and guided SMS setup.

pub mod config;
pub mod dialogue;
pub mod error;
pub mod services;
pub mod setup;
pub mod speech;
pub mod store;
pub mod templates;
