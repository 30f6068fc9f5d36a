//! Handler builders and associated traits.
//!
//! Provides a minimal builder API for constructing handlers in a
//! type‑safe manner. Each builder implements [`HandlerBuilderTrait`] which
//! validates the collected options before producing the concrete handler.

use std::io;

use thiserror::Error;

mod builder_macros;
pub mod discord_builder;

pub(crate) use builder_macros::ensure_positive;
pub use discord_builder::DiscordHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// The TLS backend could not be initialised.
    #[error("failed to initialise TLS: {0}")]
    Tls(#[from] native_tls::Error),
    /// Underlying I/O error whilst creating the handler.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait {
    /// Concrete handler type produced by the builder.
    type Handler;

    /// Validate the builder state and construct the handler.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;
}
