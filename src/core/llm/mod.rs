//! LLM Module
//!
//! The model provider boundary used by the generation pipeline, and the
//! concrete providers behind it.

pub mod error;
pub mod provider;
pub mod providers;

pub use error::ProviderError;
pub use provider::{ModelProvider, ModelReply, ModelRequest};
pub use providers::GoogleProvider;
