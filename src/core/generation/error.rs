//! Generation error taxonomy

use super::contracts::{ContractViolation, ViolationKind};
use crate::core::library::LibraryError;
use crate::core::llm::ProviderError;

/// Errors that can occur while generating, saving or augmenting content
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    #[error("Invalid input for {flow}: {violation}")]
    InvalidInput {
        flow: String,
        violation: ContractViolation,
    },

    #[error("Provider error in {flow}: {source}")]
    Provider {
        flow: String,
        source: ProviderError,
    },

    #[error("Provider timed out in {flow}")]
    Timeout { flow: String },

    #[error("Malformed output from {flow}: {reason}")]
    MalformedOutput { flow: String, reason: String },

    #[error("No artifact produced by {flow}")]
    NoArtifactProduced { flow: String },

    #[error("Save failed: {0}")]
    SaveFailed(#[from] LibraryError),

    #[error("Augmentation failed for '{key}': {source}")]
    AugmentationFailed {
        key: String,
        source: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Message suitable for showing to the facilitator
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::UnknownFlow(id) => {
                format!("This generator is not available (unknown flow '{}').", id)
            }
            GenerationError::InvalidInput { violation, .. } => match &violation.kind {
                ViolationKind::EmptyCustomValue => format!(
                    "Please enter a custom value for '{}' before generating.",
                    violation.field
                ),
                kind => format!("Please check '{}': {}.", violation.field, kind),
            },
            GenerationError::Provider { source, .. } => match source {
                ProviderError::NotConfigured(_) | ProviderError::Auth(_) => {
                    "The content service is not configured correctly. Check your API key.".to_string()
                }
                ProviderError::RateLimited { .. } => {
                    "The content service is busy right now. Wait a moment and regenerate.".to_string()
                }
                _ => "The content service returned an error. Try regenerating.".to_string(),
            },
            GenerationError::Timeout { .. } => {
                "The content service took too long to respond. Try regenerating.".to_string()
            }
            GenerationError::MalformedOutput { .. } => {
                "The generated content was incomplete or garbled. Try regenerating.".to_string()
            }
            GenerationError::NoArtifactProduced { .. } => {
                "No image was produced. Try regenerating.".to_string()
            }
            GenerationError::SaveFailed(_) => {
                "Could not save to the library. Your result is still here; try saving again."
                    .to_string()
            }
            GenerationError::AugmentationFailed { key, .. } => {
                format!("Could not generate content for '{}'. Try again.", key)
            }
        }
    }

    /// Whether the user can fix this by retrying (regenerate or save again).
    ///
    /// Unknown flows and invalid input stay broken until something else
    /// changes.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GenerationError::UnknownFlow(_)
            | GenerationError::InvalidInput { .. } => false,
            GenerationError::Provider { source, .. } => {
                !matches!(source, ProviderError::NotConfigured(_) | ProviderError::Auth(_))
            }
            GenerationError::Timeout { .. }
            | GenerationError::MalformedOutput { .. }
            | GenerationError::NoArtifactProduced { .. }
            | GenerationError::SaveFailed(_)
            | GenerationError::AugmentationFailed { .. } => true,
        }
    }

    /// Flow id the error belongs to, where there is one
    pub fn flow(&self) -> Option<&str> {
        match self {
            GenerationError::UnknownFlow(id) => Some(id),
            GenerationError::InvalidInput { flow, .. }
            | GenerationError::Provider { flow, .. }
            | GenerationError::Timeout { flow }
            | GenerationError::MalformedOutput { flow, .. }
            | GenerationError::NoArtifactProduced { flow } => Some(flow),
            GenerationError::AugmentationFailed { source, .. } => source.flow(),
            GenerationError::SaveFailed(_) => None,
        }
    }
}
