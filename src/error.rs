//! Error types shared by the binding tables and the trigger parser

use thiserror::Error;

/// Errors raised while configuring bindings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A descriptor token is neither a modifier keyword nor a known key name
    #[error("invalid trigger {descriptor:?}: unrecognised token {token:?}")]
    InvalidTriggerSyntax { descriptor: String, token: String },

    /// Neither the configuration nor the caller supplied a trigger
    #[error("behaviour {behaviour:?} has no configured trigger and no default")]
    MissingDefaultTrigger { behaviour: String },

    /// Write attempted through a read-only table view
    #[error("cannot {operation} on a read-only binding table")]
    ImmutableTableMutation { operation: &'static str },
}

impl BindingError {
    pub(crate) fn syntax(descriptor: &str, token: &str) -> Self {
        Self::InvalidTriggerSyntax {
            descriptor: descriptor.to_string(),
            token: token.to_string(),
        }
    }
}
