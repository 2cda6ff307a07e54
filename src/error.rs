//! Domain-specific error types for vmnoop.
//!
//! This module defines `VmnoopError`, a `thiserror`-based enum that
//! provides typed error variants for registry, manifest and I/O failures.
//! Library functions return `Result<T, VmnoopError>` so callers can tell a
//! configuration mistake apart from a failed lookup, while the CLI layer
//! wraps them in `anyhow::Error` with extra context.

use std::io;

use crate::registry::Namespace;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)").
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for vmnoop.
///
/// Variants fall into two families:
/// - configuration errors, raised while a registry is being populated
///   ([`is_configuration`](Self::is_configuration));
/// - resolution errors, raised when a lookup names something that was never
///   registered ([`is_resolution`](Self::is_resolution)).
///
/// A successful no-op is always `Ok(true)`, never one of these.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VmnoopError {
    /// The same identity was registered twice under `DuplicatePolicy::Reject`.
    #[error("{namespace} '{name}' is already registered")]
    DuplicateRegistration {
        /// Namespace the identity was registered in.
        namespace: Namespace,
        /// The conflicting identity (`guest.capability` for capabilities).
        name: String,
    },

    /// An identity does not match the allowed naming pattern.
    #[error("invalid {namespace} name '{name}': {reason}")]
    InvalidIdentifier {
        namespace: Namespace,
        name: String,
        reason: String,
    },

    /// A capability was bound to a guest that never got registered.
    #[error("capability '{capability}' is bound to unregistered guest '{guest}'")]
    OrphanCapability { guest: String, capability: String },

    /// A lookup named a communicator or guest that is not registered.
    #[error("{namespace} '{name}' is not registered")]
    NotFound { namespace: Namespace, name: String },

    /// The guest is registered but has no handler for this capability.
    #[error("guest '{guest}' does not support capability '{capability}'")]
    UnsupportedCapability { guest: String, capability: String },

    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A manifest could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred, usually a file path.
        context: String,
        /// Derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl VmnoopError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }

    /// Returns true for errors raised while populating a registry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRegistration { .. }
                | Self::InvalidIdentifier { .. }
                | Self::OrphanCapability { .. }
        )
    }

    /// Returns true for failed registry lookups.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnsupportedCapability { .. })
    }
}
