//! Identity validation for registry names.

use std::sync::LazyLock;

use regex::Regex;

use super::Namespace;
use crate::error::VmnoopError;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("identifier pattern is a valid regex")
});

/// Validates a communicator, guest or capability name.
///
/// Names must start with an ASCII letter and contain only ASCII letters,
/// digits, `_` and `-`. Anything else (empty names, whitespace, dots) is
/// rejected so that `guest.capability` labels stay unambiguous.
pub(crate) fn validate_identifier(namespace: Namespace, name: &str) -> Result<(), VmnoopError> {
    if name.is_empty() {
        return Err(VmnoopError::InvalidIdentifier {
            namespace,
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    if !IDENTIFIER.is_match(name) {
        return Err(VmnoopError::InvalidIdentifier {
            namespace,
            name: name.to_string(),
            reason: "expected a letter followed by letters, digits, '_' or '-'".to_string(),
        });
    }
    Ok(())
}
