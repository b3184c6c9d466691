//! The contract every hosted resource implements
//!
//! A handler owns one resource's in-memory state. It renders that state as a
//! [`Representation`], and applies incoming update fragments. Updates are
//! all-or-nothing: a handler validates every recognized attribute before it
//! touches its device or its own fields, so a rejected update leaves nothing
//! behind.

use resource_model::{Representation, ResourceError, Result};
use std::ops::RangeInclusive;

/// How a handler answers read requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Answer on the requesting thread
    #[default]
    Immediate,
    /// Acknowledge at once and complete the response from the worker pool
    Deferred,
}

/// Server-side behavior of one resource type
pub trait ResourceHandler: Send + Sync {
    /// Resource type string used for discovery matching
    fn resource_type(&self) -> &'static str;

    fn read_mode(&self) -> ReadMode {
        ReadMode::Immediate
    }

    /// Current state as a representation
    fn representation(&self) -> Representation;

    /// Validate and apply an update fragment
    ///
    /// Unknown attributes are ignored. A recognized attribute with the wrong
    /// type or an out-of-range value rejects the whole fragment with
    /// [`ResourceError::Validation`]; a device failure rejects it with
    /// [`ResourceError::Internal`]. Either way the handler is unchanged.
    fn update(&mut self, fragment: &Representation) -> Result<()>;
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Read an optional integer attribute and check it against `range`
pub fn int_in_range(
    fragment: &Representation,
    name: &str,
    range: RangeInclusive<i64>,
) -> Result<Option<i64>> {
    match fragment.get_int(name)? {
        Some(v) if !range.contains(&v) => Err(ResourceError::Validation(format!(
            "{} must be within {}..={}, got {}",
            name,
            range.start(),
            range.end(),
            v
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, true)]
    #[case(100, true)]
    #[case(101, false)]
    #[case(-1, false)]
    fn test_int_in_range(#[case] value: i64, #[case] accepted: bool) {
        let fragment = Representation::new().with("level", value);
        let result = int_in_range(&fragment, "level", 0..=100);
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn test_int_in_range_absent_and_wrong_type() {
        let empty = Representation::new();
        assert_eq!(int_in_range(&empty, "level", 0..=100).unwrap(), None);

        let wrong = Representation::new().with("level", "high");
        assert!(matches!(
            int_in_range(&wrong, "level", 0..=100),
            Err(ResourceError::Validation(_))
        ));
    }
}
