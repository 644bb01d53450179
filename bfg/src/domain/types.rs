//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep arena indices and durations from being mixed
//! up with plain counters in the recorder and serializer.

use std::fmt;
use std::time::Duration;

/// Index of a node in the recorder's call tree arena
///
/// `NodeId::ROOT` is the synthetic whole-application frame and always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The synthetic root frame
    pub const ROOT: NodeId = NodeId(0);

    /// Returns true for the synthetic root frame
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

/// Accumulated time in microseconds
///
/// All cumulative frame times in the call tree use this unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Micros(pub u64);

impl Micros {
    pub const ZERO: Micros = Micros(0);

    /// Add another duration, saturating instead of wrapping
    #[must_use]
    pub fn saturating_add(self, other: Micros) -> Micros {
        Micros(self.0.saturating_add(other.0))
    }
}

impl From<Duration> for Micros {
    fn from(d: Duration) -> Self {
        // u128 -> u64: a session would need to run ~580k years to overflow
        Micros(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}µs", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_from_duration() {
        assert_eq!(Micros::from(Duration::from_millis(3)), Micros(3000));
        assert_eq!(Micros::from(Duration::from_nanos(999)), Micros(0));
    }

    #[test]
    fn test_micros_saturates() {
        assert_eq!(Micros(u64::MAX).saturating_add(Micros(1)), Micros(u64::MAX));
    }

    #[test]
    fn test_root_node_id() {
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId(3).is_root());
        assert_eq!(NodeId(3).to_string(), "Node#3");
    }
}
