use std::sync::atomic::{AtomicU64, Ordering};

use crate::define_wrapper_type;

define_wrapper_type!(
    /// The identifier of a supervised node, used to tell nodes apart in logs and in directory
    /// names.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct NodeId(u64)
    impl Display, FromStr;
);

/// A monotonically increasing sequence owned by whoever creates nodes.
///
/// Harnesses create one generator per test context and pass it to every node they create, which
/// keeps identifiers unique within that context without any process-wide state.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_value(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.next_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_independent() {
        // Arrange
        let first = SequenceGenerator::new();
        let second = SequenceGenerator::starting_at(10);

        // Act
        let values = [
            first.next_value(),
            first.next_value(),
            second.next_value(),
            first.next_value(),
        ];

        // Assert
        assert_eq!(values, [0, 1, 10, 2]);
        assert_eq!(second.next_node_id(), NodeId::new(11u64));
        assert_eq!("7".parse::<NodeId>().unwrap().to_string(), "7");
    }
}
