//! Device tree queries
//!
//! The board stage does not parse the flattened device tree itself; it only
//! needs three lookups, which the loader's FDT library provides:
//! - next node (in document order) with a given compatible string
//! - named child of a node
//! - raw property bytes

/// Offset of a node inside the structure block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeOffset(pub u32);

pub trait DeviceTree {
    /// First node after `from` (or from the root when `None`) whose
    /// `compatible` list contains `compatible`
    fn next_compatible(&self, from: Option<NodeOffset>, compatible: &str) -> Option<NodeOffset>;

    fn subnode(&self, parent: NodeOffset, name: &str) -> Option<NodeOffset>;

    fn property(&self, node: NodeOffset, name: &str) -> Option<&[u8]>;
}

/// Document-order walk over every node matching a compatible string
pub struct CompatibleNodes<'t, T: DeviceTree + ?Sized> {
    tree: &'t T,
    compatible: &'t str,
    last: Option<NodeOffset>,
    remaining: usize,
}

impl<'t, T: DeviceTree + ?Sized> CompatibleNodes<'t, T> {
    /// Visit at most `limit` matching nodes
    pub fn new(tree: &'t T, compatible: &'t str, limit: usize) -> Self {
        Self {
            tree,
            compatible,
            last: None,
            remaining: limit,
        }
    }
}

impl<T: DeviceTree + ?Sized> Iterator for CompatibleNodes<'_, T> {
    type Item = NodeOffset;

    fn next(&mut self) -> Option<NodeOffset> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.tree.next_compatible(self.last, self.compatible)?;
        // A tree that does not advance would loop forever
        if self.last.is_some_and(|last| node <= last) {
            self.remaining = 0;
            return None;
        }
        self.last = Some(node);
        self.remaining -= 1;
        Some(node)
    }
}
