use std::ops::Range;

use crate::sphere::Sphere;

/// A node of the tree arena. Nodes refer to each other by slot id.
///
/// `range` addresses the node's points in tree order; leaves own that range
/// directly, internal nodes cover the union of their children.
#[derive(Clone, Debug)]
pub struct Node {
    pub slot_id: usize,
    pub height: usize,
    pub parent: usize,
    pub sphere: Sphere,
    pub range: Range<usize>,
    pub children: Option<[usize; 2]>,
}

impl Node {
    #[must_use]
    pub fn new(slot_id: usize, parent: usize, sphere: Sphere, range: Range<usize>) -> Node {
        Node {
            slot_id,
            height: 0,
            parent,
            sphere,
            range,
            children: None,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent == usize::MAX
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.range.len()
    }
}
