//! Tree walks shared by all query types.
//!
//! A driver decides the visiting order and prunes any node (or node pair)
//! whose lower distance bound exceeds the visitor's cutoff. The visitor
//! decides what an unpruned node means for its task: either it settles the
//! whole subtree at once ([`Visit::Accept`]) or asks to go deeper.

use crate::{heap::NodeHeap, metric::Bounds, node::Node, tree::BallTree};

pub(crate) enum Visit {
    Accept,
    Descend,
}

pub(crate) trait SingleTreeVisitor {
    /// Nodes whose lower bound exceeds this distance are skipped.
    fn cutoff(&self) -> f64 {
        f64::INFINITY
    }

    fn visit_node(
        &mut self,
        tree: &BallTree,
        node: &Node,
        query: &[f64],
        bounds: Bounds,
    ) -> Visit;

    fn visit_leaf(&mut self, tree: &BallTree, node: &Node, query: &[f64]);
}

pub(crate) trait DualTreeVisitor {
    /// Pairs whose lower bound exceeds this distance are skipped.
    fn cutoff(&self, _query_node: &Node) -> f64 {
        f64::INFINITY
    }

    fn visit_pair(
        &mut self,
        query_node: &Node,
        reference_node: &Node,
        bounds: Bounds,
    ) -> Visit;

    fn visit_leaves(
        &mut self,
        query_tree: &BallTree,
        query_node: &Node,
        reference_tree: &BallTree,
        reference_node: &Node,
    );

    /// Recomputes per-node state of `query_node` from its children.
    fn refresh(&mut self, query_node: &Node);
}

#[derive(Default)]
struct Stats {
    visited: usize,
    pruned: usize,
}

impl Stats {
    fn log(&self, driver: &str) {
        log::trace!(
            "{driver}: visited {} nodes, pruned {}",
            self.visited,
            self.pruned
        );
    }
}

fn point_bounds(tree: &BallTree, slot_id: usize, query: &[f64]) -> Bounds {
    tree.node(slot_id).sphere.point_bounds(tree.metric(), query)
}

fn pair_bounds(query_tree: &BallTree, query: usize, tree: &BallTree, reference: usize) -> Bounds {
    query_tree
        .node(query)
        .sphere
        .sphere_bounds(tree.metric(), &tree.node(reference).sphere)
}

fn nearest_first(mut children: [(usize, Bounds); 2]) -> [(usize, Bounds); 2] {
    if children[1].1.lower < children[0].1.lower {
        children.swap(0, 1);
    }
    children
}

pub(crate) fn single_tree<V: SingleTreeVisitor>(
    tree: &BallTree,
    query: &[f64],
    visitor: &mut V,
    breadth_first: bool,
) {
    if breadth_first {
        self::breadth_first(tree, query, visitor);
    } else {
        depth_first(tree, query, visitor);
    }
}

pub(crate) fn dual_tree<V: DualTreeVisitor>(
    query_tree: &BallTree,
    tree: &BallTree,
    visitor: &mut V,
    breadth_first: bool,
) {
    if breadth_first {
        dual_breadth_first(query_tree, tree, visitor);
    } else {
        dual_depth_first(query_tree, tree, visitor);
    }
}

/// Recursive descent, nearer child first.
pub(crate) fn depth_first<V: SingleTreeVisitor>(tree: &BallTree, query: &[f64], visitor: &mut V) {
    let mut stats = Stats::default();
    let root = tree.root();
    descend(
        tree,
        query,
        visitor,
        root,
        point_bounds(tree, root, query),
        &mut stats,
    );
    stats.log("depth-first");
}

fn descend<V: SingleTreeVisitor>(
    tree: &BallTree,
    query: &[f64],
    visitor: &mut V,
    slot_id: usize,
    bounds: Bounds,
    stats: &mut Stats,
) {
    if bounds.lower > visitor.cutoff() {
        stats.pruned += 1;
        return;
    }
    stats.visited += 1;

    let node = tree.node(slot_id);
    if let Visit::Accept = visitor.visit_node(tree, node, query, bounds) {
        return;
    }
    match node.children {
        None => visitor.visit_leaf(tree, node, query),
        Some([left, right]) => {
            let children = nearest_first([
                (left, point_bounds(tree, left, query)),
                (right, point_bounds(tree, right, query)),
            ]);
            for (child, child_bounds) in children {
                descend(tree, query, visitor, child, child_bounds, stats);
            }
        }
    }
}

/// Visits nodes in ascending order of their lower bound and stops as soon as
/// the closest remaining node is beyond the cutoff.
pub(crate) fn breadth_first<V: SingleTreeVisitor>(
    tree: &BallTree,
    query: &[f64],
    visitor: &mut V,
) {
    let mut stats = Stats::default();
    let mut queue = NodeHeap::new();
    let root = tree.root();
    queue.push(point_bounds(tree, root, query), root);

    while let Some((bounds, slot_id)) = queue.pop() {
        if bounds.lower > visitor.cutoff() {
            stats.pruned += 1;
            break;
        }
        stats.visited += 1;

        let node = tree.node(slot_id);
        if let Visit::Accept = visitor.visit_node(tree, node, query, bounds) {
            continue;
        }
        match node.children {
            None => visitor.visit_leaf(tree, node, query),
            Some(children) => {
                for child in children {
                    queue.push(point_bounds(tree, child, query), child);
                }
            }
        }
    }
    stats.log("breadth-first");
}

/// Recursive descent over (query node, reference node) pairs.
pub(crate) fn dual_depth_first<V: DualTreeVisitor>(
    query_tree: &BallTree,
    tree: &BallTree,
    visitor: &mut V,
) {
    let mut stats = Stats::default();
    let (query_root, root) = (query_tree.root(), tree.root());
    dual_descend(
        query_tree,
        query_root,
        tree,
        root,
        pair_bounds(query_tree, query_root, tree, root),
        visitor,
        &mut stats,
    );
    stats.log("dual depth-first");
}

fn dual_descend<V: DualTreeVisitor>(
    query_tree: &BallTree,
    query: usize,
    tree: &BallTree,
    reference: usize,
    bounds: Bounds,
    visitor: &mut V,
    stats: &mut Stats,
) {
    let query_node = query_tree.node(query);
    if bounds.lower > visitor.cutoff(query_node) {
        stats.pruned += 1;
        return;
    }
    stats.visited += 1;

    let reference_node = tree.node(reference);
    if let Visit::Accept = visitor.visit_pair(query_node, reference_node, bounds) {
        return;
    }

    match (query_node.children, reference_node.children) {
        (None, None) => visitor.visit_leaves(query_tree, query_node, tree, reference_node),
        (None, Some(references)) => {
            for (child, child_bounds) in split_reference(query_tree, query, tree, references) {
                dual_descend(query_tree, query, tree, child, child_bounds, visitor, stats);
            }
        }
        (Some(queries), None) => {
            for child in queries {
                let child_bounds = pair_bounds(query_tree, child, tree, reference);
                dual_descend(query_tree, child, tree, reference, child_bounds, visitor, stats);
            }
            visitor.refresh(query_node);
        }
        (Some(queries), Some(references)) => {
            for query_child in queries {
                for (child, child_bounds) in
                    split_reference(query_tree, query_child, tree, references)
                {
                    dual_descend(
                        query_tree,
                        query_child,
                        tree,
                        child,
                        child_bounds,
                        visitor,
                        stats,
                    );
                }
            }
            visitor.refresh(query_node);
        }
    }
}

fn split_reference(
    query_tree: &BallTree,
    query: usize,
    tree: &BallTree,
    references: [usize; 2],
) -> [(usize, Bounds); 2] {
    nearest_first(references.map(|child| (child, pair_bounds(query_tree, query, tree, child))))
}

/// Visits node pairs in ascending order of their lower bound. Pruning is
/// decided per query node, so a pruned pair does not end the walk.
pub(crate) fn dual_breadth_first<V: DualTreeVisitor>(
    query_tree: &BallTree,
    tree: &BallTree,
    visitor: &mut V,
) {
    let mut stats = Stats::default();
    let mut queue = NodeHeap::new();
    let (query_root, root) = (query_tree.root(), tree.root());
    queue.push(
        pair_bounds(query_tree, query_root, tree, root),
        (query_root, root),
    );

    while let Some((bounds, (query, reference))) = queue.pop() {
        let query_node = query_tree.node(query);
        if bounds.lower > visitor.cutoff(query_node) {
            stats.pruned += 1;
            continue;
        }
        stats.visited += 1;

        let reference_node = tree.node(reference);
        if let Visit::Accept = visitor.visit_pair(query_node, reference_node, bounds) {
            refresh_ancestors(query_tree, query_node, visitor);
            continue;
        }

        match (query_node.children, reference_node.children) {
            (None, None) => {
                visitor.visit_leaves(query_tree, query_node, tree, reference_node);
                refresh_ancestors(query_tree, query_node, visitor);
            }
            (None, Some(references)) => {
                for child in references {
                    queue.push(pair_bounds(query_tree, query, tree, child), (query, child));
                }
            }
            (Some(queries), None) => {
                for child in queries {
                    queue.push(
                        pair_bounds(query_tree, child, tree, reference),
                        (child, reference),
                    );
                }
            }
            (Some(queries), Some(references)) => {
                for query_child in queries {
                    for child in references {
                        queue.push(
                            pair_bounds(query_tree, query_child, tree, child),
                            (query_child, child),
                        );
                    }
                }
            }
        }
    }
    stats.log("dual breadth-first");
}

fn refresh_ancestors<V: DualTreeVisitor>(query_tree: &BallTree, node: &Node, visitor: &mut V) {
    let mut node = node;
    while !node.is_root() {
        node = query_tree.node(node.parent);
        visitor.refresh(node);
    }
}
