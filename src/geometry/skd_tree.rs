//! Skd-tree: a bounding-volume hierarchy over cell bounding boxes.
//!
//! The tree is a derived, cached structure; [`crate::geometry::MeshPatch`]
//! owns one per geometry version and rebuilds it lazily after topology
//! edits. Construction is a median split on the longest axis of centroid
//! spread. Queries take an absolute tolerance in mesh coordinate units and
//! report every cell whose box, inflated by that tolerance, overlaps the
//! query volume.

use crate::geometry::bbox::Aabb;
use crate::topology::element::ElementId;

const LEAF_SIZE: usize = 8;

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf { start: usize, len: usize },
    Inner { left: usize, right: usize },
}

#[derive(Clone, Debug)]
struct Node {
    bbox: Aabb,
    kind: NodeKind,
}

/// Bounding-volume tree over `(cell id, cell bbox)` pairs.
#[derive(Clone, Debug)]
pub struct SkdTree {
    nodes: Vec<Node>,
    items: Vec<(ElementId, Aabb)>,
    root: Option<usize>,
}

impl SkdTree {
    /// Builds a tree over the given cell boxes. Empty input yields an empty tree.
    pub fn build(mut items: Vec<(ElementId, Aabb)>) -> Self {
        let mut tree = SkdTree {
            nodes: Vec::new(),
            items: Vec::new(),
            root: None,
        };
        if items.is_empty() {
            return tree;
        }
        let n = items.len();
        let root = tree.build_range(&mut items, 0, n);
        tree.items = items;
        tree.root = Some(root);
        tree
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the tree indexes no cells.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bounding box of the entire indexed cell set.
    pub fn bbox(&self) -> Aabb {
        match self.root {
            Some(r) => self.nodes[r].bbox,
            None => Aabb::EMPTY,
        }
    }

    fn build_range(&mut self, items: &mut [(ElementId, Aabb)], start: usize, end: usize) -> usize {
        let slice = &mut items[start..end];
        let bbox = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, b)| acc.union(b));
        if slice.len() <= LEAF_SIZE {
            self.nodes.push(Node {
                bbox,
                kind: NodeKind::Leaf {
                    start,
                    len: slice.len(),
                },
            });
            return self.nodes.len() - 1;
        }
        // Split on the longest axis of centroid spread; median keeps the
        // tree balanced regardless of cell distribution.
        let centroid_bounds = Aabb::from_points(slice.iter().map(|(_, b)| b.center()));
        let axis = centroid_bounds.longest_axis();
        let mid = slice.len() / 2;
        slice.select_nth_unstable_by(mid, |(_, a), (_, b)| {
            a.center()[axis]
                .partial_cmp(&b.center()[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let left = self.build_range(items, start, start + mid);
        let right = self.build_range(items, start + mid, end);
        self.nodes.push(Node {
            bbox,
            kind: NodeKind::Inner { left, right },
        });
        self.nodes.len() - 1
    }

    /// All cells whose box, inflated by `tol`, intersects `query`.
    ///
    /// Result is sorted ascending by id.
    pub fn overlaps(&self, query: &Aabb, tol: f64) -> Vec<ElementId> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let node = &self.nodes[node];
            if !node.bbox.intersects_with_tol(query, tol) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, len } => {
                    for (id, bbox) in &self.items[start..start + len] {
                        if bbox.intersects_with_tol(query, tol) {
                            out.push(*id);
                        }
                    }
                }
                NodeKind::Inner { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Selects every cell of `source` whose bounding box lies within `tol` of
/// any cell bounding box of `target` (patch-overlap, not nearest-cell).
///
/// Returns source-side cell ids, sorted ascending and deduplicated. The
/// overlap predicate is symmetric; only the returned identifier space
/// depends on the argument order. The selected set is monotone in `tol`.
pub fn select_by_patch(source: &SkdTree, target: &SkdTree, tol: f64) -> Vec<ElementId> {
    let (Some(src_root), Some(tgt_root)) = (source.root, target.root) else {
        return Vec::new();
    };
    let mut selected = hashbrown::HashSet::new();
    let mut stack = vec![(src_root, tgt_root)];
    while let Some((si, ti)) = stack.pop() {
        let sn = &source.nodes[si];
        let tn = &target.nodes[ti];
        if !sn.bbox.intersects_with_tol(&tn.bbox, tol) {
            continue;
        }
        match (&sn.kind, &tn.kind) {
            (NodeKind::Leaf { start: ss, len: sl }, NodeKind::Leaf { start: ts, len: tl }) => {
                for (sid, sbox) in &source.items[*ss..ss + sl] {
                    if selected.contains(sid) {
                        continue;
                    }
                    for (_, tbox) in &target.items[*ts..ts + tl] {
                        if sbox.intersects_with_tol(tbox, tol) {
                            selected.insert(*sid);
                            break;
                        }
                    }
                }
            }
            (NodeKind::Inner { left, right }, _) => {
                stack.push((*left, ti));
                stack.push((*right, ti));
            }
            (_, NodeKind::Inner { left, right }) => {
                stack.push((si, *left));
                stack.push((si, *right));
            }
        }
    }
    let mut out: Vec<ElementId> = selected.into_iter().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(id: u64, origin: [f64; 3]) -> (ElementId, Aabb) {
        (
            ElementId::new(id),
            Aabb::from_points([
                origin,
                [origin[0] + 1.0, origin[1] + 1.0, origin[2] + 1.0],
            ]),
        )
    }

    fn grid(n: u64) -> Vec<(ElementId, Aabb)> {
        // n x n unit boxes spaced 2 apart in x/y, so none touch.
        let mut items = Vec::new();
        for i in 0..n {
            for j in 0..n {
                items.push(unit_box(
                    i * n + j + 1,
                    [2.0 * i as f64, 2.0 * j as f64, 0.0],
                ));
            }
        }
        items
    }

    fn brute_force_overlaps(items: &[(ElementId, Aabb)], query: &Aabb, tol: f64) -> Vec<ElementId> {
        let mut out: Vec<ElementId> = items
            .iter()
            .filter(|(_, b)| b.intersects_with_tol(query, tol))
            .map(|(id, _)| *id)
            .collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn empty_tree() {
        let t = SkdTree::build(Vec::new());
        assert!(t.is_empty());
        assert!(t.overlaps(&Aabb::from_point([0.0; 3]), 10.0).is_empty());
    }

    #[test]
    fn overlaps_matches_brute_force() {
        let items = grid(7);
        let tree = SkdTree::build(items.clone());
        for tol in [0.0, 0.5, 1.0, 3.0] {
            let query = Aabb::from_points([[1.5, 1.5, 0.0], [4.5, 4.5, 1.0]]);
            assert_eq!(
                tree.overlaps(&query, tol),
                brute_force_overlaps(&items, &query, tol),
                "tol = {tol}"
            );
        }
    }

    #[test]
    fn select_by_patch_coincident_at_zero_tol() {
        // Same boxes under different ids: each source cell coincides with
        // one target cell, so zero tolerance must select everything.
        let source = SkdTree::build(grid(4));
        let target = SkdTree::build(
            grid(4)
                .into_iter()
                .map(|(id, b)| (ElementId::new(id.get() + 100), b))
                .collect(),
        );
        let picked = select_by_patch(&source, &target, 0.0);
        assert_eq!(picked.len(), 16);
    }

    #[test]
    fn select_by_patch_monotone_in_tol() {
        let source = SkdTree::build(grid(5));
        let target = SkdTree::build(vec![unit_box(999, [4.0, 4.0, 0.0])]);
        let mut prev: Vec<ElementId> = Vec::new();
        for tol in [0.0, 0.5, 1.0, 2.0, 5.0] {
            let cur = select_by_patch(&source, &target, tol);
            assert!(
                prev.iter().all(|id| cur.contains(id)),
                "selection shrank when tol grew to {tol}"
            );
            prev = cur;
        }
        assert_eq!(prev.len(), 25); // tol 5 swallows the whole grid
    }

    #[test]
    fn select_by_patch_sorted_dedup() {
        let source = SkdTree::build(grid(3));
        let target = SkdTree::build(grid(3));
        let picked = select_by_patch(&source, &target, 0.0);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(picked, sorted);
    }
}
