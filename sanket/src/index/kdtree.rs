//! Static 2D k-d tree over waypoint positions.
//!
//! The tree is built once from a complete point set and never mutated, so it
//! is stored as a flat node array with one point per node and a median split
//! at every level. Each level splits on the axis with the larger extent, which
//! keeps axis-aligned road segments (many points sharing one coordinate)
//! balanced instead of degenerating on the constant axis.
//!
//! # Tie-breaking
//!
//! When several points are at exactly the same minimum distance, the lowest
//! point index wins. This matches iterating the path in order and keeping the
//! first strict minimum, which is what [`nearest_linear`] does.
//!
//! # Performance
//!
//! - Build: O(n log n) (median selection per level)
//! - Query: O(log n) expected for roughly uniform paths
//! - Memory: one 16-byte node per point plus the point copy

use crate::types::Point2D;

/// Sentinel for "no child".
const NIL: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    fn of(self, p: &Point2D) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    /// Index into the original point sequence.
    point: u32,
    axis: Axis,
    left: u32,
    right: u32,
}

/// Immutable 2D k-d tree returning indices into the original point order.
#[derive(Clone, Debug)]
pub struct KdTree2 {
    points: Vec<Point2D>,
    nodes: Vec<Node>,
    root: u32,
}

/// Running best candidate during a query.
#[derive(Clone, Copy, Debug)]
struct Best {
    dist_sq: f64,
    index: u32,
}

impl Best {
    #[inline]
    fn offer(&mut self, dist_sq: f64, index: u32) {
        if dist_sq < self.dist_sq || (dist_sq == self.dist_sq && index < self.index) {
            self.dist_sq = dist_sq;
            self.index = index;
        }
    }
}

impl KdTree2 {
    /// Build a tree over `points`. Point `i` keeps index `i`.
    ///
    /// Callers are expected to pass finite coordinates; see
    /// [`WaypointIndex::build`](super::WaypointIndex::build).
    pub fn build(points: &[Point2D]) -> Self {
        let mut order: Vec<u32> = (0..points.len() as u32).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build_subtree(points, &mut order, &mut nodes);

        Self {
            points: points.to_vec(),
            nodes,
            root,
        }
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the point closest to `query`.
    ///
    /// Returns `None` for an empty tree or a non-finite query.
    pub fn nearest(&self, query: &Point2D) -> Option<usize> {
        if self.root == NIL || !query.is_finite() {
            return None;
        }

        let mut best = Best {
            dist_sq: f64::INFINITY,
            index: NIL,
        };
        self.search(self.root, query, &mut best);

        (best.index != NIL).then_some(best.index as usize)
    }

    fn search(&self, node_idx: u32, query: &Point2D, best: &mut Best) {
        if node_idx == NIL {
            return;
        }
        let node = self.nodes[node_idx as usize];
        let point = &self.points[node.point as usize];

        best.offer(point.distance_sq(query), node.point);

        let diff = node.axis.of(query) - node.axis.of(point);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.search(near, query, best);

        // `<=` so that equal-distance points across the split are still
        // visited and the lowest index can win.
        if diff * diff <= best.dist_sq {
            self.search(far, query, best);
        }
    }
}

/// Recursively build the subtree for `order`, returning its node index.
fn build_subtree(points: &[Point2D], order: &mut [u32], nodes: &mut Vec<Node>) -> u32 {
    if order.is_empty() {
        return NIL;
    }

    let axis = widest_axis(points, order);
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        axis.of(&points[a as usize])
            .total_cmp(&axis.of(&points[b as usize]))
            .then(a.cmp(&b))
    });

    let node_idx = nodes.len() as u32;
    nodes.push(Node {
        point: order[mid],
        axis,
        left: NIL,
        right: NIL,
    });

    let (left, rest) = order.split_at_mut(mid);
    let right = &mut rest[1..];
    let left_idx = build_subtree(points, left, nodes);
    let right_idx = build_subtree(points, right, nodes);

    let node = &mut nodes[node_idx as usize];
    node.left = left_idx;
    node.right = right_idx;
    node_idx
}

/// Axis with the larger coordinate extent over `order`.
fn widest_axis(points: &[Point2D], order: &[u32]) -> Axis {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &i in order {
        let p = &points[i as usize];
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    if max_y - min_y > max_x - min_x {
        Axis::Y
    } else {
        Axis::X
    }
}

/// Reference nearest-neighbour search by linear scan.
///
/// Same contract as [`KdTree2::nearest`]: lowest index wins on ties.
pub fn nearest_linear(points: &[Point2D], query: &Point2D) -> Option<usize> {
    if !query.is_finite() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_sq(query);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}
