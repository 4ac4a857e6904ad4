//! Write-once nearest-waypoint index over the vehicle's path.
//!
//! The path arrives from an external feed, possibly after frames have
//! started flowing. The index is installed exactly once: the first non-empty
//! path wins and every later delivery is a no-op, so the tree is never
//! rebuilt while frames are being processed. Readiness is the `OnceLock`
//! itself; readers never take a lock after the build.

mod kdtree;

pub use kdtree::{KdTree2, nearest_linear};

use std::sync::OnceLock;

use crate::error::{Result, SanketError};
use crate::types::Point2D;

/// Nearest-waypoint index, built once from the first non-empty path.
#[derive(Debug, Default)]
pub struct WaypointIndex {
    tree: OnceLock<KdTree2>,
}

impl WaypointIndex {
    /// Create an index with no path installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that is already built from `points`.
    pub fn from_points(points: &[Point2D]) -> Result<Self> {
        let index = Self::new();
        index.build(points)?;
        Ok(index)
    }

    /// Build the index from the path, if it has not been built yet.
    ///
    /// Returns `Ok(true)` when this call installed the index, `Ok(false)` when
    /// the path was empty or an index already exists. A path containing
    /// non-finite coordinates is rejected and leaves the index unbuilt.
    pub fn build(&self, points: &[Point2D]) -> Result<bool> {
        if self.is_ready() || points.is_empty() {
            return Ok(false);
        }

        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(SanketError::InvalidPath(format!(
                "waypoint {} has non-finite position ({}, {})",
                i, points[i].x, points[i].y
            )));
        }
        if points.len() >= u32::MAX as usize {
            return Err(SanketError::InvalidPath(format!(
                "{} waypoints exceeds index capacity",
                points.len()
            )));
        }

        // A concurrent builder may have won the race; its tree stays.
        Ok(self.tree.set(KdTree2::build(points)).is_ok())
    }

    /// Whether a path has been installed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.tree.get().is_some()
    }

    /// Number of waypoints in the installed path (0 before the build).
    pub fn len(&self) -> usize {
        self.tree.get().map_or(0, KdTree2::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the waypoint closest to `point` (lowest index on ties).
    ///
    /// Fails with [`SanketError::IndexNotBuilt`] if no path has been
    /// installed yet.
    pub fn nearest(&self, point: &Point2D) -> Result<usize> {
        let tree = self.tree.get().ok_or(SanketError::IndexNotBuilt)?;
        tree.nearest(point).ok_or(SanketError::NonFiniteQuery {
            x: point.x,
            y: point.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Point2D> {
        (0..n).map(|i| Point2D::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_query_before_build_fails() {
        let index = WaypointIndex::new();
        assert!(!index.is_ready());
        assert!(matches!(
            index.nearest(&Point2D::new(0.0, 0.0)),
            Err(SanketError::IndexNotBuilt)
        ));
    }

    #[test]
    fn test_first_path_wins() {
        let index = WaypointIndex::new();
        assert!(index.build(&line(10)).unwrap());
        assert_eq!(index.len(), 10);

        // Second delivery is ignored, even if different.
        let other: Vec<Point2D> = (0..50).map(|i| Point2D::new(0.0, i as f64)).collect();
        assert!(!index.build(&other).unwrap());
        assert_eq!(index.len(), 10);
        assert_eq!(index.nearest(&Point2D::new(0.0, 30.0)).unwrap(), 0);
    }

    #[test]
    fn test_empty_path_is_ignored() {
        let index = WaypointIndex::new();
        assert!(!index.build(&[]).unwrap());
        assert!(!index.is_ready());

        assert!(index.build(&line(3)).unwrap());
        assert!(index.is_ready());
    }

    #[test]
    fn test_non_finite_path_rejected() {
        let index = WaypointIndex::new();
        let mut points = line(5);
        points[3].y = f64::NAN;

        assert!(matches!(
            index.build(&points),
            Err(SanketError::InvalidPath(_))
        ));
        assert!(!index.is_ready());
    }

    #[test]
    fn test_non_finite_query() {
        let index = WaypointIndex::from_points(&line(5)).unwrap();
        assert!(matches!(
            index.nearest(&Point2D::new(f64::NAN, 1.0)),
            Err(SanketError::NonFiniteQuery { .. })
        ));
    }

    #[test]
    fn test_concurrent_build_installs_one_path() {
        use std::sync::Arc;

        let index = Arc::new(WaypointIndex::new());
        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || index.build(&line(n * 10)).unwrap())
            })
            .collect();

        let built: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(built, 1);
        assert!(index.is_ready());
        assert_eq!(index.len() % 10, 0);
    }
}
