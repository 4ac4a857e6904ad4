//! Nearest-waypoint index tests against brute force and an independent
//! k-d tree.

mod common;

use common::*;
use kiddo::{KdTree, SquaredEuclidean};
use rand::prelude::*;
use sanket::index::{KdTree2, nearest_linear};
use sanket::{Point2D, SanketError, WaypointIndex};

fn random_queries(n: usize, extent: f64, seed: u64) -> Vec<Point2D> {
    random_cloud(n, extent, seed)
}

#[test]
fn test_matches_linear_scan_on_random_walk() {
    let path = random_walk(2_000, 1.0, 7);
    let tree = KdTree2::build(&path);

    for q in random_queries(500, 200.0, 8) {
        assert_eq!(tree.nearest(&q), nearest_linear(&path, &q), "query {:?}", q);
    }
}

#[test]
fn test_matches_linear_scan_on_loop() {
    let path = loop_path(360, 50.0);
    let index = WaypointIndex::from_points(&path).unwrap();

    // The centre is equidistant from every waypoint (up to rounding); both
    // must agree on which one is reported.
    let centre = Point2D::new(0.0, 0.0);
    assert_eq!(
        index.nearest(&centre).unwrap(),
        nearest_linear(&path, &centre).unwrap()
    );

    for q in random_queries(300, 80.0, 11) {
        assert_eq!(index.nearest(&q).unwrap(), nearest_linear(&path, &q).unwrap());
    }
}

#[test]
fn test_out_and_back_prefers_outbound_index() {
    let path = out_and_back_path(50);
    let index = WaypointIndex::from_points(&path).unwrap();

    for i in 0..50 {
        let q = Point2D::new(i as f64, 0.4);
        assert_eq!(index.nearest(&q).unwrap(), i);
    }
}

#[test]
fn test_distance_agrees_with_kiddo() {
    // kiddo is only an oracle for the distance: on ties it may pick a
    // different index than the lowest one.
    let cloud = random_cloud(5_000, 1_000.0, 42);
    let index = WaypointIndex::from_points(&cloud).unwrap();

    let mut oracle: KdTree<f64, 2> = KdTree::new();
    for (i, p) in cloud.iter().enumerate() {
        oracle.add(&[p.x, p.y], i as u64);
    }

    let mut rng = StdRng::seed_from_u64(43);
    for _ in 0..1_000 {
        let q = Point2D::new(
            rng.random_range(-1_100.0..1_100.0),
            rng.random_range(-1_100.0..1_100.0),
        );
        let ours = index.nearest(&q).unwrap();
        let theirs = oracle.nearest_one::<SquaredEuclidean>(&[q.x, q.y]);

        approx::assert_relative_eq!(cloud[ours].distance_sq(&q), theirs.distance, max_relative = 1e-12);
    }
}

#[test]
fn test_dense_straight_road() {
    // Thousands of points sharing y = 0
    let path = straight_path(10_000, 0.5);
    let index = WaypointIndex::from_points(&path).unwrap();

    assert_eq!(index.nearest(&Point2D::new(-10.0, 3.0)).unwrap(), 0);
    assert_eq!(index.nearest(&Point2D::new(1234.4, -2.0)).unwrap(), 2469);
    assert_eq!(index.nearest(&Point2D::new(1e9, 0.0)).unwrap(), 9_999);
}

#[test]
fn test_query_before_build() {
    let index = WaypointIndex::new();
    assert!(matches!(
        index.nearest(&Point2D::new(0.0, 0.0)),
        Err(SanketError::IndexNotBuilt)
    ));
}
