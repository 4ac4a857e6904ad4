//! Test utilities for Sanket integration tests.
//!
//! Path generators and helpers for driving the detector.

#![allow(dead_code)]

use std::f64::consts::PI;

use rand::prelude::*;
use sanket::{Point2D, SanketConfig, TrafficLight};

/// Straight path along +X with the given spacing.
pub fn straight_path(n: usize, spacing: f64) -> Vec<Point2D> {
    (0..n)
        .map(|i| Point2D::new(i as f64 * spacing, 0.0))
        .collect()
}

/// Closed circular loop of `n` waypoints, counter-clockwise from (radius, 0).
pub fn loop_path(n: usize, radius: f64) -> Vec<Point2D> {
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Point2D::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Path that runs out along +X and comes back over the same points.
pub fn out_and_back_path(n: usize) -> Vec<Point2D> {
    let mut path = straight_path(n, 1.0);
    path.extend((0..n).rev().map(|i| Point2D::new(i as f64, 0.0)));
    path
}

/// Random walk with bounded turns, seeded for reproducibility.
pub fn random_walk(n: usize, step: f64, seed: u64) -> Vec<Point2D> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut heading: f64 = 0.0;
    let mut p = Point2D::new(0.0, 0.0);
    let mut path = Vec::with_capacity(n);
    for _ in 0..n {
        path.push(p);
        heading += rng.random_range(-0.3..0.3);
        p = Point2D::new(p.x + step * heading.cos(), p.y + step * heading.sin());
    }
    path
}

/// Uniform random points in a square, seeded.
pub fn random_cloud(n: usize, extent: f64, seed: u64) -> Vec<Point2D> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Point2D::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            )
        })
        .collect()
}

/// Light placed a little to the side of its stop line.
pub fn light_near(stop_line: Point2D) -> TrafficLight {
    TrafficLight::new(stop_line.x + 5.0, stop_line.y + 3.0, 5.0)
}

/// Config with the given stop lines and default detector settings.
pub fn config_with_stop_lines(stop_lines: &[[f64; 2]]) -> SanketConfig {
    SanketConfig {
        stop_line_positions: stop_lines.to_vec(),
        expected_light_count: Some(stop_lines.len()),
        ..SanketConfig::default()
    }
}
