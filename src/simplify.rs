//! Douglas-Peucker polyline simplification
//!
//! Street geometry is stored at the maximum zoom level; every coarser zoom
//! level gets a simplified copy built at load time with a tolerance that
//! doubles per level. The selected subset always keeps the first and last
//! point and preserves the input order.
//!
//! <http://en.wikipedia.org/wiki/Ramer-Douglas-Peucker_algorithm>

use crate::geom::Point;
use crate::{IndexError, Result, utils};

/// Select a subset of `points` approximating the polyline within
/// `tolerance`, appending the result to `out`
///
/// The first and last points are always included. At least 2 input points
/// are required.
pub fn simplify_into(points: &[Point], tolerance: f64, out: &mut Vec<Point>) -> Result<()> {
    if points.len() < 2 {
        return Err(IndexError::NotEnoughPoints {
            count: points.len(),
        });
    }

    out.push(points[0]);
    simplify_range(points, 0, points.len() - 1, tolerance * tolerance, out);
    out.push(points[points.len() - 1]);
    Ok(())
}

/// Convenience wrapper around [`simplify_into`] returning a fresh vector
pub fn simplify(points: &[Point], tolerance: f64) -> Result<Vec<Point>> {
    let mut out = Vec::with_capacity(points.len().min(16));
    simplify_into(points, tolerance, &mut out)?;
    Ok(out)
}

/// Recursive step over the open range (start, end)
///
/// Finds the interior point with the maximum perpendicular squared
/// distance to the chord; if it deviates enough it is kept and both
/// sub-ranges are simplified in order, which keeps the output sorted.
fn simplify_range(
    points: &[Point],
    start: usize,
    end: usize,
    min_distance_sq: f64,
    out: &mut Vec<Point>,
) {
    let chord_a = points[start];
    let chord_b = points[end];
    let mut max_dist_sq = 0.0;
    let mut pivot = None;

    for (i, point) in points.iter().enumerate().take(end).skip(start + 1) {
        let dist_sq = utils::point_segment_distance_sq(*point, chord_a, chord_b);
        if dist_sq > max_dist_sq {
            max_dist_sq = dist_sq;
            pivot = Some(i);
        }
    }

    let Some(pivot) = pivot else {
        return;
    };

    if max_dist_sq >= min_distance_sq {
        if pivot - start >= 2 {
            simplify_range(points, start, pivot, min_distance_sq, out);
        }

        out.push(points[pivot]);

        if end - pivot >= 2 {
            simplify_range(points, pivot, end, min_distance_sq, out);
        }
    }
}
