//! Pure segment geometry shared by the trees and the simplifier

use crate::geom::Point;

/// Sign of the cross product of (p3 - p1) and (p2 - p1)
///
/// Returns 1 for a counter-clockwise turn, -1 for clockwise and 0 when the
/// three points are collinear. This is the orientation primitive the
/// segment intersection test is built on.
#[inline]
pub fn rotation(p1: Point, p2: Point, p3: Point) -> i8 {
    let value = (p3.y - p1.y) * (p2.x - p1.x) - (p3.x - p1.x) * (p2.y - p1.y);
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Proper intersection test for segments (a1, a2) and (b1, b2)
///
/// Uses the standard CCW test: the segments cross only when each pair of
/// endpoints lies on strictly different sides of the other segment.
/// Collinear overlap and endpoint touching count as non-intersecting.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let test1 = rotation(a1, a2, b1);
    let test2 = rotation(a1, a2, b2);

    if test1 != test2 {
        let test3 = rotation(b1, b2, a1);
        let test4 = rotation(b1, b2, a2);
        return test3 != test4;
    }

    false
}

/// Check whether the segment (a, b) intersects the rectangle given by its
/// edge coordinates
///
/// Fast path: the segment's bounding box lies entirely inside the
/// rectangle. Otherwise the segment must cross one of the four edges.
pub fn segment_intersects_rect(
    a: Point,
    b: Point,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
) -> bool {
    if left <= a.x.min(b.x)
        && top <= a.y.min(b.y)
        && right >= a.x.max(b.x)
        && bottom >= a.y.max(b.y)
    {
        return true;
    }

    let nw = Point::new(left, top);
    let ne = Point::new(right, top);
    let sw = Point::new(left, bottom);
    let se = Point::new(right, bottom);

    segments_intersect(a, b, nw, ne)
        || segments_intersect(a, b, nw, sw)
        || segments_intersect(a, b, ne, se)
        || segments_intersect(a, b, sw, se)
}

/// Squared distance from `point` to the segment (s1, s2)
///
/// Projects the point onto the infinite line through the segment, clamps
/// the projection parameter to [0, 1] and measures to the clamped point.
pub fn point_segment_distance_sq(point: Point, s1: Point, s2: Point) -> f64 {
    let ldx = s2.x - s1.x;
    let ldy = s2.y - s1.y;
    let len_sq = ldx * ldx + ldy * ldy;

    // Degenerate segment: measure to the single endpoint
    if len_sq == 0.0 {
        return point.distance_sq(s1);
    }

    let u = (((point.x - s1.x) * ldx) + ((point.y - s1.y) * ldy)) / len_sq;
    let u = u.clamp(0.0, 1.0);

    let x = s1.x + u * ldx;
    let y = s1.y + u * ldy;
    let dx = x - point.x;
    let dy = y - point.y;
    dx * dx + dy * dy
}

/// Euclidean distance from `point` to the segment (s1, s2)
#[inline]
pub fn point_segment_distance(point: Point, s1: Point, s2: Point) -> f64 {
    point_segment_distance_sq(point, s1, s2).sqrt()
}
