//! Per-zoom segment quadtree for street rendering and hit-testing
//!
//! One independent quadtree root per zoom level, all covering the same
//! `[0, width] x [0, height]` pixel rectangle. Unlike [`crate::PointTree`]
//! a segment is *replicated*: it is stored in every leaf whose rectangle it
//! intersects, so rectangle queries only have to visit overlapping leaves.
//! The price is deduplication on query results and on merge, both handled
//! here.
//!
//! Leaves hold at most [`SPLIT_THRESHOLD`] segments, a quarter of the point
//! tree's bucket since every stored line costs an intersection test per
//! quadrant on the way down.

use crate::geom::{Point, Region};
use crate::utils::{point_segment_distance_sq, segment_intersects_rect};
use crate::{IndexError, Result};
use smallvec::SmallVec;

const SPLIT_THRESHOLD: usize = 4;

/// Depth guard; replication makes degenerate splits easy to trigger when
/// more than four segments share a point
const MAX_DEPTH: u32 = 20;

/// A line segment tagged with the value it was indexed for, typically the
/// [`ObjectId`](crate::ObjectId) of the owning street
///
/// Equality is the tagged value plus approximate endpoint equality, so a
/// segment found by a query compares equal to the one that was inserted
/// even after a round-trip through coordinate arithmetic.
#[derive(Clone, Debug)]
pub struct Line<V> {
    pub a: Point,
    pub b: Point,
    pub value: V,
}

impl<V> Line<V> {
    pub fn new(a: Point, b: Point, value: V) -> Self {
        Self { a, b, value }
    }
}

impl<V: PartialEq> PartialEq for Line<V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.a == other.a && self.b == other.b
    }
}

type Bucket<V> = SmallVec<[Line<V>; SPLIT_THRESHOLD]>;

#[derive(Clone, Debug)]
enum Node<V> {
    Leaf(Bucket<V>),
    Internal(Box<[Node<V>; 4]>),
}

impl<V> Node<V> {
    fn leaf() -> Self {
        Node::Leaf(SmallVec::new())
    }
}

/// Traversal-time rectangle of a node, kept in centered representation
/// like the point tree's
#[derive(Clone, Copy, Debug)]
struct Quad {
    center: Point,
    half_width: f64,
    half_height: f64,
    depth: u32,
}

impl Quad {
    fn child(&self, direction: usize) -> Quad {
        let dx = if direction % 2 == 1 { self.half_width / 2.0 } else { -self.half_width / 2.0 };
        let dy = if direction >= 2 { self.half_height / 2.0 } else { -self.half_height / 2.0 };
        Quad {
            center: self.center.offset(dx, dy),
            half_width: self.half_width / 2.0,
            half_height: self.half_height / 2.0,
            depth: self.depth + 1,
        }
    }

    fn region(&self) -> Region {
        Region::from_center(self.center, self.half_width, self.half_height)
    }

    fn contains_segment(&self, a: Point, b: Point) -> bool {
        segment_intersects_rect(
            a,
            b,
            self.center.x - self.half_width,
            self.center.y - self.half_height,
            self.center.x + self.half_width,
            self.center.y + self.half_height,
        )
    }

    fn overlaps_circle(&self, center: Point, radius: f64) -> bool {
        let dx = ((center.x - self.center.x).abs() - self.half_width).max(0.0);
        let dy = ((center.y - self.center.y).abs() - self.half_height).max(0.0);
        dx * dx + dy * dy <= radius * radius
    }
}

/// A segment quadtree with one root per zoom level
#[derive(Clone, Debug)]
pub struct LineTree<V> {
    roots: Vec<Node<V>>,
    width: f64,
    height: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<V: PartialEq + Clone> LineTree<V> {
    /// Create an empty tree with `zoom_levels` independent roots over
    /// `[0, width] x [0, height]`
    pub fn new(width: f64, height: f64, zoom_levels: usize) -> Self {
        Self {
            roots: (0..zoom_levels).map(|_| Node::leaf()).collect(),
            width,
            height,
        }
    }

    fn root_quad(&self) -> Quad {
        Quad {
            center: Point::new(self.width / 2.0, self.height / 2.0),
            half_width: self.width / 2.0,
            half_height: self.height / 2.0,
            depth: 0,
        }
    }

    /// Insert a segment at one zoom level
    ///
    /// Rejects zoom levels the tree was not created with and segments that
    /// do not touch the indexed rectangle at all.
    pub fn add(&mut self, line: Line<V>, zoom: usize) -> Result<()> {
        let levels = self.roots.len();
        let quad = self.root_quad();
        let Some(root) = self.roots.get_mut(zoom) else {
            return Err(IndexError::ZoomLevelOutOfRange { zoom, levels });
        };
        if !quad.contains_segment(line.a, line.b) {
            return Err(IndexError::OutOfBounds {
                x: line.a.x,
                y: line.a.y,
            });
        }
        Self::add_rec(root, line, quad);
        Ok(())
    }

    /// Insert every segment of an iterator at one zoom level
    pub fn add_all<I: IntoIterator<Item = Line<V>>>(&mut self, lines: I, zoom: usize) -> Result<()> {
        for line in lines {
            self.add(line, zoom)?;
        }
        Ok(())
    }

    fn add_rec(node: &mut Node<V>, line: Line<V>, quad: Quad) {
        match node {
            Node::Internal(children) => {
                // Replicate into every intersecting child
                for dir in 0..4 {
                    let child_quad = quad.child(dir);
                    if child_quad.contains_segment(line.a, line.b) {
                        Self::add_rec(&mut children[dir], line.clone(), child_quad);
                    }
                }
            }
            Node::Leaf(lines) => {
                lines.push(line);
                if lines.len() > SPLIT_THRESHOLD && quad.depth < MAX_DEPTH {
                    Self::split(node, quad);
                }
            }
        }
    }

    fn split(node: &mut Node<V>, quad: Quad) {
        let lines = match node {
            Node::Leaf(lines) => std::mem::take(lines),
            Node::Internal(_) => return,
        };

        let mut children = Box::new([Node::leaf(), Node::leaf(), Node::leaf(), Node::leaf()]);
        for line in lines {
            for dir in 0..4 {
                let child_quad = quad.child(dir);
                if child_quad.contains_segment(line.a, line.b)
                    && let Node::Leaf(bucket) = &mut children[dir]
                {
                    bucket.push(line.clone());
                }
            }
        }

        *node = Node::Internal(children);
    }

    /// Remove a segment from one zoom level, clearing every replica
    ///
    /// Returns whether any replica was found. Out-of-range zoom levels
    /// remove nothing.
    pub fn remove(&mut self, line: &Line<V>, zoom: usize) -> bool {
        let quad = self.root_quad();
        match self.roots.get_mut(zoom) {
            Some(root) => Self::remove_rec(root, line, quad),
            None => false,
        }
    }

    fn remove_rec(node: &mut Node<V>, line: &Line<V>, quad: Quad) -> bool {
        match node {
            Node::Leaf(lines) => {
                if let Some(index) = lines.iter().position(|l| l == line) {
                    lines.remove(index);
                    true
                } else {
                    false
                }
            }
            Node::Internal(children) => {
                let mut removed = false;
                for dir in 0..4 {
                    let child_quad = quad.child(dir);
                    if child_quad.contains_segment(line.a, line.b) {
                        removed |= Self::remove_rec(&mut children[dir], line, child_quad);
                    }
                }
                if removed {
                    Self::try_collapse(node);
                }
                removed
            }
        }
    }

    /// Collapse an internal node back into a leaf when its distinct
    /// segments fit below the split threshold
    fn try_collapse(node: &mut Node<V>) {
        let mut gathered: Bucket<V> = SmallVec::new();
        if Self::gather(node, &mut gathered) {
            *node = Node::Leaf(gathered);
        }
    }

    /// Collect the distinct segments under `node`, aborting once the split
    /// threshold is reached (replicas make raw counts meaningless)
    fn gather(node: &Node<V>, out: &mut Bucket<V>) -> bool {
        match node {
            Node::Leaf(lines) => {
                for line in lines {
                    if !out.contains(line) {
                        out.push(line.clone());
                        if out.len() >= SPLIT_THRESHOLD {
                            return false;
                        }
                    }
                }
                true
            }
            Node::Internal(children) => {
                for child in children.iter() {
                    if !Self::gather(child, out) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Look up the stored instance equal to `line` at one zoom level
    pub fn find(&self, line: &Line<V>, zoom: usize) -> Option<&Line<V>> {
        let quad = self.root_quad();
        self.roots
            .get(zoom)
            .and_then(|root| Self::find_rec(root, line, quad))
    }

    fn find_rec<'a>(node: &'a Node<V>, line: &Line<V>, quad: Quad) -> Option<&'a Line<V>> {
        match node {
            Node::Leaf(lines) => lines.iter().find(|l| *l == line),
            Node::Internal(children) => {
                for dir in 0..4 {
                    let child_quad = quad.child(dir);
                    if child_quad.contains_segment(line.a, line.b)
                        && let Some(found) = Self::find_rec(&children[dir], line, child_quad)
                    {
                        return Some(found);
                    }
                }
                None
            }
        }
    }

    /// Append every segment intersecting `region` at one zoom level, each
    /// reported exactly once regardless of replication
    pub fn intersect(&self, region: &Region, zoom: usize, out: &mut Vec<Line<V>>) {
        self.intersect_filtered(region, zoom, |_| true, out);
    }

    /// Like [`intersect`](Self::intersect) with a validity predicate
    pub fn intersect_filtered<F>(&self, region: &Region, zoom: usize, mut valid: F, out: &mut Vec<Line<V>>)
    where
        F: FnMut(&Line<V>) -> bool,
    {
        if region.is_empty() {
            return;
        }
        let quad = self.root_quad();
        if let Some(root) = self.roots.get(zoom) {
            Self::intersect_rec(root, region, &mut valid, out, quad);
        }
    }

    fn intersect_rec<F>(node: &Node<V>, region: &Region, valid: &mut F, out: &mut Vec<Line<V>>, quad: Quad)
    where
        F: FnMut(&Line<V>) -> bool,
    {
        match node {
            Node::Leaf(lines) => {
                for line in lines {
                    if segment_intersects_rect(
                        line.a,
                        line.b,
                        region.left,
                        region.top,
                        region.right(),
                        region.bottom(),
                    ) && !out.contains(line)
                        && valid(line)
                    {
                        out.push(line.clone());
                    }
                }
            }
            Node::Internal(children) => {
                for dir in 0..4 {
                    let child_quad = quad.child(dir);
                    if region.intersects(&child_quad.region()) {
                        Self::intersect_rec(&children[dir], region, valid, out, child_quad);
                    }
                }
            }
        }
    }

    /// Segment minimizing the point-to-segment distance at one zoom level
    ///
    /// The search compares squared distances and takes a single square
    /// root at the end. Returns `None` on an empty level or an
    /// out-of-range zoom.
    pub fn nearest(&self, point: Point, zoom: usize) -> Option<(Line<V>, f64)> {
        let quad = self.root_quad();
        let mut best: Option<(Line<V>, f64)> = None;
        if let Some(root) = self.roots.get(zoom) {
            Self::nearest_rec(root, point, &mut best, quad);
        }
        best.map(|(line, distance_sq)| (line, distance_sq.sqrt()))
    }

    fn nearest_rec(node: &Node<V>, point: Point, best: &mut Option<(Line<V>, f64)>, quad: Quad) {
        match node {
            Node::Leaf(lines) => {
                for line in lines {
                    let distance_sq = point_segment_distance_sq(point, line.a, line.b);
                    if best.as_ref().is_none_or(|(_, d)| distance_sq < *d) {
                        *best = Some((line.clone(), distance_sq));
                    }
                }
            }
            Node::Internal(children) => {
                for dir in 0..4 {
                    let radius = best.as_ref().map_or(f64::INFINITY, |(_, d)| d.sqrt());
                    let child_quad = quad.child(dir);
                    if child_quad.overlaps_circle(point, radius) {
                        Self::nearest_rec(&children[dir], point, best, child_quad);
                    }
                }
            }
        }
    }

    /// Number of zoom levels the tree was created with
    #[inline]
    pub fn zoom_levels(&self) -> usize {
        self.roots.len()
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Reset every zoom level to a single empty leaf
    pub fn clear(&mut self) {
        for root in &mut self.roots {
            *root = Node::leaf();
        }
    }
}
