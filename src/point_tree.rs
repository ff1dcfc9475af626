//! Bucket PR-quadtree for point-like map entities
//!
//! Backs hit-testing and snapping for nodes and markers. Each leaf holds a
//! small bucket of entries; inserting past the bucket capacity splits the
//! leaf into four quadrant children and partitions the entries exclusively
//! (a point lives in exactly one child, unlike [`crate::LineTree`] which
//! replicates). Removals walk back up and collapse subtrees whose entries
//! fit a single bucket again.
//!
//! Positions are snapshotted at insertion: mutating an indexed entity's
//! position without an explicit remove + re-insert leaves the structure
//! intact, but `remove`/`find` descend by the currently reported position
//! and will simply miss the stale entry.

use crate::geom::{Point, Region};
use crate::{IndexError, Result};
use smallvec::SmallVec;

/// Maximum capacity of a leaf bucket before it splits
const SPLIT_THRESHOLD: usize = 8;

/// Maximum depth of the tree, guards against degenerate splits when many
/// entries share one position
const MAX_DEPTH: u32 = 20;

// Child indices in quadrant order
const NW: usize = 0;
const NE: usize = 1;
const SW: usize = 2;
const SE: usize = 3;

/// Capability exposed by anything stored in a [`PointTree`]
pub trait HasPosition {
    /// The entity's position in map pixel space
    fn position(&self) -> Point;
}

type Bucket<T> = SmallVec<[Entry<T>; SPLIT_THRESHOLD]>;

#[derive(Clone, Debug)]
struct Entry<T> {
    /// Position snapshot taken at insertion time
    position: Point,
    item: T,
}

#[derive(Clone, Debug)]
enum Node<T> {
    Leaf(Bucket<T>),
    Internal(Box<[Node<T>; 4]>),
}

impl<T> Node<T> {
    fn leaf() -> Self {
        Node::Leaf(SmallVec::new())
    }
}

/// The rectangle a node covers, in centered representation
///
/// Derived top-down during traversal instead of being stored per node.
#[derive(Clone, Copy, Debug)]
struct Quad {
    center: Point,
    half_width: f64,
    half_height: f64,
    depth: u32,
}

impl Quad {
    /// Quadrant a point belongs to; ties go east/south
    #[inline]
    fn direction(&self, point: Point) -> usize {
        if point.x < self.center.x {
            if point.y < self.center.y { NW } else { SW }
        } else if point.y < self.center.y {
            NE
        } else {
            SE
        }
    }

    /// The rectangle of the given child quadrant
    fn child(&self, direction: usize) -> Quad {
        let dx = match direction {
            NE | SE => self.half_width / 2.0,
            _ => -self.half_width / 2.0,
        };
        let dy = match direction {
            SW | SE => self.half_height / 2.0,
            _ => -self.half_height / 2.0,
        };
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

    /// Circle-rectangle overlap: clamp the circle center to the rectangle
    /// and compare the squared distance against the squared radius
    fn overlaps_circle(&self, center: Point, radius: f64) -> bool {
        let dx = ((center.x - self.center.x).abs() - self.half_width).max(0.0);
        let dy = ((center.y - self.center.y).abs() - self.half_height).max(0.0);
        dx * dx + dy * dy <= radius * radius
    }
}

/// A quadtree of point-like entries over a fixed `[0, width] x [0, height]`
/// pixel rectangle
///
/// Not internally synchronized; intended for single-threaded access from
/// the editing thread with external serialization if shared.
#[derive(Clone, Debug)]
pub struct PointTree<T> {
    root: Node<T>,
    len: usize,
    width: f64,
    height: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: HasPosition + PartialEq + Clone> PointTree<T> {
    /// Create an empty tree covering `[0, width] x [0, height]`
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            root: Node::leaf(),
            len: 0,
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

    /// Insert an entry at its current position
    ///
    /// Distinct items may share a position; equality is by item, not
    /// position. Rejects positions outside the tree bounds.
    pub fn add(&mut self, item: T) -> Result<()> {
        let position = item.position();
        if position.x < 0.0 || position.x > self.width || position.y < 0.0 || position.y > self.height
        {
            return Err(IndexError::OutOfBounds {
                x: position.x,
                y: position.y,
            });
        }

        let quad = self.root_quad();
        Self::add_rec(&mut self.root, Entry { position, item }, quad);
        self.len += 1;
        Ok(())
    }

    /// Insert every entry of an iterator
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<()> {
        for item in items {
            self.add(item)?;
        }
        Ok(())
    }

    fn add_rec(node: &mut Node<T>, entry: Entry<T>, quad: Quad) {
        match node {
            Node::Internal(children) => {
                let dir = quad.direction(entry.position);
                Self::add_rec(&mut children[dir], entry, quad.child(dir));
            }
            Node::Leaf(entries) => {
                entries.push(entry);
                if entries.len() > SPLIT_THRESHOLD && quad.depth < MAX_DEPTH {
                    Self::split(node, quad);
                }
            }
        }
    }

    /// Convert a full leaf into an internal node with four leaf children,
    /// partitioning the entries exclusively by quadrant
    fn split(node: &mut Node<T>, quad: Quad) {
        let entries = match node {
            Node::Leaf(entries) => std::mem::take(entries),
            Node::Internal(_) => return,
        };

        let mut children = Box::new([Node::leaf(), Node::leaf(), Node::leaf(), Node::leaf()]);
        for entry in entries {
            let dir = quad.direction(entry.position);
            if let Node::Leaf(bucket) = &mut children[dir] {
                bucket.push(entry);
            }
        }

        *node = Node::Internal(children);
    }

    /// Remove an entry, locating it by its currently reported position
    ///
    /// Returns whether an equal entry was found and removed. If the item's
    /// position changed since insertion the lookup descends into the wrong
    /// leaf and reports `false`.
    pub fn remove(&mut self, item: &T) -> bool {
        let quad = self.root_quad();
        let removed = Self::remove_rec(&mut self.root, item, item.position(), quad);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn remove_rec(node: &mut Node<T>, item: &T, position: Point, quad: Quad) -> bool {
        match node {
            Node::Leaf(entries) => {
                if let Some(index) = entries.iter().position(|e| e.item == *item) {
                    entries.remove(index);
                    true
                } else {
                    false
                }
            }
            Node::Internal(children) => {
                let dir = quad.direction(position);
                let removed = Self::remove_rec(&mut children[dir], item, position, quad.child(dir));
                if removed {
                    Self::try_collapse(node);
                }
                removed
            }
        }
    }

    /// Collapse an internal node back into a leaf when all its entries fit
    /// a single bucket again
    fn try_collapse(node: &mut Node<T>) {
        let mut gathered: Bucket<T> = SmallVec::new();
        if Self::gather(node, &mut gathered) {
            *node = Node::Leaf(gathered);
        }
    }

    /// Collect all entries under `node`, aborting early once the bucket
    /// capacity is exceeded
    fn gather(node: &Node<T>, out: &mut Bucket<T>) -> bool {
        match node {
            Node::Leaf(entries) => {
                for entry in entries {
                    out.push(entry.clone());
                }
                out.len() <= SPLIT_THRESHOLD
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

    /// Look up the stored instance equal to `item`, descending by the
    /// item's currently reported position
    pub fn find(&self, item: &T) -> Option<&T> {
        Self::find_rec(&self.root, item, item.position(), self.root_quad())
    }

    fn find_rec<'a>(node: &'a Node<T>, item: &T, position: Point, quad: Quad) -> Option<&'a T> {
        match node {
            Node::Leaf(entries) => entries.iter().find(|e| e.item == *item).map(|e| &e.item),
            Node::Internal(children) => {
                let dir = quad.direction(position);
                Self::find_rec(&children[dir], item, position, quad.child(dir))
            }
        }
    }

    /// Append every entry whose position lies within `region`
    ///
    /// Containment is closed on all four edges, but descent prunes
    /// subtrees with the strict rectangle overlap test: a region whose
    /// edge lies exactly on a quadrant boundary can miss an entry sitting
    /// exactly on that boundary. Viewport queries pad their region by a
    /// pixel rather than relying on exact edge hits.
    pub fn intersect(&self, region: &Region, out: &mut Vec<T>) {
        self.intersect_filtered(region, |_| true, out);
    }

    /// Like [`intersect`](Self::intersect) with a validity predicate, used
    /// by the editors to exclude e.g. a currently dragged entity
    pub fn intersect_filtered<F>(&self, region: &Region, mut valid: F, out: &mut Vec<T>)
    where
        F: FnMut(&T) -> bool,
    {
        if region.is_empty() {
            return;
        }
        Self::intersect_rec(&self.root, region, &mut valid, out, self.root_quad());
    }

    fn intersect_rec<F>(node: &Node<T>, region: &Region, valid: &mut F, out: &mut Vec<T>, quad: Quad)
    where
        F: FnMut(&T) -> bool,
    {
        match node {
            Node::Leaf(entries) => {
                for entry in entries {
                    if region.contains(entry.position) && valid(&entry.item) {
                        out.push(entry.item.clone());
                    }
                }
            }
            Node::Internal(children) => {
                for dir in NW..=SE {
                    let child_quad = quad.child(dir);
                    if region.intersects(&child_quad.region()) {
                        Self::intersect_rec(&children[dir], region, valid, out, child_quad);
                    }
                }
            }
        }
    }

    /// Append every entry strictly closer than `max_distance` to `point`
    pub fn near(&self, point: Point, max_distance: f64, out: &mut Vec<T>) {
        Self::near_rec(&self.root, point, max_distance, out, self.root_quad());
    }

    fn near_rec(node: &Node<T>, point: Point, max_distance: f64, out: &mut Vec<T>, quad: Quad) {
        match node {
            Node::Leaf(entries) => {
                for entry in entries {
                    if point.distance(entry.position) < max_distance {
                        out.push(entry.item.clone());
                    }
                }
            }
            Node::Internal(children) => {
                for dir in NW..=SE {
                    let child_quad = quad.child(dir);
                    if child_quad.overlaps_circle(point, max_distance) {
                        Self::near_rec(&children[dir], point, max_distance, out, child_quad);
                    }
                }
            }
        }
    }

    /// Branch-and-bound nearest-neighbor search
    ///
    /// Returns the entry minimizing the Euclidean distance to `point`,
    /// together with that distance, or `None` on an empty tree.
    pub fn nearest(&self, point: Point) -> Option<(T, f64)> {
        let mut best: Option<(T, f64)> = None;
        Self::nearest_rec(&self.root, point, &mut best, self.root_quad());
        best
    }

    fn nearest_rec(node: &Node<T>, point: Point, best: &mut Option<(T, f64)>, quad: Quad) {
        match node {
            Node::Leaf(entries) => {
                for entry in entries {
                    let distance = point.distance(entry.position);
                    if best.as_ref().is_none_or(|(_, d)| distance < *d) {
                        *best = Some((entry.item.clone(), distance));
                    }
                }
            }
            Node::Internal(children) => {
                for dir in NW..=SE {
                    // Only descend where a closer entry could exist
                    let radius = best.as_ref().map_or(f64::INFINITY, |(_, d)| *d);
                    let child_quad = quad.child(dir);
                    if child_quad.overlaps_circle(point, radius) {
                        Self::nearest_rec(&children[dir], point, best, child_quad);
                    }
                }
            }
        }
    }

    /// Number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reset to a single empty leaf
    pub fn clear(&mut self) {
        self.root = Node::leaf();
        self.len = 0;
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }
}
