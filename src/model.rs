//! Road-graph entities indexed by the spatial trees
//!
//! Plain data carriers in map pixel space: streets are ordered polylines
//! between two graph nodes, nodes know their outgoing links, markers are
//! named points of interest. The trees store [`ObjectId`]s (or whole
//! [`Marker`]s) rather than the entities themselves, so these types stay
//! cheap to clone and free of interior references.

use std::collections::HashMap;
use std::fmt;

use crate::geom::Point;
use crate::point_tree::HasPosition;

/// Identity of a map entity, unique within its layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out sequential [`ObjectId`]s
///
/// One allocator per layer; loading a saved map calls
/// [`set_start`](Self::set_start) past the highest persisted id before any
/// editing resumes.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next unused id, advancing the counter
    pub fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// Continue allocating from `start`
    pub fn set_start(&mut self, start: u32) {
        self.next = start;
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Directed connection out of a [`Node`]: which neighbor is reached and
/// along which street
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub id: ObjectId,
    /// The node this link leads to
    pub node: ObjectId,
    /// The street traveled to get there
    pub street: ObjectId,
}

impl Link {
    pub fn new(id: ObjectId, node: ObjectId, street: ObjectId) -> Self {
        Self { id, node, street }
    }
}

/// A road-graph vertex
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: ObjectId,
    pub position: Point,
    links: HashMap<ObjectId, Link>,
}

impl Node {
    pub fn new(id: ObjectId, position: Point) -> Self {
        Self {
            id,
            position,
            links: HashMap::new(),
        }
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.insert(link.id, link);
    }

    pub fn link(&self, id: ObjectId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn contains_link(&self, id: ObjectId) -> bool {
        self.links.contains_key(&id)
    }

    pub fn remove_link(&mut self, id: ObjectId) -> Option<Link> {
        self.links.remove(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
    }
}

impl HasPosition for Node {
    fn position(&self) -> Point {
        self.position
    }
}

/// Nodes compare by identity; position and links are editable state
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

/// Rendering category of a street, widest road last
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreetKind {
    Street,
    Avenue,
    Boulevard,
}

impl StreetKind {
    /// Stroke width in pixels at the maximum zoom level
    pub fn width(self) -> f64 {
        match self {
            StreetKind::Street => 8.0,
            StreetKind::Avenue => 12.0,
            StreetKind::Boulevard => 16.0,
        }
    }
}

/// An ordered polyline between two graph nodes
///
/// `points` holds the full-resolution geometry at the maximum zoom level,
/// endpoints included; the per-zoom indexes are derived from it by
/// [`RoadLayer::build_line_index`](crate::RoadLayer::build_line_index).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Street {
    pub id: ObjectId,
    pub kind: StreetKind,
    pub name: Option<String>,
    pub start: ObjectId,
    pub end: ObjectId,
    pub points: Vec<Point>,
}

impl Street {
    pub fn new(id: ObjectId, kind: StreetKind, start: ObjectId, end: ObjectId) -> Self {
        Self {
            id,
            kind,
            name: None,
            start,
            end,
            points: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }
}

/// Streets compare by identity, like nodes
impl PartialEq for Street {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Street {}

/// A named point of interest
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub id: ObjectId,
    pub name: String,
    pub position: Point,
}

impl Marker {
    pub fn new(id: ObjectId, name: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }
}

impl HasPosition for Marker {
    fn position(&self) -> Point {
        self.position
    }
}

/// Markers compare by identity so index removal keeps working while a
/// marker is renamed or dragged
impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Marker {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocator_sequence() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), ObjectId::new(0));
        assert_eq!(ids.next_id(), ObjectId::new(1));
        assert_eq!(ids.next_id(), ObjectId::new(2));

        ids.reset();
        assert_eq!(ids.next_id(), ObjectId::new(0));

        ids.set_start(100);
        assert_eq!(ids.next_id(), ObjectId::new(100));
        assert_eq!(ids.next_id().value(), 101);
    }

    #[test]
    fn test_node_links() {
        let mut node = Node::new(ObjectId::new(0), Point::new(10.0, 10.0));
        let link = Link::new(ObjectId::new(5), ObjectId::new(1), ObjectId::new(2));

        node.add_link(link);
        assert!(node.contains_link(ObjectId::new(5)));
        assert_eq!(node.link(ObjectId::new(5)), Some(&link));
        assert_eq!(node.link_count(), 1);
        assert!(node.link(ObjectId::new(6)).is_none());

        assert_eq!(node.remove_link(ObjectId::new(5)), Some(link));
        assert!(!node.contains_link(ObjectId::new(5)));
        assert_eq!(node.link_count(), 0);
    }

    #[test]
    fn test_identity_equality() {
        let a = Marker::new(ObjectId::new(1), "Museum", Point::new(5.0, 5.0));
        let mut b = a.clone();
        b.name = "Renamed".into();
        b.position = Point::new(9.0, 9.0);
        assert_eq!(a, b);

        let other = Marker::new(ObjectId::new(2), "Museum", Point::new(5.0, 5.0));
        assert_ne!(a, other);

        let s1 = Street::new(ObjectId::new(3), StreetKind::Avenue, ObjectId::new(0), ObjectId::new(1));
        let s2 = Street::new(ObjectId::new(3), StreetKind::Boulevard, ObjectId::new(7), ObjectId::new(8))
            .with_name("Main");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_marker_position() {
        let marker = Marker::new(ObjectId::new(0), "Station", Point::new(12.0, 34.0));
        assert_eq!(marker.position(), Point::new(12.0, 34.0));
    }
}
