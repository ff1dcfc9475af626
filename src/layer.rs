//! Editable map layers and index construction
//!
//! [`RoadLayer`] owns the road graph (nodes and streets), [`MarkerLayer`]
//! the points of interest. Layers are the source of truth the editors
//! mutate; the spatial indexes are derived views rebuilt from them at load
//! time.
//!
//! # Performance
//!
//! [`RoadLayer::build_line_index`] runs the Douglas-Peucker pass for each
//! street in parallel with rayon and only inserts sequentially, since
//! simplification dominates the build on real maps.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::Result;
use crate::geom::Point;
use crate::line_tree::{Line, LineTree};
use crate::model::{Marker, Node, ObjectId, Street, StreetKind};
use crate::point_tree::PointTree;
use crate::simplify::simplify;

/// Streets thinner than this many pixels at a zoom level are left out of
/// that level's index entirely
const MIN_VISIBLE_WIDTH: f64 = 2.0;

/// Stroke width of a street kind at `zoom`, halving per level below the top
fn scaled_width(kind: StreetKind, zoom: usize, zoom_levels: usize) -> f64 {
    kind.width() / 2f64.powi((zoom_levels - zoom - 1) as i32)
}

/// The road graph of a map: nodes and the streets connecting them
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadLayer {
    nodes: HashMap<ObjectId, Node>,
    streets: HashMap<ObjectId, Street>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RoadLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub fn node(&self, id: ObjectId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: ObjectId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn remove_node(&mut self, id: ObjectId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn contains_node(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_street(&mut self, street: Street) {
        self.streets.insert(street.id, street);
    }

    pub fn street(&self, id: ObjectId) -> Option<&Street> {
        self.streets.get(&id)
    }

    pub fn street_mut(&mut self, id: ObjectId) -> Option<&mut Street> {
        self.streets.get_mut(&id)
    }

    pub fn remove_street(&mut self, id: ObjectId) -> Option<Street> {
        self.streets.remove(&id)
    }

    pub fn contains_street(&self, id: ObjectId) -> bool {
        self.streets.contains_key(&id)
    }

    pub fn streets(&self) -> impl Iterator<Item = &Street> {
        self.streets.values()
    }

    pub fn street_count(&self) -> usize {
        self.streets.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.streets.clear();
    }

    /// Build the per-zoom segment index for every street
    ///
    /// The top zoom level indexes the raw polylines. Each level below it
    /// halves the coordinate scale, skips streets rendered thinner than
    /// [`MIN_VISIBLE_WIDTH`] pixels, and simplifies the remaining
    /// polylines with tolerance `2^(zoom_levels - zoom - 1)` before
    /// segmenting, so coarser levels hold fewer and shorter segments.
    ///
    /// `width` and `height` are the map's pixel size at the top zoom
    /// level; street geometry outside it is an
    /// [`OutOfBounds`](crate::IndexError::OutOfBounds) error.
    pub fn build_line_index(
        &self,
        width: f64,
        height: f64,
        zoom_levels: usize,
    ) -> Result<LineTree<ObjectId>> {
        let mut tree = LineTree::new(width, height, zoom_levels);
        let Some(top) = zoom_levels.checked_sub(1) else {
            return Ok(tree);
        };

        for street in self.streets.values() {
            if street.points.len() < 2 {
                tracing::warn!(street = %street.id, "skipping street with no geometry");
                continue;
            }
            for pair in street.points.windows(2) {
                tree.add(Line::new(pair[0], pair[1], street.id), top)?;
            }
        }

        for zoom in (0..top).rev() {
            let tolerance = 2f64.powi((zoom_levels - zoom - 1) as i32);
            let scale = 0.5f64.powi((top - zoom) as i32);

            let simplified = self
                .streets
                .par_iter()
                .filter(|(_, street)| {
                    street.points.len() >= 2
                        && scaled_width(street.kind, zoom, zoom_levels) >= MIN_VISIBLE_WIDTH
                })
                .map(|(_, street)| Ok((street.id, simplify(&street.points, tolerance)?)))
                .collect::<Result<Vec<(ObjectId, Vec<Point>)>>>()?;

            for (id, points) in simplified {
                for pair in points.windows(2) {
                    let a = Point::new(pair[0].x * scale, pair[0].y * scale);
                    let b = Point::new(pair[1].x * scale, pair[1].y * scale);
                    tree.add(Line::new(a, b, id), zoom)?;
                }
            }
        }

        tracing::debug!(
            streets = self.streets.len(),
            zoom_levels,
            "street index built"
        );
        Ok(tree)
    }

    /// Build the point index used for node hit-testing and snapping
    ///
    /// Nodes outside the indexed rectangle are skipped with a warning;
    /// the editor treats them as unreachable until they are moved back.
    pub fn build_node_index(&self, width: f64, height: f64) -> PointTree<Node> {
        let mut tree = PointTree::new(width, height);
        for node in self.nodes.values() {
            if tree.add(node.clone()).is_err() {
                tracing::warn!(node = %node.id, "node outside map bounds, not indexed");
            }
        }
        tree
    }
}

/// The points of interest of a map
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerLayer {
    markers: HashMap<ObjectId, Marker>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.insert(marker.id, marker);
    }

    pub fn marker(&self, id: ObjectId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn marker_mut(&mut self, id: ObjectId) -> Option<&mut Marker> {
        self.markers.get_mut(&id)
    }

    pub fn remove_marker(&mut self, id: ObjectId) -> Option<Marker> {
        self.markers.remove(&id)
    }

    pub fn contains_marker(&self, id: ObjectId) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Build the point index used for marker hit-testing
    ///
    /// Markers outside the indexed rectangle are skipped with a warning.
    pub fn build_index(&self, width: f64, height: f64) -> PointTree<Marker> {
        let mut tree = PointTree::new(width, height);
        for marker in self.markers.values() {
            if tree.add(marker.clone()).is_err() {
                tracing::warn!(marker = %marker.id, "marker outside map bounds, not indexed");
            }
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Region;

    fn street(
        ids: &mut crate::IdAllocator,
        kind: StreetKind,
        points: &[(f64, f64)],
    ) -> Street {
        let start = ids.next_id();
        let end = ids.next_id();
        Street::new(ids.next_id(), kind, start, end)
            .with_points(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_road_layer_crud() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();

        let node = Node::new(ids.next_id(), Point::new(10.0, 10.0));
        let node_id = node.id;
        layer.add_node(node);
        assert!(layer.contains_node(node_id));
        assert_eq!(layer.node_count(), 1);
        assert_eq!(layer.node(node_id).map(|n| n.position), Some(Point::new(10.0, 10.0)));

        let s = street(&mut ids, StreetKind::Avenue, &[(0.0, 0.0), (10.0, 0.0)]);
        let street_id = s.id;
        layer.add_street(s);
        assert!(layer.contains_street(street_id));
        assert_eq!(layer.street_count(), 1);

        assert!(layer.remove_street(street_id).is_some());
        assert!(!layer.contains_street(street_id));
        assert!(layer.remove_node(node_id).is_some());

        layer.add_node(Node::new(ids.next_id(), Point::ZERO));
        layer.clear();
        assert_eq!(layer.node_count(), 0);
        assert_eq!(layer.street_count(), 0);
    }

    #[test]
    fn test_build_line_index_top_zoom_raw() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();
        let s = street(
            &mut ids,
            StreetKind::Boulevard,
            &[(10.0, 10.0), (30.0, 10.0), (30.0, 40.0)],
        );
        let street_id = s.id;
        layer.add_street(s);

        let tree = layer.build_line_index(100.0, 100.0, 3).unwrap();
        assert_eq!(tree.zoom_levels(), 3);

        // Two raw segments at the top zoom level
        let mut list = Vec::new();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 2, &mut list);
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|l| l.value == street_id));
    }

    #[test]
    fn test_build_line_index_simplifies_and_scales() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();
        // Collinear midpoint drops out at every simplified level
        let s = street(
            &mut ids,
            StreetKind::Boulevard,
            &[(10.0, 10.0), (20.0, 20.0), (30.0, 30.0)],
        );
        let street_id = s.id;
        layer.add_street(s);

        let tree = layer.build_line_index(100.0, 100.0, 3).unwrap();

        let mut list = Vec::new();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 2, &mut list);
        assert_eq!(list.len(), 2);

        // Zoom 1: one segment, coordinates halved
        list.clear();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 1, &mut list);
        assert_eq!(list.len(), 1);
        let expected = Line::new(Point::new(5.0, 5.0), Point::new(15.0, 15.0), street_id);
        assert_eq!(list[0], expected);

        // Zoom 0: quartered
        list.clear();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 0, &mut list);
        assert_eq!(list.len(), 1);
        let expected = Line::new(Point::new(2.5, 2.5), Point::new(7.5, 7.5), street_id);
        assert_eq!(list[0], expected);
    }

    #[test]
    fn test_build_line_index_width_cutoff() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();
        let narrow = street(&mut ids, StreetKind::Street, &[(10.0, 10.0), (40.0, 10.0)]);
        let wide = street(&mut ids, StreetKind::Boulevard, &[(10.0, 30.0), (40.0, 30.0)]);
        let narrow_id = narrow.id;
        let wide_id = wide.id;
        layer.add_street(narrow);
        layer.add_street(wide);

        // With 4 levels, zoom 0 renders a street at 8 / 2^3 = 1 pixel
        // (dropped) and a boulevard at 16 / 2^3 = 2 pixels (kept)
        let tree = layer.build_line_index(100.0, 100.0, 4).unwrap();

        let mut list = Vec::new();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 0, &mut list);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value, wide_id);

        // Both present at the top zoom level
        list.clear();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 3, &mut list);
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|l| l.value == narrow_id));
    }

    #[test]
    fn test_build_line_index_skips_degenerate_streets() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();
        let lonely = street(&mut ids, StreetKind::Street, &[(50.0, 50.0)]);
        layer.add_street(lonely);
        let ok = street(&mut ids, StreetKind::Street, &[(10.0, 10.0), (20.0, 10.0)]);
        let ok_id = ok.id;
        layer.add_street(ok);

        let tree = layer.build_line_index(100.0, 100.0, 1).unwrap();
        let mut list = Vec::new();
        tree.intersect(&Region::new(0.0, 0.0, 100.0, 100.0), 0, &mut list);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value, ok_id);
    }

    #[test]
    fn test_build_line_index_zero_levels() {
        let layer = RoadLayer::new();
        let tree = layer.build_line_index(100.0, 100.0, 0).unwrap();
        assert_eq!(tree.zoom_levels(), 0);
    }

    #[test]
    fn test_marker_layer_index() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = MarkerLayer::new();
        let station = Marker::new(ids.next_id(), "Station", Point::new(40.0, 40.0));
        let museum = Marker::new(ids.next_id(), "Museum", Point::new(80.0, 20.0));
        // Outside the 100x100 map, skipped at build time
        let stray = Marker::new(ids.next_id(), "Stray", Point::new(500.0, 500.0));
        layer.add_marker(station.clone());
        layer.add_marker(museum.clone());
        layer.add_marker(stray);
        assert_eq!(layer.marker_count(), 3);

        let tree = layer.build_index(100.0, 100.0);
        assert_eq!(tree.len(), 2);

        let (nearest, _) = tree.nearest(Point::new(42.0, 42.0)).unwrap();
        assert_eq!(nearest, station);
        assert!(tree.find(&museum).is_some());
    }

    #[test]
    fn test_node_index() {
        let mut ids = crate::IdAllocator::new();
        let mut layer = RoadLayer::new();
        let node = Node::new(ids.next_id(), Point::new(25.0, 75.0));
        layer.add_node(node.clone());

        let tree = layer.build_node_index(100.0, 100.0);
        assert_eq!(tree.len(), 1);
        let (found, distance) = tree.nearest(Point::new(25.0, 70.0)).unwrap();
        assert_eq!(found, node);
        assert!((distance - 5.0).abs() < 1e-9);
    }
}
