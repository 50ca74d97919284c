use geo::{BoundingRect, Rect};
use rstar::{RTreeObject, AABB};

use super::District;

/// Envelope of one district inside the adjacency R-tree.
#[derive(Debug, Clone)]
pub(super) struct DistrictEnvelope {
    position: usize, // into the district slice
    rect: Rect<f64>,
}

impl DistrictEnvelope {
    /// `None` for empty geometry.
    pub(super) fn of(position: usize, district: &District) -> Option<Self> {
        district.shape.bounding_rect().map(|rect| Self { position, rect })
    }

    pub(super) fn position(&self) -> usize { self.position }

    /// Query window covering every envelope that could share a boundary point.
    pub(super) fn search_window(&self) -> AABB<[f64; 2]> { self.envelope() }
}

impl RTreeObject for DistrictEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.rect.min().into(), self.rect.max().into())
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};
    use rstar::RTree;

    use super::*;

    fn district(id: i64, x: f64) -> District {
        District::new(id, MultiPolygon::new(vec![polygon![
            (x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0)
        ]]))
    }

    #[test]
    fn touching_envelopes_are_candidates() {
        let districts = [district(1, 0.0), district(2, 1.0), district(3, 4.0)];
        let envelopes = districts.iter().enumerate()
            .filter_map(|(i, d)| DistrictEnvelope::of(i, d))
            .collect::<Vec<_>>();
        let rtree = RTree::bulk_load(envelopes.clone());

        let mut hits = rtree.locate_in_envelope_intersecting(&envelopes[0].search_window())
            .map(DistrictEnvelope::position)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn empty_geometry_has_no_envelope() {
        assert!(DistrictEnvelope::of(0, &District::new(9, MultiPolygon::new(vec![]))).is_none());
    }
}
