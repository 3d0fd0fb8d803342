//! Outline assembly: region documents to line-segment batches.
//!
//! Each ring of every `Polygon`/`MultiPolygon` feature becomes one
//! [`LineSegmentBatch`], a flat list of points read two at a time as
//! independent segments (GL `LINES`).

use super::document::{parse_ring, RegionDocument};
use super::projection::SphereProjection;
use crate::config::GlobeConfig;
use geo_types::Coord;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How ring vertices are paired into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMode {
    /// One segment per consecutive vertex pair plus the closing segment back
    /// to the first vertex. N vertices give 2N points (none for N < 2). A ring
    /// that already repeats its first vertex at the end, as GeoJSON rings do,
    /// is not closed a second time and gives 2(N - 1) points.
    #[default]
    Closed,
    /// Every vertex after the first is emitted twice:
    /// `p0, p1, p1, p2, p2, ..., pN-1, pN-1`. Connected but never closed,
    /// with a dangling final point. N vertices give 2N - 1 points.
    OpenChain,
}

/// What to do with a ring that is not a list of numeric positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRingPolicy {
    /// Drop the ring, keep the rest of the document
    #[default]
    SkipRing,
    /// Drop every outline of the document
    SkipDocument,
}

/// Errors raised while assembling outlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// A ring did not hold numeric `[lon, lat]` positions.
    MalformedRing {
        feature: usize,
        polygon: usize,
        ring: usize,
    },
}

impl std::fmt::Display for OutlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutlineError::MalformedRing {
                feature,
                polygon,
                ring,
            } => write!(
                f,
                "malformed ring {} of polygon {} in feature {}",
                ring, polygon, feature
            ),
        }
    }
}

impl std::error::Error for OutlineError {}

/// Drawable outline of a single ring. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegmentBatch {
    positions: Vec<Vec3>,
}

impl LineSegmentBatch {
    /// Projects a ring and pairs its vertices according to `mode`.
    pub fn from_ring(ring: &[Coord<f64>], projection: &SphereProjection, mode: SegmentMode) -> Self {
        let points: Vec<Vec3> = ring.iter().map(|c| projection.project(*c)).collect();

        let positions = match mode {
            SegmentMode::Closed => {
                if ring.len() < 2 {
                    Vec::new()
                } else {
                    let mut positions = Vec::with_capacity(points.len() * 2);
                    for pair in points.windows(2) {
                        positions.extend_from_slice(pair);
                    }
                    if ring.first() != ring.last() {
                        positions.push(points[points.len() - 1]);
                        positions.push(points[0]);
                    }
                    positions
                }
            }
            SegmentMode::OpenChain => {
                let mut positions = Vec::with_capacity((points.len() * 2).saturating_sub(1));
                for (i, point) in points.iter().enumerate() {
                    positions.push(*point);
                    if i > 0 {
                        positions.push(*point);
                    }
                }
                positions
            }
        };

        Self { positions }
    }

    /// Points of the batch, two per segment.
    #[cfg(test)]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of complete segments; a trailing unpaired point is not drawn.
    pub fn segment_count(&self) -> usize {
        self.len() / 2
    }

    /// Interleaved `x, y, z` floats for a vertex buffer.
    pub fn vertex_data(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }
}

/// Turns region documents into outline batches.
#[derive(Debug, Clone, Copy)]
pub struct OutlineBuilder {
    projection: SphereProjection,
    mode: SegmentMode,
    malformed: MalformedRingPolicy,
}

impl Default for OutlineBuilder {
    fn default() -> Self {
        Self::new(
            SphereProjection::default(),
            SegmentMode::default(),
            MalformedRingPolicy::default(),
        )
    }
}

impl OutlineBuilder {
    pub fn new(
        projection: SphereProjection,
        mode: SegmentMode,
        malformed: MalformedRingPolicy,
    ) -> Self {
        Self {
            projection,
            mode,
            malformed,
        }
    }

    /// Creates a builder matching the globe configuration.
    pub fn from_config(config: &GlobeConfig) -> Self {
        Self::new(
            SphereProjection::new(config.radius),
            config.segment_mode,
            config.malformed_rings,
        )
    }

    /// Builds one batch per ring of every areal feature.
    ///
    /// Documents without a feature list and features with badly nested
    /// coordinates are skipped with a warning. Malformed rings follow the
    /// configured [`MalformedRingPolicy`]; under `SkipDocument` the first one
    /// is returned as an error.
    pub fn build(&self, document: &RegionDocument) -> Result<Vec<LineSegmentBatch>, OutlineError> {
        let Some(features) = document.features.as_ref() else {
            log::warn!("Invalid GeoJSON format: document has no feature list");
            return Ok(Vec::new());
        };

        let mut batches = Vec::new();

        for (feature_idx, feature) in features.iter().enumerate() {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            if !geometry.kind.is_areal() {
                continue;
            }

            let polygons = match geometry.polygons() {
                Ok(polygons) => polygons,
                Err(e) => {
                    log::warn!(
                        "Skipping feature {} ({}): {}",
                        feature_idx,
                        feature.label().unwrap_or("unnamed"),
                        e
                    );
                    continue;
                }
            };

            for (polygon_idx, rings) in polygons.iter().enumerate() {
                for (ring_idx, raw_ring) in rings.iter().enumerate() {
                    match parse_ring(raw_ring) {
                        Some(ring) => batches.push(LineSegmentBatch::from_ring(
                            &ring,
                            &self.projection,
                            self.mode,
                        )),
                        None => {
                            let err = OutlineError::MalformedRing {
                                feature: feature_idx,
                                polygon: polygon_idx,
                                ring: ring_idx,
                            };
                            match self.malformed {
                                MalformedRingPolicy::SkipRing => {
                                    log::warn!("Skipping {}", err);
                                }
                                MalformedRingPolicy::SkipDocument => return Err(err),
                            }
                        }
                    }
                }
            }
        }

        Ok(batches)
    }

    /// Like [`build`](Self::build), but a rejected document contributes
    /// nothing instead of an error.
    pub fn build_or_skip(&self, document: &RegionDocument) -> Vec<LineSegmentBatch> {
        match self.build(document) {
            Ok(batches) => batches,
            Err(e) => {
                log::warn!("Skipping document: {}", e);
                Vec::new()
            }
        }
    }
}

/// Runs `project` over every present document once all loads have settled.
///
/// Returns `None` without calling `project` when no document was loaded.
pub fn assemble_outlines<F>(
    documents: &[Option<RegionDocument>],
    mut project: F,
) -> Option<Vec<LineSegmentBatch>>
where
    F: FnMut(&RegionDocument) -> Vec<LineSegmentBatch>,
{
    if documents.iter().all(Option::is_none) {
        log::error!("No GeoJSON files were successfully loaded.");
        return None;
    }

    let batches = documents
        .iter()
        .flatten()
        .flat_map(|document| project(document))
        .collect();

    Some(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Vec<Coord<f64>> {
        (0..n)
            .map(|i| Coord {
                x: i as f64 * 10.0,
                y: 20.0 + i as f64,
            })
            .collect()
    }

    fn document(json: &str) -> RegionDocument {
        RegionDocument::from_json(json).unwrap()
    }

    #[test]
    fn test_closed_ring_length() {
        let projection = SphereProjection::default();
        for n in 0..6 {
            let batch = LineSegmentBatch::from_ring(&ring(n), &projection, SegmentMode::Closed);
            let expected = if n < 2 { 0 } else { 2 * n };
            assert_eq!(batch.len(), expected);
        }
    }

    #[test]
    fn test_closed_ring_pairs_and_closure() {
        let projection = SphereProjection::default();
        let coords = ring(3);
        let batch = LineSegmentBatch::from_ring(&coords, &projection, SegmentMode::Closed);
        let p: Vec<Vec3> = coords.iter().map(|c| projection.project(*c)).collect();

        assert_eq!(batch.positions(), &[p[0], p[1], p[1], p[2], p[2], p[0]]);
        assert_eq!(batch.segment_count(), 3);
    }

    #[test]
    fn test_closed_ring_with_repeated_first_vertex() {
        let projection = SphereProjection::default();
        let mut coords = ring(3);
        coords.push(coords[0]);

        let batch = LineSegmentBatch::from_ring(&coords, &projection, SegmentMode::Closed);
        let p: Vec<Vec3> = coords.iter().map(|c| projection.project(*c)).collect();

        assert_eq!(batch.positions(), &[p[0], p[1], p[1], p[2], p[2], p[0]]);
        assert_eq!(batch.segment_count(), 3);
        assert!(batch
            .positions()
            .chunks(2)
            .all(|segment| segment[0] != segment[1]));
    }

    #[test]
    fn test_open_chain_stream() {
        let projection = SphereProjection::default();
        let coords = ring(3);
        let batch = LineSegmentBatch::from_ring(&coords, &projection, SegmentMode::OpenChain);
        let p: Vec<Vec3> = coords.iter().map(|c| projection.project(*c)).collect();

        assert_eq!(batch.positions(), &[p[0], p[1], p[1], p[2], p[2]]);
        assert_eq!(batch.segment_count(), 2);

        for n in 1..6 {
            let batch = LineSegmentBatch::from_ring(&ring(n), &projection, SegmentMode::OpenChain);
            assert_eq!(batch.len(), 2 * n - 1);
        }
        assert!(LineSegmentBatch::from_ring(&[], &projection, SegmentMode::OpenChain).is_empty());
    }

    #[test]
    fn test_transform_is_deterministic() {
        let projection = SphereProjection::default();
        let coords = ring(40);
        let a = LineSegmentBatch::from_ring(&coords, &projection, SegmentMode::Closed);
        let b = LineSegmentBatch::from_ring(&coords, &projection, SegmentMode::Closed);

        let bits = |batch: &LineSegmentBatch| -> Vec<u32> {
            batch.vertex_data().iter().map(|f| f.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.vertex_data().len(), a.len() * 3);
    }

    #[test]
    fn test_polygon_batch_per_ring() {
        let doc = document(
            r#"{ "features": [{ "geometry": { "type": "Polygon", "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 0]],
                [[2, 2], [3, 2], [3, 3], [2, 2]],
                [[5, 5], [6, 5], [6, 6], [5, 5]]
            ] } }] }"#,
        );

        let batches = OutlineBuilder::default().build(&doc).unwrap();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.segment_count() == 3));
    }

    #[test]
    fn test_multipolygon_batch_per_polygon_ring() {
        // 3 polygons x 2 rings
        let polygon = r#"[[[0, 0], [1, 0], [1, 1], [0, 0]], [[0.2, 0.2], [0.3, 0.2], [0.3, 0.3], [0.2, 0.2]]]"#;
        let json = format!(
            r#"{{ "features": [{{ "geometry": {{ "type": "MultiPolygon", "coordinates": [{p}, {p}, {p}] }} }}] }}"#,
            p = polygon
        );

        let batches = OutlineBuilder::default().build(&document(&json)).unwrap();
        assert_eq!(batches.len(), 6);
    }

    #[test]
    fn test_empty_and_missing_features() {
        let builder = OutlineBuilder::default();
        assert!(builder.build(&document(r#"{ "features": [] }"#)).unwrap().is_empty());
        assert!(builder
            .build(&document(r#"{ "type": "Polygon", "coordinates": [] }"#))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_areal_geometry_ignored() {
        let doc = document(
            r#"{ "features": [
                { "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "geometry": { "type": "Point", "coordinates": [0, 0] } },
                { "geometry": { "type": "Hexagon", "coordinates": [] } },
                { "geometry": null }
            ] }"#,
        );

        assert!(OutlineBuilder::default().build(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_badly_nested_feature_skipped() {
        let doc = document(
            r#"{ "features": [
                { "geometry": { "type": "Polygon", "coordinates": 12 } },
                { "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 0]]] } }
            ] }"#,
        );

        assert_eq!(OutlineBuilder::default().build(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_ring_policies() {
        let doc = document(
            r#"{ "features": [{ "geometry": { "type": "Polygon", "coordinates": [
                [[0, 0], [1, 0], [0, 0]],
                [[0, 0], ["east", 0], [0, 0]]
            ] } }] }"#,
        );

        let skip_ring = OutlineBuilder::new(
            SphereProjection::default(),
            SegmentMode::Closed,
            MalformedRingPolicy::SkipRing,
        );
        assert_eq!(skip_ring.build(&doc).unwrap().len(), 1);

        let skip_document = OutlineBuilder::new(
            SphereProjection::default(),
            SegmentMode::Closed,
            MalformedRingPolicy::SkipDocument,
        );
        assert_eq!(
            skip_document.build(&doc),
            Err(OutlineError::MalformedRing {
                feature: 0,
                polygon: 0,
                ring: 1
            })
        );
        assert!(skip_document.build_or_skip(&doc).is_empty());
    }

    #[test]
    fn test_assemble_skips_projector_when_all_absent() {
        let documents: Vec<Option<RegionDocument>> = vec![None, None, None];
        let mut calls = 0;

        let result = assemble_outlines(&documents, |_| {
            calls += 1;
            Vec::new()
        });

        assert!(result.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_assemble_projects_present_documents() {
        let polygon = r#"{ "features": [{ "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 0]]] } }] }"#;
        let documents = vec![Some(document(polygon)), None, Some(document(polygon))];
        let builder = OutlineBuilder::default();
        let mut calls = 0;

        let batches = assemble_outlines(&documents, |doc| {
            calls += 1;
            builder.build_or_skip(doc)
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(batches.len(), 2);
    }
}
