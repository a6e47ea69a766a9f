use crate::types::*;
use geo_types::{MultiPolygon, Polygon};

/// Dissolves the polygons of one mosaic into a single geometry.
///
/// Polygons produced by [`crate::polygonize::polygonize`] for the same mosaic
/// are pairwise disjoint, so their union is the multipolygon of all of them.
pub fn dissolve(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons)
}

/// Unweighted mean of the regional eligibility shares.
pub fn mean_share(records: &[RasterRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.metrics.eligibility_share).sum();
    Some(sum / records.len() as f64)
}

pub fn aggregate(group: &Group, polygons: Vec<Polygon<f64>>) -> GroupResult {
    GroupResult {
        technology: group.key.technology.clone(),
        scenario: group.key.scenario.clone(),
        total_available_area: group.records.iter().map(|r| r.metrics.available_area).sum(),
        total_power_potential: group.records.iter().map(|r| r.metrics.power_potential).sum(),
        mean_eligibility_share: mean_share(&group.records),
        merged_geometry: dissolve(polygons),
    }
}
