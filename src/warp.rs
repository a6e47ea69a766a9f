use crate::raster_io::RasterIO;
use crate::types::*;
use gdal::spatial_ref::SpatialRef;
use ndarray::Array2;
use proj::Proj;
use tracing::debug;

pub const TARGET_EPSG: u32 = 4326;

/// Sentinel used for cells outside the source when the raster declares no nodata.
pub const DEFAULT_NODATA: f64 = 0.0;

const EDGE_SAMPLES: usize = 21;

pub fn target_crs() -> String {
    format!("EPSG:{}", TARGET_EPSG)
}

pub fn target_wkt() -> Result<String> {
    Ok(SpatialRef::from_epsg(TARGET_EPSG)?.to_wkt()?)
}

fn is_north_up(transform: &[f64; 6]) -> bool {
    transform[2] == 0.0 && transform[4] == 0.0 && transform[1] > 0.0 && transform[5] < 0.0
}

fn is_target_crs(projection: &str) -> Result<bool> {
    let srs = SpatialRef::from_wkt(projection)?;
    Ok(srs.auth_code().map(|code| code == TARGET_EPSG as i32).unwrap_or(false))
}

/// Nearest-neighbour reprojection of `raster` onto a north-up EPSG:4326 grid.
///
/// Rasters that are already north-up EPSG:4326 are returned unchanged apart
/// from a guaranteed nodata value.
pub fn reproject_to_target(raster: &RasterData) -> Result<RasterData> {
    if raster.projection.trim().is_empty() {
        return Err(AggregateError::Raster(
            "Raster has no coordinate reference system".to_string(),
        ));
    }

    let nodata = raster.no_data_value.unwrap_or(DEFAULT_NODATA);

    if is_north_up(&raster.transform) && is_target_crs(&raster.projection)? {
        debug!("Raster already in {}, skipping reprojection", target_crs());
        return Ok(RasterData {
            no_data_value: Some(nodata),
            ..raster.clone()
        });
    }

    let forward = Proj::new_known_crs(&raster.projection, &target_crs(), None)?;
    let inverse = Proj::new_known_crs(&target_crs(), &raster.projection, None)?;

    let (width, height) = (raster.width(), raster.height());
    let (min_x, min_y, max_x, max_y) = target_extent(raster, &forward)?;

    // Square pixels preserving the number of pixels along the diagonal.
    let diagonal_px = ((width * width + height * height) as f64).sqrt();
    let res = ((max_x - min_x).powi(2) + (max_y - min_y).powi(2)).sqrt() / diagonal_px;
    if !(res.is_finite() && res > 0.0) {
        return Err(AggregateError::Raster(format!(
            "Cannot derive target resolution from extent ({}, {}, {}, {})",
            min_x, min_y, max_x, max_y
        )));
    }

    let out_width = (((max_x - min_x) / res).round() as usize).max(1);
    let out_height = (((max_y - min_y) / res).round() as usize).max(1);
    let out_transform = [min_x, res, 0.0, max_y, 0.0, -res];

    debug!(
        "Reprojecting {}x{} raster to {}x{} at {:.8}°",
        width, height, out_width, out_height, res
    );

    let inv_source = RasterIO::invert_transform(&raster.transform);
    let mut out = Array2::from_elem((out_height, out_width), nodata);

    for ((row, col), cell) in out.indexed_iter_mut() {
        let (lon, lat) = RasterIO::pixel_to_world(col as f64 + 0.5, row as f64 + 0.5, &out_transform);
        let Ok((sx, sy)) = inverse.convert((lon, lat)) else {
            continue;
        };
        if !(sx.is_finite() && sy.is_finite()) {
            continue;
        }
        let (scol, srow) = RasterIO::world_to_pixel(sx, sy, &inv_source);
        if scol < 0.0 || srow < 0.0 {
            continue;
        }
        let (scol, srow) = (scol.floor() as usize, srow.floor() as usize);
        if scol < width && srow < height {
            let value = raster.data[[srow, scol]];
            *cell = match raster.no_data_value {
                Some(src_nodata) if value == src_nodata => nodata,
                _ => value,
            };
        }
    }

    Ok(RasterData {
        data: out,
        transform: out_transform,
        projection: target_wkt()?,
        no_data_value: Some(nodata),
    })
}

/// Bounding box of the raster outline in target coordinates.
fn target_extent(raster: &RasterData, forward: &Proj) -> Result<(f64, f64, f64, f64)> {
    let (width, height) = (raster.width() as f64, raster.height() as f64);
    let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);

    for i in 0..EDGE_SAMPLES {
        let f = i as f64 / (EDGE_SAMPLES - 1) as f64;
        let edge_points = [
            (f * width, 0.0),
            (f * width, height),
            (0.0, f * height),
            (width, f * height),
        ];
        for (col, row) in edge_points {
            let world = RasterIO::pixel_to_world(col, row, &raster.transform);
            if let Ok((x, y)) = forward.convert(world) {
                if x.is_finite() && y.is_finite() {
                    bounds.0 = bounds.0.min(x);
                    bounds.1 = bounds.1.min(y);
                    bounds.2 = bounds.2.max(x);
                    bounds.3 = bounds.3.max(y);
                }
            }
        }
    }

    if !bounds.0.is_finite() || bounds.0 >= bounds.2 || bounds.1 >= bounds.3 {
        return Err(AggregateError::Raster(
            "Raster outline could not be transformed to EPSG:4326".to_string(),
        ));
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn utm33_raster() -> RasterData {
        let srs = SpatialRef::from_epsg(32633).unwrap();
        RasterData {
            data: array![[1.0, 1.0, 0.0], [1.0, 255.0, 0.0]],
            transform: [500_000.0, 1000.0, 0.0, 5_800_000.0, 0.0, -1000.0],
            projection: srs.to_wkt().unwrap(),
            no_data_value: Some(255.0),
        }
    }

    #[test]
    fn wgs84_raster_passes_through() {
        let raster = RasterData {
            data: array![[1.0, 2.0], [3.0, 4.0]],
            transform: [10.0, 0.1, 0.0, 50.0, 0.0, -0.1],
            projection: target_wkt().unwrap(),
            no_data_value: None,
        };
        let out = reproject_to_target(&raster).unwrap();
        assert_eq!(out.data, raster.data);
        assert_eq!(out.transform, raster.transform);
        assert_eq!(out.no_data_value, Some(DEFAULT_NODATA));
    }

    #[test]
    fn missing_crs_is_an_error() {
        let raster = RasterData {
            projection: String::new(),
            ..utm33_raster()
        };
        assert!(matches!(
            reproject_to_target(&raster),
            Err(AggregateError::Raster(_))
        ));
    }

    #[test]
    fn projected_raster_lands_near_central_meridian() {
        let out = reproject_to_target(&utm33_raster()).unwrap();
        let (min_x, min_y, max_x, max_y) = out.bounds();
        // UTM 33N easting 500 km is the 15°E meridian, northing 5800 km is ~52.3°N.
        assert!(min_x > 14.9 && max_x < 15.1, "{} {}", min_x, max_x);
        assert!(min_y > 52.2 && max_y < 52.4, "{} {}", min_y, max_y);
        assert_eq!(out.no_data_value, Some(255.0));
        assert!(out.data.iter().any(|&v| v == 1.0));
        assert!(out.data.iter().all(|&v| v == 0.0 || v == 1.0 || v == 255.0));
        assert!(is_target_crs(&out.projection).unwrap());
    }
}
