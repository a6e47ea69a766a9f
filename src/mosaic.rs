use crate::raster_io::RasterIO;
use crate::types::*;
use crate::warp::DEFAULT_NODATA;
use ndarray::Array2;

/// Merges north-up rasters sharing one CRS into a single grid.
///
/// The output covers the union of all inputs at the resolution of the first
/// one and uses the first input's nodata. Each cell takes the value of the
/// first input that has valid data there.
pub fn merge(rasters: &[RasterData]) -> Result<Mosaic> {
    let first = rasters
        .first()
        .ok_or_else(|| AggregateError::Raster("Nothing to merge".to_string()))?;

    for r in rasters {
        if r.transform[2] != 0.0 || r.transform[4] != 0.0 {
            return Err(AggregateError::Raster(
                "Cannot merge rotated rasters".to_string(),
            ));
        }
    }

    let res_x = first.transform[1].abs();
    let res_y = first.transform[5].abs();
    let nodata = first.no_data_value.unwrap_or(DEFAULT_NODATA);

    let (mut west, mut south, mut east, mut north) = first.bounds();
    for r in &rasters[1..] {
        let (w, s, e, n) = r.bounds();
        west = west.min(w);
        south = south.min(s);
        east = east.max(e);
        north = north.max(n);
    }

    let width = (((east - west) / res_x).round() as usize).max(1);
    let height = (((north - south) / res_y).round() as usize).max(1);
    let transform = [west, res_x, 0.0, north, 0.0, -res_y];

    let mut data = Array2::from_elem((height, width), nodata);
    let mut filled = Array2::from_elem((height, width), false);

    for raster in rasters {
        let inv = RasterIO::invert_transform(&raster.transform);
        let (w, s, e, n) = raster.bounds();

        // Output window covered by this raster.
        let col0 = (((w - west) / res_x).floor().max(0.0)) as usize;
        let col1 = ((((e - west) / res_x).ceil()) as usize).min(width);
        let row0 = (((north - n) / res_y).floor().max(0.0)) as usize;
        let row1 = ((((north - s) / res_y).ceil()) as usize).min(height);

        for row in row0..row1 {
            for col in col0..col1 {
                if filled[[row, col]] {
                    continue;
                }
                let (x, y) = RasterIO::pixel_to_world(col as f64 + 0.5, row as f64 + 0.5, &transform);
                let (scol, srow) = RasterIO::world_to_pixel(x, y, &inv);
                if scol < 0.0 || srow < 0.0 {
                    continue;
                }
                let (scol, srow) = (scol.floor() as usize, srow.floor() as usize);
                if scol >= raster.width() || srow >= raster.height() {
                    continue;
                }
                let value = raster.data[[srow, scol]];
                let valid = match raster.no_data_value {
                    Some(src_nodata) => value != src_nodata,
                    None => true,
                };
                if valid && !value.is_nan() {
                    data[[row, col]] = value;
                    filled[[row, col]] = true;
                }
            }
        }
    }

    Ok(Mosaic {
        data,
        transform,
        no_data_value: nodata,
    })
}
