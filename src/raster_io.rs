use crate::types::*;
use gdal::raster::{Buffer, ResampleAlg};
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

pub struct RasterIO;

impl RasterIO {
    /// Reads band 1 as `f64`.
    ///
    /// The dataset handle lives only for the duration of this call, so it is
    /// released on success and on every early error return.
    pub fn read_raster(path: &Path) -> Result<RasterData> {
        let dataset = Dataset::open(path)?;
        let transform = dataset.geo_transform()?;
        let projection = dataset.projection();

        if dataset.raster_count() == 0 {
            return Err(AggregateError::Raster(format!(
                "No bands found in {}",
                path.display()
            )));
        }

        let band = dataset.rasterband(1)?;
        let no_data_value = band.no_data_value();
        let (width, height) = band.size();
        if width == 0 || height == 0 {
            return Err(AggregateError::Raster(format!(
                "Empty raster {}",
                path.display()
            )));
        }

        let mut data = vec![0f64; width * height];
        band.read_into_slice(
            (0, 0),
            (width, height),
            (width, height),
            &mut data,
            Some(ResampleAlg::NearestNeighbour),
        )?;

        let array = Array2::from_shape_vec((height, width), data)
            .map_err(|e| AggregateError::Raster(format!("Failed to create array: {}", e)))?;

        Ok(RasterData {
            data: array,
            transform,
            projection,
            no_data_value,
        })
    }

    pub fn write_geotiff(path: &Path, raster: &RasterData) -> Result<()> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let (height, width) = raster.data.dim();

        let mut dataset =
            driver.create_with_band_type::<f64, _>(path, width as isize, height as isize, 1)?;

        dataset.set_geo_transform(&raster.transform)?;
        dataset.set_projection(&raster.projection)?;

        let mut band = dataset.rasterband(1)?;
        band.set_no_data_value(raster.no_data_value)?;

        let vec_data: Vec<f64> = raster.data.iter().cloned().collect();
        let buffer = Buffer::new((width, height), vec_data);
        band.write((0, 0), (width, height), &buffer)?;

        Ok(())
    }

    pub fn pixel_to_world(col: f64, row: f64, transform: &[f64; 6]) -> (f64, f64) {
        let x = transform[0] + col * transform[1] + row * transform[2];
        let y = transform[3] + col * transform[4] + row * transform[5];
        (x, y)
    }

    pub fn invert_transform(transform: &[f64; 6]) -> [f64; 6] {
        let det = transform[1] * transform[5] - transform[2] * transform[4];
        [
            -transform[0] * transform[5] / det + transform[2] * transform[3] / det,
            transform[5] / det,
            -transform[2] / det,
            transform[0] * transform[4] / det - transform[1] * transform[3] / det,
            -transform[4] / det,
            transform[1] / det,
        ]
    }

    /// Fractional pixel position of a world coordinate.
    pub fn world_to_pixel(x: f64, y: f64, inv_transform: &[f64; 6]) -> (f64, f64) {
        let col = inv_transform[0] + inv_transform[1] * x + inv_transform[2] * y;
        let row = inv_transform[3] + inv_transform[4] * x + inv_transform[5] * y;
        (col, row)
    }
}
