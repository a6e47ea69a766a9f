use gdal::spatial_ref::SpatialRef;
use landagg::raster_io::RasterIO;
use landagg::types::RasterData;
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};

pub fn land_dir(root: &Path, country: &str) -> PathBuf {
    let dir = root.join("data").join(country).join("available_land");
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_raster(
    dir: &Path,
    name: &str,
    epsg: u32,
    transform: [f64; 6],
    data: Array2<f64>,
    nodata: Option<f64>,
) -> PathBuf {
    let path = dir.join(name);
    let raster = RasterData {
        data,
        transform,
        projection: SpatialRef::from_epsg(epsg).unwrap().to_wkt().unwrap(),
        no_data_value: nodata,
    };
    RasterIO::write_geotiff(&path, &raster).unwrap();
    path
}

pub fn write_info(dir: &Path, region: &str, scenario: &str, tech: &str, metrics: (f64, f64, f64)) {
    let (share, area, power) = metrics;
    fs::write(
        dir.join(format!("{}_{}_{}_exclusion_info.txt", region, scenario, tech)),
        format!(
            "Exclusion summary\neligibility share: {}%\navailable area: {} m2\npower potential: {} MW\n",
            share, area, power
        ),
    )
    .unwrap();
}
