use crate::types::*;
use crate::warp::TARGET_EPSG;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Layer, LayerAccess, OGRFieldType, ToGdal};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags, LayerOptions};
use gdal_sys::OGRwkbGeometryType;
use std::path::{Path, PathBuf};
use tracing::debug;

const FIELDS: [(&str, OGRFieldType::Type); 5] = [
    ("technology", OGRFieldType::OFTString),
    ("scenario", OGRFieldType::OFTString),
    ("available_area", OGRFieldType::OFTReal),
    ("power_potential", OGRFieldType::OFTReal),
    ("eligibility_share", OGRFieldType::OFTReal),
];

/// Shared output package; every group becomes one layer.
pub struct GeoPackageWriter {
    dataset: Dataset,
    srs: SpatialRef,
    path: PathBuf,
}

impl GeoPackageWriter {
    /// Opens `path` for update, creating the package if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = if path.exists() {
            debug!("Appending layers to {}", path.display());
            Dataset::open_ex(
                path,
                DatasetOptions {
                    open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_VECTOR,
                    ..Default::default()
                },
            )?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let driver = DriverManager::get_driver_by_name("GPKG")?;
            driver.create_vector_only(path)?
        };

        Ok(Self {
            dataset,
            srs: SpatialRef::from_epsg(TARGET_EPSG)?,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `result` as a single-feature layer, replacing a layer of the same name.
    pub fn write_layer(&mut self, result: &GroupResult) -> Result<()> {
        let geometry = result.merged_geometry.to_gdal()?;

        let mut names = vec![FIELDS[0].0, FIELDS[1].0, FIELDS[2].0, FIELDS[3].0];
        let mut values = vec![
            FieldValue::StringValue(result.technology.clone()),
            FieldValue::StringValue(result.scenario.clone()),
            FieldValue::RealValue(result.total_available_area),
            FieldValue::RealValue(result.total_power_potential),
        ];
        if let Some(share) = result.mean_eligibility_share {
            names.push(FIELDS[4].0);
            values.push(FieldValue::RealValue(share));
        }

        self.replace_layer(&result.layer_name(), |layer| {
            layer.create_feature_fields(geometry, &names, &values)?;
            Ok(())
        })
    }

    /// Creates `name` and fills it inside one transaction.
    ///
    /// If `fill` fails the transaction is rolled back, so neither an empty
    /// layer is left behind nor an existing layer of that name lost.
    fn replace_layer<F>(&mut self, name: &str, fill: F) -> Result<()>
    where
        F: FnOnce(&mut Layer<'_>) -> Result<()>,
    {
        let srs = &self.srs;
        let mut txn = self.dataset.start_transaction()?;
        {
            let mut layer = txn.create_layer(LayerOptions {
                name,
                srs: Some(srs),
                ty: OGRwkbGeometryType::wkbMultiPolygon,
                options: Some(&["OVERWRITE=YES"]),
            })?;
            layer.create_defn_fields(&FIELDS)?;
            fill(&mut layer)?;
        }
        txn.commit()?;
        debug!("Committed layer {}", name);
        Ok(())
    }
}
