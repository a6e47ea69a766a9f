use crate::filename::{info_file_name, parse_raster_name, RasterName};
use crate::metrics::parse_metrics_file;
use crate::types::*;
use glob::{glob, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const RASTER_GLOB: &str = "data/**/available_land/*_available_land_*.tif";

/// Raster files below `root` in path order.
pub fn discover_rasters(root: &Path) -> Result<Vec<PathBuf>> {
    let root_str = root
        .to_str()
        .ok_or_else(|| AggregateError::Config(format!("Non UTF-8 root {}", root.display())))?;
    let pattern = format!("{}/{}", Pattern::escape(root_str), RASTER_GLOB);

    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable path: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Default)]
pub struct Grouping {
    pub groups: BTreeMap<GroupKey, Group>,
    /// Rasters dropped for missing or malformed metrics, or duplicate regions.
    pub skipped: usize,
}

/// Builds groups from candidate raster paths, attaching each raster's metrics.
pub fn group_rasters<I>(files: I) -> Grouping
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut grouping = Grouping::default();

    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let (region, technology, scenario) = match parse_raster_name(file_name) {
            RasterName::Matched {
                region,
                technology,
                scenario,
            } => (region, technology, scenario),
            RasterName::NoMatch => {
                debug!("Ignoring {}", path.display());
                continue;
            }
        };

        let info_path = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(info_file_name(&region, &technology, &scenario));
        let metrics = match parse_metrics_file(&info_path) {
            Ok(m) => m,
            Err(e) => {
                warn!("{}", e);
                grouping.skipped += 1;
                continue;
            }
        };

        let key = GroupKey::new(technology.clone(), scenario.clone());
        let group = grouping
            .groups
            .entry(key.clone())
            .or_insert_with(|| Group::new(key));

        if group.contains_region(&region) {
            warn!(
                "Region {} already contributes to {}, ignoring {}",
                region,
                group.key,
                path.display()
            );
            grouping.skipped += 1;
            continue;
        }

        group.records.push(RasterRecord {
            region,
            technology,
            scenario,
            path,
            metrics,
        });
    }

    grouping
}

pub fn collect_groups(root: &Path) -> Result<Grouping> {
    let files = discover_rasters(root)?;
    debug!("Found {} candidate rasters below {}", files.len(), root.display());
    Ok(group_rasters(files))
}
