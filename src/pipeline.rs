use crate::aggregate::aggregate;
use crate::config::RunConfig;
use crate::geopackage::GeoPackageWriter;
use crate::grouping::collect_groups;
use crate::mosaic::merge;
use crate::polygonize::polygonize;
use crate::raster_io::RasterIO;
use crate::report;
use crate::types::*;
use crate::warp::reproject_to_target;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const NO_INPUT_MESSAGE: &str = "No available land rasters found.";

/// Reads, reprojects and merges the rasters of one group.
///
/// Each dataset is closed as soon as its band has been read, so a failure
/// part way through leaves no open handles behind.
pub fn build_mosaic(paths: &[PathBuf]) -> Result<Mosaic> {
    let mut warped = Vec::with_capacity(paths.len());
    for path in paths {
        let raster = RasterIO::read_raster(path)?;
        debug!(
            "Read {} ({}x{})",
            path.display(),
            raster.width(),
            raster.height()
        );
        warped.push(reproject_to_target(&raster)?);
    }
    merge(&warped)
}

fn process_group(group: &Group, writer: &mut GeoPackageWriter) -> Result<GroupResult> {
    let mosaic = build_mosaic(&group.paths())?;
    let polygons = polygonize(&mosaic);
    debug!("{}: {} polygons", group.key, polygons.len());
    let result = aggregate(group, polygons);
    writer.write_layer(&result)?;
    Ok(result)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    serde_json::to_writer_pretty(File::create(path)?, summary)?;
    Ok(())
}

/// Runs discovery, grouping, merging and output for every group.
///
/// A failure inside one group is logged and recorded in the summary; the
/// remaining groups are still processed.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    run_with_output(config, &mut io::stdout())
}

/// Same as [`run`], with the console lines written to `out`.
pub fn run_with_output<W: Write>(config: &RunConfig, out: &mut W) -> Result<RunSummary> {
    info!("Scanning {} for available land rasters", config.root.display());
    let grouping = collect_groups(&config.root)?;

    let mut summary = RunSummary {
        groups_found: grouping.groups.len(),
        skipped_inputs: grouping.skipped,
        ..Default::default()
    };

    if grouping.groups.is_empty() {
        writeln!(out, "{}", NO_INPUT_MESSAGE)?;
    } else {
        let mut writer = GeoPackageWriter::open(&config.output)?;
        info!(
            "Writing {} groups to {}",
            grouping.groups.len(),
            writer.path().display()
        );

        let pb = ProgressBar::new(grouping.groups.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for (key, group) in &grouping.groups {
            pb.set_message(key.layer_name());
            match process_group(group, &mut writer) {
                Ok(result) => {
                    let layer = result.layer_name();
                    pb.suspend(|| -> io::Result<()> {
                        for line in report::breakdown(group, &result) {
                            writeln!(out, "{}", line)?;
                        }
                        writeln!(out, "{}", report::written_line(&layer, group.records.len()))
                    })?;
                    summary.layers.push(report::layer_summary(group, &result));
                }
                Err(e) => {
                    error!("Failed to process {}: {}", key.layer_name(), e);
                    summary.failures.push(GroupFailure {
                        layer: key.layer_name(),
                        reason: e.to_string(),
                    });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    if let Some(path) = &config.summary {
        write_summary(path, &summary)?;
        info!("Summary written to {}", path.display());
    }

    info!(
        "Wrote {} of {} layers ({} inputs skipped)",
        summary.layers_written(),
        summary.groups_found,
        summary.skipped_inputs
    );
    Ok(summary)
}
