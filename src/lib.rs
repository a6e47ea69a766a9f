pub mod aggregate;
pub mod config;
pub mod filename;
pub mod geopackage;
pub mod grouping;
pub mod logger;
pub mod metrics;
pub mod mosaic;
pub mod pipeline;
pub mod polygonize;
pub mod raster_io;
pub mod report;
pub mod types;
pub mod warp;

pub use config::{Cli, RunConfig};
pub use pipeline::{run, run_with_output};
pub use types::{AggregateError, Result, RunSummary};
