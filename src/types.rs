use geo_types::MultiPolygon;
use ndarray::Array2;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Scalar results reported by the exclusion analysis for one raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    /// Fraction of the region that is eligible, in `[0, 1]`.
    pub eligibility_share: f64,
    /// Available area in m².
    pub available_area: f64,
    /// Installable power in MW.
    pub power_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub technology: String,
    pub scenario: String,
}

impl GroupKey {
    pub fn new(technology: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            technology: technology.into(),
            scenario: scenario.into(),
        }
    }

    pub fn layer_name(&self) -> String {
        format!("{}_{}", self.technology, self.scenario)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.technology, self.scenario)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterRecord {
    pub region: String,
    pub technology: String,
    pub scenario: String,
    pub path: PathBuf,
    pub metrics: Metrics,
}

/// Rasters sharing one technology and scenario, in discovery order.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: GroupKey,
    pub records: Vec<RasterRecord>,
}

impl Group {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.records.iter().any(|r| r.region == region)
    }
}

#[derive(Debug, Clone)]
pub struct RasterData {
    pub data: Array2<f64>,
    pub transform: [f64; 6],
    pub projection: String,
    pub no_data_value: Option<f64>,
}

impl RasterData {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// `(min_x, min_y, max_x, max_y)` of a north-up raster.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        let x0 = t[0];
        let x1 = t[0] + self.width() as f64 * t[1];
        let y0 = t[3];
        let y1 = t[3] + self.height() as f64 * t[5];
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

/// Merged raster of one group on the EPSG:4326 grid.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub data: Array2<f64>,
    pub transform: [f64; 6],
    pub no_data_value: f64,
}

#[derive(Debug, Clone)]
pub struct GroupResult {
    pub technology: String,
    pub scenario: String,
    pub total_available_area: f64,
    pub total_power_potential: f64,
    pub mean_eligibility_share: Option<f64>,
    pub merged_geometry: MultiPolygon<f64>,
}

impl GroupResult {
    pub fn layer_name(&self) -> String {
        format!("{}_{}", self.technology, self.scenario)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    pub layer: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub layer: String,
    pub files: usize,
    pub available_area: f64,
    pub power_potential: f64,
    pub eligibility_share: Option<f64>,
    pub regions: Vec<RegionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub region: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub groups_found: usize,
    pub layers: Vec<LayerSummary>,
    pub failures: Vec<GroupFailure>,
    pub skipped_inputs: usize,
}

impl RunSummary {
    pub fn layers_written(&self) -> usize {
        self.layers.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("PROJ setup error: {0}")]
    ProjCreate(#[from] proj::ProjCreateError),
    #[error("PROJ conversion error: {0}")]
    Proj(#[from] proj::ProjError),
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Raster error: {0}")]
    Raster(String),
    #[error("Missing info file {0}")]
    MissingMetrics(PathBuf),
    #[error("Malformed info file {0}")]
    MalformedMetrics(PathBuf),
}

pub type Result<T> = std::result::Result<T, AggregateError>;
