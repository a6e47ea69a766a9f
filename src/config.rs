use crate::types::{AggregateError, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "landagg")]
#[command(about = "Aggregate available land rasters into a GeoPackage")]
pub struct Cli {
    /// Project root containing the data directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Output GeoPackage path
    #[arg(long, default_value = "aggregated_available_land.gpkg")]
    pub output: PathBuf,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub summary: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            summary: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(AggregateError::Config(format!(
                "Root {} is not a directory",
                self.root.display()
            )));
        }
        if self.output.is_dir() {
            return Err(AggregateError::Config(format!(
                "Output {} is a directory",
                self.output.display()
            )));
        }
        Ok(())
    }
}

impl Cli {
    pub fn into_run_config(self) -> Result<RunConfig> {
        let config = RunConfig {
            root: self.root,
            output: self.output,
            summary: self.summary,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::parse_from(["landagg"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.output, PathBuf::from("aggregated_available_land.gpkg"));
        assert!(cli.summary.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::parse_from([
            "landagg",
            "--root",
            "/srv/lava",
            "--output",
            "out/land.gpkg",
            "--summary",
            "out/summary.json",
            "--verbose",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.root, PathBuf::from("/srv/lava"));
        assert_eq!(cli.output, PathBuf::from("out/land.gpkg"));
        assert_eq!(cli.summary, Some(PathBuf::from("out/summary.json")));
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn root_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        let ok = RunConfig::new(tmp.path(), tmp.path().join("out.gpkg"));
        assert!(ok.validate().is_ok());

        let missing = RunConfig::new(tmp.path().join("nope"), "out.gpkg");
        assert!(matches!(missing.validate(), Err(AggregateError::Config(_))));

        let dir_output = RunConfig::new(tmp.path(), tmp.path());
        assert!(dir_output.validate().is_err());
    }
}
