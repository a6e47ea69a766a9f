use regex::Regex;
use std::sync::OnceLock;

/// Result of matching a raster file name against
/// `{region}_{tech}_{scenario}_available_land_*.tif`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterName {
    Matched {
        region: String,
        technology: String,
        scenario: String,
    },
    NoMatch,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+)_([A-Za-z0-9]+)_([A-Za-z0-9]+)_available_land_.*\.tif$")
            .expect("raster name pattern is valid")
    })
}

pub fn parse_raster_name(file_name: &str) -> RasterName {
    match pattern().captures(file_name) {
        Some(caps) => RasterName::Matched {
            region: caps[1].to_string(),
            technology: caps[2].to_string(),
            scenario: caps[3].to_string(),
        },
        None => RasterName::NoMatch,
    }
}

/// Name of the exclusion report written next to a raster.
pub fn info_file_name(region: &str, technology: &str, scenario: &str) -> String {
    format!("{}_{}_{}_exclusion_info.txt", region, scenario, technology)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(region: &str, technology: &str, scenario: &str) -> RasterName {
        RasterName::Matched {
            region: region.to_string(),
            technology: technology.to_string(),
            scenario: scenario.to_string(),
        }
    }

    #[test]
    fn parses_simple_name() {
        assert_eq!(
            parse_raster_name("RegionA_wind_ref_available_land_x.tif"),
            matched("RegionA", "wind", "ref")
        );
    }

    #[test]
    fn region_may_contain_underscores() {
        assert_eq!(
            parse_raster_name("Lower_Saxony_solar_high2030_available_land_100m.tif"),
            matched("Lower_Saxony", "solar", "high2030")
        );
    }

    #[test]
    fn rejects_names_without_marker() {
        assert_eq!(
            parse_raster_name("RegionA_wind_ref_land_x.tif"),
            RasterName::NoMatch
        );
        assert_eq!(
            parse_raster_name("RegionA_wind_ref_availableland_x.tif"),
            RasterName::NoMatch
        );
    }

    #[test]
    fn rejects_other_extensions_and_tokens() {
        assert_eq!(
            parse_raster_name("RegionA_wind_ref_available_land_x.tif.aux.xml"),
            RasterName::NoMatch
        );
        assert_eq!(
            parse_raster_name("RegionA_wind-on_ref_available_land_x.tif"),
            RasterName::NoMatch
        );
    }

    #[test]
    fn info_file_swaps_scenario_and_technology() {
        assert_eq!(
            info_file_name("RegionA", "wind", "ref"),
            "RegionA_ref_wind_exclusion_info.txt"
        );
    }
}
