use crate::types::{AggregateError, Metrics, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const NUMBER: &str = r"((?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)";

struct MetricPatterns {
    share: Regex,
    area: Regex,
    power: Regex,
}

fn patterns() -> &'static MetricPatterns {
    static PATTERNS: OnceLock<MetricPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |label: &str, unit: &str| {
            Regex::new(&format!(r"{}:\s*{}\s*{}", label, NUMBER, unit))
                .expect("metric pattern is valid")
        };
        MetricPatterns {
            share: build("eligibility share", "%"),
            area: build("available area", "m2"),
            power: build("power potential", "MW"),
        }
    })
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Extracts all three metrics from report text, or nothing.
pub fn parse_metrics_text(text: &str) -> Option<Metrics> {
    let p = patterns();
    let share_pct = capture_number(&p.share, text)?;
    let available_area = capture_number(&p.area, text)?;
    let power_potential = capture_number(&p.power, text)?;

    let eligibility_share = share_pct / 100.0;
    if !(0.0..=1.0).contains(&eligibility_share) {
        return None;
    }

    Some(Metrics {
        eligibility_share,
        available_area,
        power_potential,
    })
}

/// Reads an exclusion report.
///
/// Fails with [`AggregateError::MissingMetrics`] when the file does not exist
/// and [`AggregateError::MalformedMetrics`] when any of the three values is
/// absent or unreadable.
pub fn parse_metrics_file(path: &Path) -> Result<Metrics> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AggregateError::MissingMetrics(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    parse_metrics_text(&text).ok_or_else(|| AggregateError::MalformedMetrics(path.to_path_buf()))
}
