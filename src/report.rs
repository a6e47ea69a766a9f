use crate::types::*;

pub fn format_percent(share: Option<f64>) -> String {
    match share {
        Some(s) => format!("{:.2}%", s * 100.0),
        None => "NA".to_string(),
    }
}

pub fn region_line(record: &RasterRecord) -> String {
    format!(
        "{}: share={}, area={:.2} m2, power={:.2} MW",
        record.region,
        format_percent(Some(record.metrics.eligibility_share)),
        record.metrics.available_area,
        record.metrics.power_potential
    )
}

pub fn total_line(result: &GroupResult) -> String {
    format!(
        "Total {} {}: share={}, area={:.2} m2, power={:.2} MW",
        result.technology,
        result.scenario,
        format_percent(result.mean_eligibility_share),
        result.total_available_area,
        result.total_power_potential
    )
}

pub fn written_line(layer: &str, files: usize) -> String {
    format!("Written layer {} with {} files", layer, files)
}

/// Per-region breakdown followed by the group total.
pub fn breakdown(group: &Group, result: &GroupResult) -> Vec<String> {
    let mut lines: Vec<String> = group.records.iter().map(region_line).collect();
    lines.push(total_line(result));
    lines
}

pub fn layer_summary(group: &Group, result: &GroupResult) -> LayerSummary {
    LayerSummary {
        layer: result.layer_name(),
        files: group.records.len(),
        available_area: result.total_available_area,
        power_potential: result.total_power_potential,
        eligibility_share: result.mean_eligibility_share,
        regions: group
            .records
            .iter()
            .map(|r| RegionSummary {
                region: r.region.clone(),
                metrics: r.metrics,
            })
            .collect(),
    }
}
