use std::collections::BTreeSet;

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use membership_core::aggregation::{month_label, MonthlySeries};
use membership_core::benefits::PanelUsage;
use membership_core::classifier::{ConsultationType, LimitedBenefit};
use membership_core::summary::DashboardSummary;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    table
}

pub fn list_table(header: &str, rows: impl IntoIterator<Item = String>) -> Table {
    let mut table = new_table(vec![header]);
    for row in rows {
        table.add_row(vec![row]);
    }
    table
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn optional(value: Option<f64>) -> String {
    value.map(money).unwrap_or_else(|| "-".to_string())
}

pub fn overview_table(summary: &DashboardSummary) -> Table {
    let entitlement = if summary.entitlement.substituted() {
        format!(
            "{} (recorded {})",
            summary.entitlement.value, summary.entitlement.recorded
        )
    } else {
        summary.entitlement.value.to_string()
    };
    let donut = &summary.health_check;

    let mut table = new_table(vec!["Field", "Value"]);
    table.add_row(vec!["Primary holder".to_string(), summary.holder.clone()]);
    table.add_row(vec!["Year".to_string(), summary.year.to_string()]);
    table.add_row(vec![
        "Plan".to_string(),
        summary.plan.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Records".to_string(), summary.record_count.to_string()]);
    table.add_row(vec!["Entitlement".to_string(), entitlement]);
    table.add_row(vec!["Total spend".to_string(), money(summary.total_spend())]);
    table.add_row(vec![
        "Estimated savings".to_string(),
        money(summary.total_estimated_savings()),
    ]);
    table.add_row(vec![
        "Annual health check".to_string(),
        format!(
            "{} used, {} unused ({:.1}%)",
            donut.used, donut.unused, donut.used_percentage
        ),
    ]);
    table
}

pub fn usage_table(summary: &DashboardSummary) -> Table {
    let mut table = new_table(vec!["Category", "Records"]);
    for benefit in LimitedBenefit::ALL {
        table.add_row(vec![
            benefit.to_string(),
            summary.benefit_usage.get(benefit).to_string(),
        ]);
    }
    for kind in ConsultationType::ALL {
        table.add_row(vec![
            kind.to_string(),
            summary.consultation_usage.get(kind).to_string(),
        ]);
    }
    table
}

fn months(series: &[&MonthlySeries]) -> BTreeSet<u32> {
    series
        .iter()
        .flat_map(|series| series.points.iter().map(|point| point.month))
        .collect()
}

pub fn monthly_table(summary: &DashboardSummary) -> Table {
    let mut table = new_table(vec![
        "Month",
        "Spend",
        "Estimated savings",
        "Visits per beneficiary",
    ]);
    let all_months = months(&[
        &summary.monthly_spend,
        &summary.monthly_estimated_savings,
        &summary.monthly_visit_rate,
    ]);
    for month in all_months {
        table.add_row(vec![
            month_label(month).to_string(),
            optional(summary.monthly_spend.value_for(month)),
            optional(summary.monthly_estimated_savings.value_for(month)),
            optional(summary.monthly_visit_rate.value_for(month)),
        ]);
    }
    table
}

pub fn panels_table(summary: &DashboardSummary) -> Table {
    let mut table = new_table(vec!["Benefit", "Entitlement", "Used", "Left"]);
    for panel in &summary.panels {
        let (used, left) = match panel.usage {
            PanelUsage::Tracked { used, left } => (used.to_string(), left.to_string()),
            PanelUsage::UpgradeRequired => ("upgrade required".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            panel.benefit.to_string(),
            panel.entitlement.to_string(),
            used,
            left,
        ]);
    }
    table
}

pub fn report(summary: &DashboardSummary) -> String {
    [
        overview_table(summary),
        panels_table(summary),
        usage_table(summary),
        monthly_table(summary),
    ]
    .iter()
    .map(|table| table.to_string())
    .collect::<Vec<_>>()
    .join("\n\n")
}
