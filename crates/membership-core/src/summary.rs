use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::warn;

use crate::aggregation::{
    consultation_usage, health_check_donut, limited_benefit_usage, monthly_estimated_savings,
    monthly_spend, monthly_visit_rate, resolve_entitlement, AggregationError, BenefitUsage,
    ConsultationUsage, DonutTotals, Entitlement, MonthlySeries,
};
use crate::benefits::{benefit_panels, view_plan, BenefitPanel, PanelSettings};
use crate::selection::SelectedView;

/// Everything the dashboard renders for one holder and year.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub holder: String,
    pub year: i32,
    pub plan: Option<String>,
    pub reference: Option<NaiveDateTime>,
    pub record_count: usize,
    pub entitlement: Entitlement,
    pub benefit_usage: BenefitUsage,
    pub consultation_usage: ConsultationUsage,
    pub monthly_spend: MonthlySeries,
    pub monthly_estimated_savings: MonthlySeries,
    pub monthly_visit_rate: MonthlySeries,
    pub health_check: DonutTotals,
    pub panels: Vec<BenefitPanel>,
}

impl DashboardSummary {
    pub fn build(view: &SelectedView, settings: &PanelSettings) -> Result<Self, AggregationError> {
        let df = view.frame();

        let entitlement = resolve_entitlement(df)?;
        if entitlement.substituted() {
            warn!(
                holder = view.holder(),
                year = view.year(),
                "total_qty is 0; using an entitlement of 1"
            );
        }

        let plan = view_plan(df)?;
        let benefit_usage = limited_benefit_usage(df)?;
        let panels = benefit_panels(plan.as_deref(), entitlement, &benefit_usage, settings);

        Ok(Self {
            holder: view.holder().to_string(),
            year: view.year(),
            plan,
            reference: None,
            record_count: view.len(),
            entitlement,
            health_check: health_check_donut(&benefit_usage, entitlement),
            benefit_usage,
            consultation_usage: consultation_usage(df)?,
            monthly_spend: monthly_spend(df)?,
            monthly_estimated_savings: monthly_estimated_savings(df)?,
            monthly_visit_rate: monthly_visit_rate(df)?,
            panels,
        })
    }

    /// Records the instant ages were measured against.
    pub fn with_reference(mut self, reference: NaiveDateTime) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn total_spend(&self) -> f64 {
        self.monthly_spend.total()
    }

    pub fn total_estimated_savings(&self) -> f64 {
        self.monthly_estimated_savings.total()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
