use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregation::{BenefitUsage, Entitlement};
use crate::classifier::LimitedBenefit;
use crate::columns::PLAN;

pub const DEFAULT_PREMIUM_PLAN: &str = "Premium";
pub const DEFAULT_HOME_CARE_MULTIPLIER: i64 = 12;

/// Benefits shown as usage panels, in display order.
pub const PANEL_BENEFITS: [LimitedBenefit; 5] = [
    LimitedBenefit::Ecg,
    LimitedBenefit::DentalCheck,
    LimitedBenefit::VisionCheck,
    LimitedBenefit::Ambulance,
    LimitedBenefit::HomeCare,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSettings {
    pub premium_plan: String,
    pub home_care_multiplier: i64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            premium_plan: DEFAULT_PREMIUM_PLAN.to_string(),
            home_care_multiplier: DEFAULT_HOME_CARE_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelUsage {
    /// `left` goes negative when usage exceeds the entitlement.
    Tracked { used: i64, left: i64 },
    UpgradeRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenefitPanel {
    pub benefit: LimitedBenefit,
    pub entitlement: i64,
    pub usage: PanelUsage,
}

/// ECG usage is shown on every plan; the other panels only on the premium plan.
pub fn requires_premium(benefit: LimitedBenefit) -> bool {
    benefit != LimitedBenefit::Ecg
}

pub fn panel_entitlement(
    benefit: LimitedBenefit,
    entitlement: Entitlement,
    settings: &PanelSettings,
) -> i64 {
    match benefit {
        LimitedBenefit::HomeCare => entitlement
            .value
            .saturating_mul(settings.home_care_multiplier),
        _ => entitlement.value,
    }
}

pub fn benefit_panels(
    plan: Option<&str>,
    entitlement: Entitlement,
    usage: &BenefitUsage,
    settings: &PanelSettings,
) -> Vec<BenefitPanel> {
    let premium = plan == Some(settings.premium_plan.as_str());

    PANEL_BENEFITS
        .into_iter()
        .map(|benefit| {
            let allowed = panel_entitlement(benefit, entitlement, settings);
            let usage = if premium || !requires_premium(benefit) {
                let used = usage.get(benefit);
                PanelUsage::Tracked {
                    used,
                    left: allowed.saturating_sub(used),
                }
            } else {
                PanelUsage::UpgradeRequired
            };
            BenefitPanel {
                benefit,
                entitlement: allowed,
                usage,
            }
        })
        .collect()
}

/// Plan label of the first record in a selection.
pub fn view_plan(df: &DataFrame) -> PolarsResult<Option<String>> {
    if df.is_empty() {
        return Ok(None);
    }
    let plans = df.column(PLAN)?.str()?;
    Ok(plans.get(0).map(str::to_string))
}
