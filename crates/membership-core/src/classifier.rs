use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::columns::{
    BENEFICIARY_AGE, CONSULTATION_TYPE, DEPENDENT_AGE, LIMITED_BENEFIT, PRODUCT_TEMPLATE_ID,
};
use crate::temporal::UNKNOWN_AGE;

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error(
        "template {template_id} is mapped to both {existing} and {conflicting}; limited benefit ids must be disjoint"
    )]
    ConflictingBenefit {
        template_id: i64,
        existing: LimitedBenefit,
        conflicting: LimitedBenefit,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConsultationType {
    #[serde(rename = "Doctor Consultation")]
    Doctor,
    #[serde(rename = "Dental Consultation")]
    Dental,
    #[serde(rename = "Eye Consultation")]
    Eye,
    #[serde(rename = "Immunization/Vaccination")]
    Immunization,
}

impl ConsultationType {
    pub const ALL: [ConsultationType; 4] = [
        ConsultationType::Doctor,
        ConsultationType::Dental,
        ConsultationType::Eye,
        ConsultationType::Immunization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::Doctor => "Doctor Consultation",
            ConsultationType::Dental => "Dental Consultation",
            ConsultationType::Eye => "Eye Consultation",
            ConsultationType::Immunization => "Immunization/Vaccination",
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConsultationType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        ConsultationType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown consultation type '{trimmed}'"))
    }
}

/// Capped-usage benefit categories, declared in dashboard display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LimitedBenefit {
    #[serde(rename = "Dental Check")]
    DentalCheck,
    #[serde(rename = "Vision Check")]
    VisionCheck,
    #[serde(rename = "Ambulance")]
    Ambulance,
    #[serde(rename = "Home Care")]
    HomeCare,
    #[serde(rename = "Annual Health Check")]
    AnnualHealthCheck,
    #[serde(rename = "ECG")]
    Ecg,
}

impl LimitedBenefit {
    pub const ALL: [LimitedBenefit; 6] = [
        LimitedBenefit::DentalCheck,
        LimitedBenefit::VisionCheck,
        LimitedBenefit::Ambulance,
        LimitedBenefit::HomeCare,
        LimitedBenefit::AnnualHealthCheck,
        LimitedBenefit::Ecg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitedBenefit::DentalCheck => "Dental Check",
            LimitedBenefit::VisionCheck => "Vision Check",
            LimitedBenefit::Ambulance => "Ambulance",
            LimitedBenefit::HomeCare => "Home Care",
            LimitedBenefit::AnnualHealthCheck => "Annual Health Check",
            LimitedBenefit::Ecg => "ECG",
        }
    }
}

impl fmt::Display for LimitedBenefit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LimitedBenefit {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        // older exports spell it "Anual"
        if trimmed.eq_ignore_ascii_case("anual health check") {
            return Ok(LimitedBenefit::AnnualHealthCheck);
        }
        LimitedBenefit::ALL
            .into_iter()
            .find(|benefit| benefit.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown limited benefit '{trimmed}'"))
    }
}

/// Extra requirement a consultation rule places on the record's ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeCondition {
    Always,
    /// Beneficiary or dependent is at most this many years old. The unknown
    /// age sentinel (-1) satisfies this.
    EitherAtMost(i32),
}

impl AgeCondition {
    pub fn matches(&self, beneficiary_age: i32, dependent_age: i32) -> bool {
        match *self {
            AgeCondition::Always => true,
            AgeCondition::EitherAtMost(limit) => beneficiary_age <= limit || dependent_age <= limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationRule {
    pub template_ids: Vec<i64>,
    pub condition: AgeCondition,
    pub result: ConsultationType,
}

impl ConsultationRule {
    pub fn new(template_ids: &[i64], condition: AgeCondition, result: ConsultationType) -> Self {
        Self {
            template_ids: template_ids.to_vec(),
            condition,
            result,
        }
    }

    pub fn matches(&self, template_id: i64, beneficiary_age: i32, dependent_age: i32) -> bool {
        self.template_ids.contains(&template_id)
            && self.condition.matches(beneficiary_age, dependent_age)
    }
}

pub const IMMUNIZATION_TEMPLATE_IDS: [i64; 11] = [
    3534, 3538, 3541, 3539, 5338, 3537, 3542, 3535, 5337, 7866, 7886,
];
pub const IMMUNIZATION_MAX_AGE: i32 = 5;

/// Consultation rules in evaluation order; the first matching rule wins.
pub fn canonical_consultation_rules() -> Vec<ConsultationRule> {
    use AgeCondition::{Always, EitherAtMost};

    vec![
        ConsultationRule::new(&[3179], Always, ConsultationType::Doctor),
        ConsultationRule::new(&[7844], Always, ConsultationType::Dental),
        ConsultationRule::new(&[18449], Always, ConsultationType::Eye),
        ConsultationRule::new(
            &IMMUNIZATION_TEMPLATE_IDS,
            EitherAtMost(IMMUNIZATION_MAX_AGE),
            ConsultationType::Immunization,
        ),
    ]
}

pub fn canonical_limited_benefits() -> Vec<(i64, LimitedBenefit)> {
    use LimitedBenefit::*;

    vec![
        (3185, Ecg),
        (5205, VisionCheck),
        (18345, DentalCheck),
        (31395, DentalCheck),
        (18344, DentalCheck),
        (31277, HomeCare),
        (31289, Ambulance),
        (8121, AnnualHealthCheck),
        (8122, AnnualHealthCheck),
        (8123, AnnualHealthCheck),
        (8124, AnnualHealthCheck),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub consultation_type: Option<ConsultationType>,
    pub limited_benefit: Option<LimitedBenefit>,
}

/// Lookup tables driving record classification.
#[derive(Debug, Clone)]
pub struct ClassificationTables {
    consultation_rules: Vec<ConsultationRule>,
    limited_benefits: HashMap<i64, LimitedBenefit>,
}

impl Default for ClassificationTables {
    fn default() -> Self {
        Self {
            consultation_rules: canonical_consultation_rules(),
            limited_benefits: canonical_limited_benefits().into_iter().collect(),
        }
    }
}

impl ClassificationTables {
    pub fn new(
        consultation_rules: Vec<ConsultationRule>,
        limited_benefits: impl IntoIterator<Item = (i64, LimitedBenefit)>,
    ) -> Result<Self, ClassificationError> {
        let mut map: HashMap<i64, LimitedBenefit> = HashMap::new();
        for (template_id, benefit) in limited_benefits {
            if let Some(&existing) = map.get(&template_id) {
                if existing != benefit {
                    return Err(ClassificationError::ConflictingBenefit {
                        template_id,
                        existing,
                        conflicting: benefit,
                    });
                }
            }
            map.insert(template_id, benefit);
        }

        Ok(Self {
            consultation_rules,
            limited_benefits: map,
        })
    }

    pub fn consultation_rules(&self) -> &[ConsultationRule] {
        &self.consultation_rules
    }

    pub fn consultation_type(
        &self,
        template_id: i64,
        beneficiary_age: i32,
        dependent_age: i32,
    ) -> Option<ConsultationType> {
        self.consultation_rules
            .iter()
            .find(|rule| rule.matches(template_id, beneficiary_age, dependent_age))
            .map(|rule| rule.result)
    }

    pub fn limited_benefit(&self, template_id: i64) -> Option<LimitedBenefit> {
        self.limited_benefits.get(&template_id).copied()
    }

    pub fn classify(
        &self,
        template_id: Option<i64>,
        beneficiary_age: i32,
        dependent_age: i32,
    ) -> Classification {
        let Some(template_id) = template_id else {
            return Classification::default();
        };

        Classification {
            consultation_type: self.consultation_type(template_id, beneficiary_age, dependent_age),
            limited_benefit: self.limited_benefit(template_id),
        }
    }
}

static CANONICAL_TABLES: Lazy<ClassificationTables> = Lazy::new(ClassificationTables::default);

pub fn canonical_tables() -> &'static ClassificationTables {
    &CANONICAL_TABLES
}

/// Classifies one claim line against the canonical tables.
pub fn classify(template_id: i64, beneficiary_age: i32, dependent_age: i32) -> Classification {
    CANONICAL_TABLES.classify(Some(template_id), beneficiary_age, dependent_age)
}

/// Adds `consultation_type` and `limited_benefit` string columns. Expects the
/// age columns from [`crate::temporal::enrich_temporal`].
pub fn apply_classification(
    df: &DataFrame,
    tables: &ClassificationTables,
) -> PolarsResult<DataFrame> {
    let len = df.height();

    let template_ids = df.column(PRODUCT_TEMPLATE_ID)?.i64()?;
    let beneficiary_ages = df.column(BENEFICIARY_AGE)?.i32()?;
    let dependent_ages = df.column(DEPENDENT_AGE)?.i32()?;

    let mut consultations: Vec<Option<&'static str>> = Vec::with_capacity(len);
    let mut benefits: Vec<Option<&'static str>> = Vec::with_capacity(len);

    for idx in 0..len {
        let classification = tables.classify(
            template_ids.get(idx),
            beneficiary_ages.get(idx).unwrap_or(UNKNOWN_AGE),
            dependent_ages.get(idx).unwrap_or(UNKNOWN_AGE),
        );
        consultations.push(classification.consultation_type.map(|kind| kind.as_str()));
        benefits.push(classification.limited_benefit.map(|benefit| benefit.as_str()));
    }

    let mut output = df.clone();
    output.with_column(Series::new(CONSULTATION_TYPE.into(), consultations))?;
    output.with_column(Series::new(LIMITED_BENEFIT.into(), benefits))?;

    Ok(output)
}
