//! Test fixtures for building jobs and findings.

use crate::core::{Finding, FindingCategory, InputRef, Job, Region};

/// Builds a finding with a unit region and 0.9 confidence.
///
/// # Panics
///
/// Never for the fixed values used here.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn finding(category: FindingCategory, value: &str) -> Finding {
    Finding::new(category, value, 0.9, Region::default()).unwrap()
}

/// Builds a finding with explicit confidence and region.
///
/// # Panics
///
/// Panics if the values violate the finding constraints.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn finding_at(
    category: FindingCategory,
    value: &str,
    confidence: f64,
    (x, y, width, height): (f64, f64, f64, f64),
) -> Finding {
    Finding::new(category, value, confidence, Region::new(x, y, width, height).unwrap()).unwrap()
}

/// Builds a job over a dummy document.
///
/// # Panics
///
/// Panics if `stages` is empty or contains a blank name.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn job(stages: &[&str]) -> Job {
    Job::new(
        InputRef::new("uploads/patient-intake.pdf").with_media_type("application/pdf"),
        stages.iter().copied(),
    )
    .unwrap()
}

/// Findings typical of an OCR pass over a medical letterhead.
#[must_use]
pub fn letterhead_findings() -> Vec<Finding> {
    vec![
        finding_at(FindingCategory::Name, "Dr. Sarah Johnson", 0.97, (120.0, 80.0, 140.0, 24.0)),
        finding_at(
            FindingCategory::Address,
            "1234 Medical Center Drive, Suite 200",
            0.89,
            (120.0, 120.0, 280.0, 20.0),
        ),
    ]
}

/// Findings typical of an NLP pass over the letter body.
#[must_use]
pub fn body_findings() -> Vec<Finding> {
    vec![
        finding_at(FindingCategory::Email, "sarah.johnson@medicenter.com", 0.95, (120.0, 160.0, 220.0, 18.0)),
        finding_at(FindingCategory::Phone, "(555) 987-6543", 0.92, (120.0, 200.0, 120.0, 18.0)),
        finding_at(FindingCategory::Ssn, "***-**-4567", 0.88, (300.0, 240.0, 100.0, 18.0)),
        finding_at(FindingCategory::Date, "DOB: 03/15/1985", 0.91, (120.0, 280.0, 130.0, 18.0)),
    ]
}

/// Findings typical of a vision pass over an embedded id card.
#[must_use]
pub fn id_card_findings() -> Vec<Finding> {
    vec![finding_at(
        FindingCategory::IdNumber,
        "License: D123456789",
        0.84,
        (400.0, 100.0, 150.0, 20.0),
    )]
}
