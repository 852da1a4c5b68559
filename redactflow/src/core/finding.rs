//! Findings: detected items of personal data.

use crate::errors::InvalidFindingError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The category of a detected item.
///
/// The well-known categories cover what the bundled settings can toggle;
/// `Other` keeps the set open for detectors with their own taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingCategory {
    /// A person's name.
    Name,
    /// An email address.
    Email,
    /// A phone or fax number.
    Phone,
    /// A social security or national id number.
    Ssn,
    /// A street address or location.
    Address,
    /// A birth date or other sensitive date.
    Date,
    /// A license or other identity document number.
    IdNumber,
    /// A detector-specific category.
    ///
    /// Build it through [`FindingCategory::other`] so built-in names map to
    /// their own variant.
    Other(String),
}

impl FindingCategory {
    /// The built-in categories, in display order.
    pub const BUILTIN: [Self; 7] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Ssn,
        Self::Address,
        Self::Date,
        Self::IdNumber,
    ];

    /// Creates a category from a detector-specific name.
    ///
    /// Built-in names such as `"email"` yield the built-in variant.
    #[must_use]
    pub fn other(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    /// Returns the canonical form, folding `Other` holding a built-in name
    /// into that built-in variant.
    #[must_use]
    pub fn canonical(self) -> Self {
        match self {
            Self::Other(name) => Self::from(name),
            builtin => builtin,
        }
    }

    /// Returns the snake_case name of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::Address => "address",
            Self::Date => "date",
            Self::IdNumber => "id_number",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name" => Self::Name,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "ssn" => Self::Ssn,
            "address" => Self::Address,
            "date" => Self::Date,
            "id_number" => Self::IdNumber,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for FindingCategory {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for FindingCategory {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<FindingCategory> for String {
    fn from(value: FindingCategory) -> Self {
        match value {
            FindingCategory::Other(name) => name,
            builtin => builtin.as_str().to_string(),
        }
    }
}

/// A bounding box in source-document coordinates.
///
/// Only valid regions can be built: through [`Region::new`], `Default`
/// (the empty box at the origin) or deserialization, which runs the same
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct RawRegion {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawRegion> for Region {
    type Error = InvalidFindingError;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl Region {
    /// Creates a region, rejecting negative sizes and non-finite values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFindingError::Region` when a component is not
    /// finite or a dimension is negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, InvalidFindingError> {
        let region = Self { x, y, width, height };
        region.validate()?;
        Ok(region)
    }

    fn validate(&self) -> Result<(), InvalidFindingError> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(InvalidFindingError::Region(format!(
                "components must be finite: {self:?}"
            )));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(InvalidFindingError::Region(format!(
                "width and height must be >= 0, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Returns the left edge.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Returns the top edge.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the area of the region.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One detected item of interest.
///
/// Findings are immutable once built: fields are read through accessors
/// and deserialization runs the same checks as [`Finding::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFinding")]
pub struct Finding {
    category: FindingCategory,
    value: String,
    confidence: f64,
    region: Region,
}

#[derive(Deserialize)]
struct RawFinding {
    category: FindingCategory,
    value: String,
    confidence: f64,
    region: Region,
}

impl TryFrom<RawFinding> for Finding {
    type Error = InvalidFindingError;

    fn try_from(raw: RawFinding) -> Result<Self, Self::Error> {
        Self::new(raw.category, raw.value, raw.confidence, raw.region)
    }
}

impl Finding {
    /// Creates a finding.
    ///
    /// # Errors
    ///
    /// Returns an error if `confidence` is outside [0, 1] or the region
    /// is malformed.
    pub fn new(
        category: impl Into<FindingCategory>,
        value: impl Into<String>,
        confidence: f64,
        region: Region,
    ) -> Result<Self, InvalidFindingError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidFindingError::Confidence(confidence));
        }
        region.validate()?;
        Ok(Self {
            category: category.into().canonical(),
            value: value.into(),
            confidence,
            region,
        })
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> &FindingCategory {
        &self.category
    }

    /// Returns the detected text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the detector confidence in [0, 1].
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the bounding region.
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }
}
