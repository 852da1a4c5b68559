//! Redaction settings and the stage plan derived from them.
//!
//! Settings decide which detectors run and how matches are rendered. The
//! runner itself never reads them; callers turn them into a job's stage
//! list with [`RedactionSettings::stage_plan`] and into handler wrappers
//! such as [`CategoryFilter`](crate::stages::CategoryFilter).

use crate::core::FindingCategory;
use crate::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Stage name of the text-recognition detector.
pub const OCR_STAGE: &str = "ocr";
/// Stage name of the language-model detector.
pub const NLP_STAGE: &str = "nlp";
/// Stage name of the face and id-card detector.
pub const VISION_STAGE: &str = "vision";
/// Stage name of the step that renders redactions.
pub const REDACTION_STAGE: &str = "redaction";
/// Stage name of the step that encrypts the result.
pub const ENCRYPTION_STAGE: &str = "encryption";

const MIN_BLUR: u8 = 1;
const MAX_BLUR: u8 = 20;

const COLOR_PATTERN: &str = r"^#[0-9a-fA-F]{6}$";

static COLOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn color_regex() -> Result<&'static Regex, ConfigError> {
    if let Some(regex) = COLOR_REGEX.get() {
        return Ok(regex);
    }
    let compiled = Regex::new(COLOR_PATTERN)
        .map_err(|e| ConfigError::invalid("redaction_color", e.to_string()))?;
    Ok(COLOR_REGEX.get_or_init(|| compiled))
}

/// User-facing redaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionSettings {
    /// Blur strength for image regions, 1 to 20.
    pub blur_intensity: u8,
    /// Fill color for text redactions, `#rrggbb`.
    pub redaction_color: String,
    /// Run the text-recognition detector.
    pub ocr_enabled: bool,
    /// Run the language-model detector.
    pub nlp_enabled: bool,
    /// Run the face and id-card detector.
    pub vision_enabled: bool,
    /// Encrypt the redacted document.
    pub encryption_enabled: bool,
    /// Categories to report and redact.
    pub personal_data_types: Vec<FindingCategory>,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            blur_intensity: 10,
            redaction_color: "#000000".to_string(),
            ocr_enabled: true,
            nlp_enabled: true,
            vision_enabled: true,
            encryption_enabled: true,
            personal_data_types: vec![
                FindingCategory::Name,
                FindingCategory::Email,
                FindingCategory::Phone,
                FindingCategory::Ssn,
                FindingCategory::Address,
            ],
        }
    }
}

impl RedactionSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates settings from JSON text.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BLUR..=MAX_BLUR).contains(&self.blur_intensity) {
            return Err(ConfigError::invalid(
                "blur_intensity",
                format!("must be between {MIN_BLUR} and {MAX_BLUR}, got {}", self.blur_intensity),
            ));
        }
        if !color_regex()?.is_match(&self.redaction_color) {
            return Err(ConfigError::invalid(
                "redaction_color",
                format!("expected #rrggbb, got '{}'", self.redaction_color),
            ));
        }
        Ok(())
    }

    /// Sets the blur intensity.
    #[must_use]
    pub fn with_blur_intensity(mut self, blur_intensity: u8) -> Self {
        self.blur_intensity = blur_intensity;
        self
    }

    /// Sets the redaction color.
    #[must_use]
    pub fn with_redaction_color(mut self, color: impl Into<String>) -> Self {
        self.redaction_color = color.into();
        self
    }

    /// Enables or disables the text-recognition detector.
    #[must_use]
    pub fn with_ocr(mut self, enabled: bool) -> Self {
        self.ocr_enabled = enabled;
        self
    }

    /// Enables or disables the language-model detector.
    #[must_use]
    pub fn with_nlp(mut self, enabled: bool) -> Self {
        self.nlp_enabled = enabled;
        self
    }

    /// Enables or disables the face and id-card detector.
    #[must_use]
    pub fn with_vision(mut self, enabled: bool) -> Self {
        self.vision_enabled = enabled;
        self
    }

    /// Enables or disables encryption.
    #[must_use]
    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.encryption_enabled = enabled;
        self
    }

    /// Replaces the reported categories.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = FindingCategory>) -> Self {
        self.personal_data_types = categories.into_iter().map(FindingCategory::canonical).collect();
        self
    }

    /// Returns the reported categories.
    #[must_use]
    pub fn categories(&self) -> &[FindingCategory] {
        &self.personal_data_types
    }

    /// Returns true if findings of `category` should be reported.
    #[must_use]
    pub fn reports(&self, category: &FindingCategory) -> bool {
        let wanted = category.clone().canonical();
        self.personal_data_types
            .iter()
            .any(|c| c.clone().canonical() == wanted)
    }

    /// Returns the stage names a job should run, in execution order.
    ///
    /// Redaction always runs; every other stage follows its toggle.
    #[must_use]
    pub fn stage_plan(&self) -> Vec<String> {
        [
            (OCR_STAGE, self.ocr_enabled),
            (NLP_STAGE, self.nlp_enabled),
            (VISION_STAGE, self.vision_enabled),
            (REDACTION_STAGE, true),
            (ENCRYPTION_STAGE, self.encryption_enabled),
        ]
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}
