use serde::{Deserialize, Serialize};

use super::{scrub, ContentError};

/// Fill state of a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProgressValue {
    /// Fraction complete, clamped to `0.0..=1.0`.
    Determinate(f64),
    /// Animated bar with no fill fraction.
    Indeterminate,
}

impl ProgressValue {
    /// Clamps out-of-range fractions instead of failing; a reported 105%
    /// download renders as full rather than aborting the build.
    pub fn determinate(fraction: f64) -> Self {
        ProgressValue::Determinate(fraction.clamp(0.0, 1.0))
    }

    pub fn wire_value(&self) -> String {
        match self {
            ProgressValue::Determinate(v) => format!("{v}"),
            ProgressValue::Indeterminate => "indeterminate".into(),
        }
    }
}

/// A progress bar in the visual region.
///
/// `status` is required and commonly a binding template (`"{status}"`) so
/// that later updates can change it without re-posting the notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressBar {
    pub status: String,
    pub value: ProgressValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_override: Option<String>,
}

impl ProgressBar {
    pub fn new(status: impl Into<String>, value: ProgressValue) -> Result<Self, ContentError> {
        let status = scrub(status);
        if status.trim().is_empty() {
            return Err(ContentError::MissingField {
                element: "ProgressBar",
                field: "status",
            });
        }
        Ok(Self {
            status,
            value,
            title: None,
            value_override: None,
        })
    }

    pub fn determinate(
        status: impl Into<String>,
        fraction: f64,
    ) -> Result<Self, ContentError> {
        Self::new(status, ProgressValue::determinate(fraction))
    }

    pub fn indeterminate(status: impl Into<String>) -> Result<Self, ContentError> {
        Self::new(status, ProgressValue::Indeterminate)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(scrub(title));
        self
    }

    /// Replaces the default percentage string shown next to the bar.
    pub fn value_override(mut self, text: impl Into<String>) -> Self {
        self.value_override = Some(scrub(text));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_required() {
        let err = ProgressBar::indeterminate("  ").unwrap_err();
        assert_eq!(
            err,
            ContentError::MissingField {
                element: "ProgressBar",
                field: "status",
            }
        );
    }

    #[test]
    fn determinate_clamps() {
        let bar = ProgressBar::determinate("working", 1.5).unwrap();
        assert_eq!(bar.value, ProgressValue::Determinate(1.0));
        let bar = ProgressBar::determinate("working", -0.2).unwrap();
        assert_eq!(bar.value, ProgressValue::Determinate(0.0));
    }

    #[test]
    fn wire_values() {
        assert_eq!(ProgressValue::determinate(0.3).wire_value(), "0.3");
        assert_eq!(ProgressValue::Indeterminate.wire_value(), "indeterminate");
    }
}
