//! Cancellation reasons.

use crate::CommerceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest accepted reason, counted in characters after trimming.
pub const MIN_REASON_CHARS: usize = 5;

/// Canned reasons offered to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonPreset {
    OrderedByMistake,
    ChangeAddressOrPhone,
    DeliveryTooLate,
    FoundBetterOption,
    /// Free text only.
    Other,
}

impl ReasonPreset {
    pub const ALL: [ReasonPreset; 5] = [
        ReasonPreset::OrderedByMistake,
        ReasonPreset::ChangeAddressOrPhone,
        ReasonPreset::DeliveryTooLate,
        ReasonPreset::FoundBetterOption,
        ReasonPreset::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReasonPreset::OrderedByMistake => "Ordered by mistake",
            ReasonPreset::ChangeAddressOrPhone => "Need to change address/phone",
            ReasonPreset::DeliveryTooLate => "Delivery is too late",
            ReasonPreset::FoundBetterOption => "Found a better option",
            ReasonPreset::Other => "Other",
        }
    }

    /// Match a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(label))
    }
}

/// A validated cancellation reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CancelReason(String);

impl CancelReason {
    /// Accept free text of at least [`MIN_REASON_CHARS`] after trimming.
    pub fn new(text: &str) -> Result<Self, CommerceError> {
        let text = text.trim();
        if text.chars().count() < MIN_REASON_CHARS {
            return Err(CommerceError::Validation(format!(
                "cancel reason must be at least {} characters",
                MIN_REASON_CHARS
            )));
        }
        Ok(Self(text.to_string()))
    }

    /// Combine a preset with optional detail as `"<preset> - <detail>"`.
    ///
    /// With [`ReasonPreset::Other`] the detail stands alone and must pass
    /// the length check by itself.
    pub fn compose(preset: ReasonPreset, detail: &str) -> Result<Self, CommerceError> {
        let detail = detail.trim();
        match preset {
            ReasonPreset::Other => Self::new(detail),
            _ if detail.is_empty() => Self::new(preset.label()),
            _ => Self::new(&format!("{} - {}", preset.label(), detail)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CancelReason {
    type Error = CommerceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CancelReason> for String {
    fn from(reason: CancelReason) -> Self {
        reason.0
    }
}
