//! Choice fields that accept a free-text value when "other" is picked.
//!
//! Each [`OtherCapableField`] pairs a choice field with a companion override field in the
//! draft. The companion is only meaningful while the choice holds the "other" sentinel;
//! moving the choice away from the sentinel clears it.

use crate::draft::DraftField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OtherCapableField {
    Occupation,
    FamilyType,
    Locality,
    Religion,
    HeadRelationship,
    Mobility,
    ReferredBy,
}

impl OtherCapableField {
    pub const ALL: [OtherCapableField; 7] = [
        OtherCapableField::Occupation,
        OtherCapableField::FamilyType,
        OtherCapableField::Locality,
        OtherCapableField::Religion,
        OtherCapableField::HeadRelationship,
        OtherCapableField::Mobility,
        OtherCapableField::ReferredBy,
    ];

    /// The choice field in the draft.
    pub fn choice(self) -> DraftField {
        match self {
            OtherCapableField::Occupation => DraftField::Occupation,
            OtherCapableField::FamilyType => DraftField::FamilyType,
            OtherCapableField::Locality => DraftField::Locality,
            OtherCapableField::Religion => DraftField::Religion,
            OtherCapableField::HeadRelationship => DraftField::HeadRelationship,
            OtherCapableField::Mobility => DraftField::Mobility,
            OtherCapableField::ReferredBy => DraftField::ReferredBy,
        }
    }

    /// The companion free-text field in the draft.
    pub fn companion(self) -> DraftField {
        match self {
            OtherCapableField::Occupation => DraftField::OccupationOther,
            OtherCapableField::FamilyType => DraftField::FamilyTypeOther,
            OtherCapableField::Locality => DraftField::LocalityOther,
            OtherCapableField::Religion => DraftField::ReligionOther,
            OtherCapableField::HeadRelationship => DraftField::HeadRelationshipOther,
            OtherCapableField::Mobility => DraftField::MobilityOther,
            OtherCapableField::ReferredBy => DraftField::ReferredByOther,
        }
    }

    pub fn from_choice(field: DraftField) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.choice() == field)
    }
}

/// Whether a choice value is the "other" sentinel (`other` or `others`, any case).
pub fn is_other_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.eq_ignore_ascii_case("other") || v.eq_ignore_ascii_case("others")
}

/// Local UI state for one other-capable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherFieldState {
    /// Whether the free-text input is shown.
    pub show: bool,
    /// Current free-text value.
    pub text: String,
}

/// Derives the local state from the choice value and any override already in the draft.
///
/// The draft override seeds the text so a value restored from an earlier session
/// reappears when the sentinel is selected again.
pub fn derive_other_field_state(
    value: Option<&str>,
    override_draft_value: Option<&str>,
) -> OtherFieldState {
    match value {
        Some(v) if is_other_sentinel(v) => OtherFieldState {
            show: true,
            text: override_draft_value.unwrap_or_default().to_string(),
        },
        _ => OtherFieldState::default(),
    }
}

/// Value to submit for a choice field.
///
/// When the choice is the sentinel the override is used, first from the draft, then from
/// local state; if neither is filled in, `None` is sent rather than the sentinel.
pub fn resolve_choice(
    value: Option<&str>,
    draft_override: Option<&str>,
    local_text: Option<&str>,
) -> Option<String> {
    let non_blank = |s: &&str| !s.trim().is_empty();
    match value.filter(non_blank) {
        Some(v) if is_other_sentinel(v) => draft_override
            .filter(non_blank)
            .or(local_text.filter(non_blank))
            .map(|s| s.trim().to_string()),
        Some(v) => Some(v.trim().to_string()),
        None => None,
    }
}
