use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Voices accepted by the upstream speech provider
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    #[default]
    Onyx,
    Nova,
    Shimmer,
}

/// Catalog entry describing a voice to API consumers
#[derive(Debug, Clone, Serialize)]
pub struct VoiceInfo {
    pub id: Voice,
    pub name: &'static str,
    pub description: &'static str,
}

impl Voice {
    /// Human-readable display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alloy => "Alloy",
            Self::Echo => "Echo",
            Self::Fable => "Fable",
            Self::Onyx => "Onyx",
            Self::Nova => "Nova",
            Self::Shimmer => "Shimmer",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Alloy => "Balanced, neutral voice",
            Self::Echo => "Deep, resonant voice",
            Self::Fable => "Storytelling voice",
            Self::Onyx => "Authoritative voice",
            Self::Nova => "Bright, energetic voice",
            Self::Shimmer => "Soft, calming voice",
        }
    }

    /// All voices in catalog order
    pub fn catalog() -> Vec<VoiceInfo> {
        Self::iter()
            .map(|id| VoiceInfo {
                id,
                name: id.name(),
                description: id.description(),
            })
            .collect()
    }

    /// Comma-separated list of voice ids, used in validation messages
    pub fn id_list() -> String {
        Self::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_lowercase_ids() {
        assert_eq!(Voice::from_str("shimmer").unwrap(), Voice::Shimmer);
        assert!(Voice::from_str("baritone").is_err());
    }

    #[test]
    fn catalog_lists_six_voices_in_order() {
        let catalog = Voice::catalog();

        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog[0].id, Voice::Alloy);
        assert_eq!(catalog[5].description, "Soft, calming voice");
    }

    #[test]
    fn default_voice_is_onyx() {
        assert_eq!(Voice::default(), Voice::Onyx);
        assert_eq!(Voice::default().as_ref(), "onyx");
    }

    #[test]
    fn id_list_matches_wire_names() {
        assert_eq!(Voice::id_list(), "alloy, echo, fable, onyx, nova, shimmer");
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&Voice::Nova).unwrap();
        assert_eq!(json, "\"nova\"");
    }
}
