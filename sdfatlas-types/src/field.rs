use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Distance field variant produced by the rasterizer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Multi-channel signed distance field.
    #[default]
    Msdf,
    /// Single-channel signed distance field.
    Sdf,
    /// Pseudo signed distance field.
    Psdf,
}

impl FieldType {
    /// Whether the rasterizer emits three distinct color channels.
    pub fn is_multi_channel(&self) -> bool {
        matches!(self, FieldType::Msdf)
    }
}

/// Serialization format of the font descriptor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// BMFont XML.
    #[default]
    Xml,
    /// BMFont-shaped JSON.
    Json,
    /// BMFont text.
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xml | OutputFormat::Txt => "fnt",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_field_types() {
        assert_eq!(FieldType::from_str("msdf").ok(), Some(FieldType::Msdf));
        assert_eq!(FieldType::from_str("sdf").ok(), Some(FieldType::Sdf));
        assert_eq!(FieldType::from_str("psdf").ok(), Some(FieldType::Psdf));
        assert!(FieldType::from_str("foo").is_err());
    }

    #[test]
    fn field_type_display_matches_rasterizer_flag() {
        assert_eq!(FieldType::Psdf.to_string(), "psdf");
    }

    #[test]
    fn output_extensions() {
        assert_eq!(OutputFormat::Xml.extension(), "fnt");
        assert_eq!(OutputFormat::Txt.extension(), "fnt");
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert!(OutputFormat::from_str("yaml").is_err());
    }
}
