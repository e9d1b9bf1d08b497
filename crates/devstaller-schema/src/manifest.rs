//! TOML builder files.
//!
//! A builder file records a selection so it can be compiled again later or
//! shared. Every key is optional; an empty file compiles to the default
//! preset.
//!
//! ```toml
//! preset = "dathere-default"
//! ckan_version = "2.10.8"
//! extensions = ["ckanext-dcat"]
//! features = []
//! ```

use crate::config::Configuration;
use crate::option::OptionKind;
use crate::preset::PresetLabel;
use crate::types::{is_command_token, CkanVersion, OptionId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read builder file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse builder file: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to serialize builder file: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("ckan_version must not be empty")]
    EmptyVersion,
    #[error("preset must not be empty")]
    EmptyPreset,
    #[error(
        "invalid {kind} identifier '{value}': must not start with '-' and may only contain \
         letters, digits, and + - _ . : / @ , = %"
    )]
    InvalidIdentifier { kind: OptionKind, value: String },
    #[error(
        "invalid ckan_version '{value}': must not start with '-' and may only contain \
         letters, digits, and + - _ . : / @ , = %"
    )]
    InvalidVersion { value: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuilderManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ckan_version: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Validated builder file: trimmed, deduplicated, and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedManifest {
    pub preset: Option<String>,
    pub ckan_version: Option<CkanVersion>,
    pub extensions: Vec<OptionId>,
    pub features: Vec<OptionId>,
}

impl BuilderManifest {
    /// Snapshot of a configuration. The preset key is written only when the
    /// configuration matches a catalog entry, so the file stays self-describing.
    pub fn from_configuration(config: &Configuration) -> Self {
        let to_strings = |kind: OptionKind| -> Vec<String> {
            config
                .ordered(kind)
                .into_iter()
                .map(|id| id.to_string())
                .collect()
        };
        Self {
            preset: PresetLabel::of(config).name().map(str::to_owned),
            ckan_version: Some(config.ckan_version.to_string()),
            extensions: to_strings(OptionKind::Extension),
            features: to_strings(OptionKind::Feature),
        }
    }

    pub fn to_toml(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn normalize(&self) -> Result<NormalizedManifest, ManifestError> {
        let preset = match &self.preset {
            Some(p) if p.trim().is_empty() => return Err(ManifestError::EmptyPreset),
            Some(p) => Some(p.trim().to_owned()),
            None => None,
        };
        let ckan_version = match &self.ckan_version {
            Some(v) => Some(validate_version(v)?),
            None => None,
        };
        Ok(NormalizedManifest {
            preset,
            ckan_version,
            extensions: normalize_identifiers(OptionKind::Extension, &self.extensions)?,
            features: normalize_identifiers(OptionKind::Feature, &self.features)?,
        })
    }
}

fn normalize_identifiers(
    kind: OptionKind,
    values: &[String],
) -> Result<Vec<OptionId>, ManifestError> {
    let mut out = values
        .iter()
        .map(|value| validate_identifier(kind, value))
        .collect::<Result<Vec<_>, _>>()?;
    out.sort();
    out.dedup();
    Ok(out)
}

/// Trim and check an extension or feature identifier taken from user input.
/// Accepted identifiers survive compilation and parsing unchanged.
pub fn validate_identifier(kind: OptionKind, value: &str) -> Result<OptionId, ManifestError> {
    let trimmed = value.trim();
    if is_command_token(trimmed) {
        Ok(OptionId::new(trimmed))
    } else {
        Err(ManifestError::InvalidIdentifier {
            kind,
            value: value.to_owned(),
        })
    }
}

/// Trim and check a CKAN version taken from user input.
pub fn validate_version(value: &str) -> Result<CkanVersion, ManifestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ManifestError::EmptyVersion)
    } else if is_command_token(trimmed) {
        Ok(CkanVersion::new(trimmed))
    } else {
        Err(ManifestError::InvalidVersion {
            value: value.to_owned(),
        })
    }
}

pub fn parse_manifest_str(input: &str) -> Result<BuilderManifest, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<BuilderManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_builder_file() {
        let input = r#"
preset = "dathere-default"
ckan_version = "2.10.8"
extensions = ["ckanext-dcat"]
features = ["enable-ssh"]
"#;
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.preset.as_deref(), Some("dathere-default"));
        assert_eq!(manifest.ckan_version.as_deref(), Some("2.10.8"));
        assert_eq!(manifest.extensions, vec!["ckanext-dcat"]);
        assert_eq!(manifest.features, vec!["enable-ssh"]);
    }

    #[test]
    fn parses_empty_builder_file() {
        let manifest = parse_manifest_str("").expect("should parse");
        assert_eq!(manifest, BuilderManifest::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse_manifest_str("plugins = [\"datastore\"]\n").is_err());
    }

    #[test]
    fn normalizes_and_sorts_deterministically() {
        let manifest = parse_manifest_str(
            r#"
ckan_version = " 2.11.3 "
extensions = ["DataStore", " ckanext-scheming", "DataStore"]
"#,
        )
        .unwrap();
        let normalized = manifest.normalize().unwrap();
        assert_eq!(normalized.ckan_version, Some(CkanVersion::from("2.11.3")));
        assert_eq!(normalized.extensions, vec!["DataStore", "ckanext-scheming"]);
    }

    #[test]
    fn rejects_blank_version() {
        let manifest = parse_manifest_str("ckan_version = \"  \"\n").unwrap();
        assert!(matches!(manifest.normalize(), Err(ManifestError::EmptyVersion)));
    }

    #[test]
    fn rejects_identifier_with_whitespace() {
        let manifest = parse_manifest_str("features = [\"enable ssh\"]\n").unwrap();
        assert!(matches!(
            manifest.normalize(),
            Err(ManifestError::InvalidIdentifier {
                kind: OptionKind::Feature,
                ..
            })
        ));
    }

    #[test]
    fn rejects_flag_like_identifiers_and_version() {
        let manifest = parse_manifest_str(
            "ckan_version = \"2.11.3\"\nextensions = [\"--preset\"]\n",
        )
        .unwrap();
        assert!(matches!(
            manifest.normalize(),
            Err(ManifestError::InvalidIdentifier {
                kind: OptionKind::Extension,
                ..
            })
        ));

        let manifest = parse_manifest_str("ckan_version = \"--features\"\n").unwrap();
        assert!(matches!(
            manifest.normalize(),
            Err(ManifestError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn rejects_shell_metacharacters() {
        for value in ["$(reboot)", "a;b", "`id`", "x'y"] {
            assert!(validate_identifier(OptionKind::Feature, value).is_err(), "{value}");
            assert!(validate_version(value).is_err(), "{value}");
        }
        assert_eq!(
            validate_identifier(OptionKind::Extension, " DataPusher+ ").unwrap(),
            "DataPusher+"
        );
        assert_eq!(validate_version(" 2.10.8").unwrap(), "2.10.8");
    }

    #[test]
    fn configuration_snapshot_roundtrips_through_toml() {
        let config = crate::get_preset("dathere-default").unwrap().configuration();
        let toml = BuilderManifest::from_configuration(&config).to_toml().unwrap();
        assert!(toml.contains("preset = \"dathere-default\""));

        let back = parse_manifest_str(&toml).unwrap().normalize().unwrap();
        assert_eq!(back.ckan_version.as_ref(), Some(&config.ckan_version));
        let extensions: std::collections::BTreeSet<OptionId> =
            back.extensions.into_iter().collect();
        assert_eq!(extensions, config.extensions);
    }

    #[test]
    fn custom_snapshot_omits_preset_key() {
        let config = Configuration::new("2.10.8");
        let manifest = BuilderManifest::from_configuration(&config);
        assert!(manifest.preset.is_none());
        assert!(!manifest.to_toml().unwrap().contains("preset"));
    }

    #[test]
    fn parses_builder_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devstaller.toml");
        std::fs::write(&path, "features = [\"enable-ssh\"]\n").unwrap();
        let manifest = parse_manifest_file(&path).unwrap();
        assert_eq!(manifest.features, vec!["enable-ssh"]);
    }
}
