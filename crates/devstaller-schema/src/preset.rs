use crate::config::Configuration;
use crate::option::OptionKind;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub ckan_version: &'static str,
    pub extensions: &'static [&'static str],
    pub features: &'static [&'static str],
}

pub const DEFAULT_PRESET: &str = "ckan-only";

/// Reverse lookup walks this slice front to back, so when two entries could
/// describe the same selection the earlier one wins.
pub const BUILTIN_PRESETS: &[Preset] = &[
    Preset {
        name: "ckan-only",
        title: "CKAN-only",
        description: "Installs CKAN with ckan-compose. No CKAN extensions and extra features are installed.",
        ckan_version: "2.11.3",
        extensions: &[],
        features: &[],
    },
    Preset {
        name: "dathere-default",
        title: "datHere Default",
        description: "datHere's default preset featuring the DataPusher+ extension.",
        ckan_version: "2.11.3",
        extensions: &["ckanext-scheming", "DataStore", "DataPusher+"],
        features: &["enable-ssh"],
    },
];

impl Preset {
    /// The snapshot a session holds right after selecting this preset.
    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.ckan_version)
            .with_extensions(self.extensions.iter().copied())
            .with_features(self.features.iter().copied())
    }

    /// Exact match on the full triple: version equality plus set equality
    /// for extensions and features.
    pub fn matches(&self, config: &Configuration) -> bool {
        config.ckan_version == self.ckan_version
            && same_set(config, OptionKind::Extension, self.extensions)
            && same_set(config, OptionKind::Feature, self.features)
    }
}

fn same_set(config: &Configuration, kind: OptionKind, ids: &[&str]) -> bool {
    let selected = config.selection(kind);
    // Catalog entries never list an id twice, so length plus containment is equality.
    selected.len() == ids.len() && ids.iter().all(|id| selected.contains(*id))
}

pub fn get_preset(name: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

pub fn list_presets() -> &'static [Preset] {
    BUILTIN_PRESETS
}

/// First catalog entry whose snapshot equals `config`, if any.
pub fn match_preset(config: &Configuration) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.matches(config))
}

/// Derived preset label of a configuration: a catalog name, or `custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetLabel {
    Named(&'static str),
    Custom,
}

impl PresetLabel {
    pub const CUSTOM: &'static str = "custom";

    pub fn of(config: &Configuration) -> Self {
        match_preset(config).map_or(Self::Custom, |p| Self::Named(p.name))
    }

    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.name().unwrap_or(Self::CUSTOM)
    }
}

impl fmt::Display for PresetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PresetLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
