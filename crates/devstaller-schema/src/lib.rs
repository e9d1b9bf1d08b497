//! Data model for the ckan-devstaller builder.
//!
//! This crate defines the schema layer: option identifiers (`OptionId`),
//! the declarative option registry and dependency table (`BUILTIN_OPTIONS`),
//! the `Configuration` triple with its catalog-stable ordering, the built-in
//! preset catalog (`BUILTIN_PRESETS`), and TOML builder files
//! (`BuilderManifest`).

pub mod config;
pub mod manifest;
pub mod option;
pub mod preset;
pub mod types;

pub use config::{
    Configuration, UnmetRequirement, DEFAULT_CKAN_VERSION, SUPPORTED_CKAN_VERSIONS,
};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, validate_identifier, validate_version, BuilderManifest,
    ManifestError, NormalizedManifest,
};
pub use option::{
    catalog_order, get_option, list_options, prerequisites, rank, OptionKind, OptionSpec,
    BUILTIN_OPTIONS,
};
pub use preset::{
    get_preset, list_presets, match_preset, Preset, PresetLabel, BUILTIN_PRESETS, DEFAULT_PRESET,
};
pub use types::{is_command_token, CkanVersion, OptionId};
