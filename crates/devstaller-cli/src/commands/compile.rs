use super::{json_pretty, write_atomic, EXIT_SUCCESS};
use clap::builder::NonEmptyStringValueParser;
use devstaller_core::{CommandLine, CompileOptions, ConfigStore, CoreError};
use devstaller_schema::{
    BuilderManifest, OptionKind, DEFAULT_CKAN_VERSION, SUPPORTED_CKAN_VERSIONS,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Selection flags shared by every command that builds a configuration.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SelectionArgs {
    /// Builder file (TOML) to start from.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Preset to start from (see `presets`).
    #[arg(long)]
    pub preset: Option<String>,
    /// CKAN version to install.
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub ckan_version: Option<String>,
    /// Extension to add; prerequisites are added automatically. Repeatable.
    #[arg(short, long = "extension", value_name = "ID")]
    pub extensions: Vec<String>,
    /// Feature to add. Repeatable.
    #[arg(short, long = "feature", value_name = "ID")]
    pub features: Vec<String>,
}

impl SelectionArgs {
    fn as_manifest(&self) -> BuilderManifest {
        BuilderManifest {
            preset: self.preset.clone(),
            ckan_version: self.ckan_version.clone(),
            extensions: self.extensions.clone(),
            features: self.features.clone(),
        }
    }
}

/// Start from the builder file (or the default preset) and apply the
/// command-line selection on top of it.
pub fn build_store(selection: &SelectionArgs) -> Result<ConfigStore, String> {
    let mut store = match &selection.file {
        Some(path) => {
            info!("loading builder file {}", path.display());
            ConfigStore::from_manifest_file(path).map_err(|e| e.to_string())?
        }
        None => ConfigStore::new(),
    };
    let overrides = selection
        .as_manifest()
        .normalize()
        .map_err(|e| CoreError::from(e).to_string())?;
    store
        .apply_manifest(&overrides)
        .map_err(|e| CoreError::from(e).to_string())?;

    let version = &store.configuration().ckan_version;
    if !store.configuration().is_supported_version() {
        warn!(
            "CKAN {version} is not a supported version ({}); the installation may break. \
             The recommended version is {DEFAULT_CKAN_VERSION}",
            SUPPORTED_CKAN_VERSIONS.join(", ")
        );
    }
    Ok(store)
}

pub fn run(
    selection: &SelectionArgs,
    options: CompileOptions,
    output: Option<&Path>,
    save: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let store = build_store(selection)?;
    let command = store.compile(&options);

    if let Some(path) = save {
        let toml = BuilderManifest::from_configuration(store.configuration())
            .to_toml()
            .map_err(|e| format!("builder file error: {e}"))?;
        write_atomic(path, &toml)?;
        info!("saved builder file to {}", path.display());
    }

    if let Some(path) = output {
        write_atomic(path, &format!("{command}\n"))?;
    }

    if json {
        let config = store.configuration();
        let payload = serde_json::json!({
            "preset": store.preset(),
            "ckan_version": config.ckan_version,
            "extensions": config.ordered(OptionKind::Extension),
            "features": config.ordered(OptionKind::Feature),
            "argv": CommandLine::from_configuration(config, &options).argv(),
            "command": command,
            "output": output.map(|p| p.display().to_string()),
        });
        println!("{}", json_pretty(&payload)?);
    } else if let Some(path) = output {
        println!("wrote {}", path.display());
    } else {
        println!("{command}");
    }
    Ok(EXIT_SUCCESS)
}
