use super::{json_pretty, write_atomic, EXIT_SUCCESS};
use devstaller_core::{BuilderError, CommandLine, CompileOptions, ConfigStore, SelectionMode};
use devstaller_schema::{
    list_options, list_presets, rank, validate_version, BuilderManifest, CkanVersion, OptionId,
    OptionKind, DEFAULT_PRESET, SUPPORTED_CKAN_VERSIONS,
};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::collections::BTreeSet;
use std::io::{stderr, stdin, IsTerminal};
use std::path::Path;

fn prompt_err(e: dialoguer::Error) -> String {
    format!("prompt failed: {e}")
}

/// Move the selection of `kind` to `desired`. Removals go first, dependents
/// before their prerequisites, so deselecting a whole chain succeeds; any
/// removal the store refuses is returned and the option stays selected.
pub fn apply_selection(
    store: &mut ConfigStore,
    kind: OptionKind,
    desired: &BTreeSet<OptionId>,
) -> Vec<BuilderError> {
    let current = store.configuration().selection(kind).clone();
    let mut removals: Vec<&OptionId> = current.difference(desired).collect();
    removals.sort_by_key(|id| std::cmp::Reverse(rank(kind, id)));

    let mut errors = Vec::new();
    for id in removals {
        if let Err(e) = store.toggle(kind, id.clone()) {
            errors.push(e);
        }
    }

    let additions: Vec<OptionId> = desired
        .iter()
        .filter(|id| !store.configuration().contains(kind, id))
        .cloned()
        .collect();
    if !additions.is_empty() {
        let result = match kind {
            OptionKind::Extension => store.set_extensions(additions, SelectionMode::Add),
            OptionKind::Feature => store.set_features(additions, SelectionMode::Add),
        };
        if let Err(e) = result {
            errors.push(e);
        }
    }
    errors
}

fn choose_preset() -> Result<ConfigStore, String> {
    let presets = list_presets();
    let items: Vec<String> = presets
        .iter()
        .map(|p| format!("{} - {}", p.title, p.description))
        .collect();
    let default_idx = presets
        .iter()
        .position(|p| p.name == DEFAULT_PRESET)
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Which preset would you like to start from?")
        .items(&items)
        .default(default_idx)
        .interact()
        .map_err(prompt_err)?;
    ConfigStore::from_preset(presets[idx].name).map_err(|e| format!("builder error: {e}"))
}

fn choose_version(store: &mut ConfigStore) -> Result<(), String> {
    let current = store.configuration().ckan_version.to_string();
    let mut items: Vec<&str> = SUPPORTED_CKAN_VERSIONS.to_vec();
    items.push("Other");
    let default_idx = items.iter().position(|v| *v == current).unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Which CKAN version would you like to install?")
        .items(&items)
        .default(default_idx)
        .interact()
        .map_err(prompt_err)?;
    let version = if idx < SUPPORTED_CKAN_VERSIONS.len() {
        CkanVersion::from(items[idx])
    } else {
        let custom: String = Input::new()
            .with_prompt("CKAN version (e.g. 2.11.3)")
            .validate_with(|input: &String| -> Result<(), String> {
                validate_version(input).map(drop).map_err(|e| e.to_string())
            })
            .interact_text()
            .map_err(prompt_err)?;
        validate_version(&custom).map_err(|e| format!("builder file error: {e}"))?
    };
    store.set_version(version);
    Ok(())
}

fn choose_options(store: &mut ConfigStore, kind: OptionKind) -> Result<(), String> {
    // Known options in catalog order, then anything selected that the catalog
    // does not list so it can still be deselected.
    let mut ids: Vec<OptionId> = list_options(kind).map(|spec| OptionId::from(spec.id)).collect();
    for id in store.configuration().selection(kind) {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    let labels: Vec<String> = ids
        .iter()
        .map(|id| {
            let requires = devstaller_schema::prerequisites(kind, id);
            if requires.is_empty() {
                id.to_string()
            } else {
                format!("{id} (requires {})", requires.join(", "))
            }
        })
        .collect();
    let defaults: Vec<bool> = ids
        .iter()
        .map(|id| store.configuration().contains(kind, id))
        .collect();

    let picked = MultiSelect::new()
        .with_prompt(format!("Which {kind}s would you like to install? (space to toggle)"))
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .map_err(prompt_err)?;
    let desired: BTreeSet<OptionId> = picked.into_iter().map(|i| ids[i].clone()).collect();
    for err in apply_selection(store, kind, &desired) {
        eprintln!("warning: {err}");
    }
    Ok(())
}

fn save_builder_file(store: &ConfigStore) -> Result<Option<String>, String> {
    let path: String = Input::new()
        .with_prompt("Save this selection as a builder file (path, empty to skip)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    let toml = BuilderManifest::from_configuration(store.configuration())
        .to_toml()
        .map_err(|e| format!("builder file error: {e}"))?;
    write_atomic(Path::new(path), &toml)?;
    Ok(Some(path.to_owned()))
}

pub fn run(json: bool) -> Result<u8, String> {
    if !(stdin().is_terminal() && stderr().is_terminal()) {
        return Err(
            "interactive prompts require a TTY (use `compile` or `session` instead)".to_owned(),
        );
    }

    let mut store = choose_preset()?;
    let customize = Confirm::new()
        .with_prompt(format!(
            "Would you like to customize the {} configuration?",
            store.preset()
        ))
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    if customize {
        choose_version(&mut store)?;
        for kind in OptionKind::ALL {
            choose_options(&mut store, kind)?;
        }
    }

    let download_script = Confirm::new()
        .with_prompt("Include the commands that download ckan-devstaller?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    let options = CompileOptions {
        download_script,
        ..CompileOptions::default()
    };
    let command = store.compile(&options);
    let saved = save_builder_file(&store)?;

    if json {
        let payload = serde_json::json!({
            "snapshot": store.snapshot(),
            "argv": CommandLine::from_configuration(store.configuration(), &options).argv(),
            "command": command,
            "saved": saved,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{command}");
        if let Some(path) = saved {
            eprintln!("saved builder file to {path}");
        }
    }
    Ok(EXIT_SUCCESS)
}
