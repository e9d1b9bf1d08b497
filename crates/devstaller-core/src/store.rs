use crate::compile::{compile, CompileOptions};
use crate::{BuilderError, CoreError};
use devstaller_schema::{
    get_preset, parse_manifest_file, prerequisites, CkanVersion, Configuration,
    NormalizedManifest, OptionId, OptionKind, PresetLabel, DEFAULT_PRESET,
};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// How a batch of identifiers is applied to a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Union the identifiers (and their prerequisites) into the selection.
    #[default]
    Add,
    /// Toggle each identifier in turn; the batch commits only if every toggle succeeds.
    Toggle,
}

/// A single user action against a builder session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectPreset(String),
    SetVersion(CkanVersion),
    Toggle {
        kind: OptionKind,
        id: OptionId,
    },
    Select {
        kind: OptionKind,
        ids: Vec<OptionId>,
        mode: SelectionMode,
    },
}

/// Compute the configuration that results from applying `action` to `config`.
///
/// Pure: `config` is never modified, and an `Err` means no new state exists.
pub fn transition(
    config: &Configuration,
    action: &Action,
) -> Result<Configuration, BuilderError> {
    match action {
        Action::SelectPreset(name) => get_preset(name)
            .map(devstaller_schema::Preset::configuration)
            .ok_or_else(|| BuilderError::UnknownPreset { name: name.clone() }),
        Action::SetVersion(version) => {
            let mut next = config.clone();
            next.ckan_version = version.clone();
            Ok(next)
        }
        Action::Toggle { kind, id } => {
            let mut next = config.clone();
            toggle(&mut next, *kind, id)?;
            Ok(next)
        }
        Action::Select { kind, ids, mode } => {
            let mut next = config.clone();
            for id in ids {
                match mode {
                    SelectionMode::Add => add_with_prerequisites(&mut next, *kind, id),
                    SelectionMode::Toggle => toggle(&mut next, *kind, id)?,
                }
            }
            Ok(next)
        }
    }
}

fn toggle(
    config: &mut Configuration,
    kind: OptionKind,
    id: &OptionId,
) -> Result<(), BuilderError> {
    if config.contains(kind, id) {
        remove_guarded(config, kind, id)
    } else {
        add_with_prerequisites(config, kind, id);
        Ok(())
    }
}

fn add_with_prerequisites(config: &mut Configuration, kind: OptionKind, id: &OptionId) {
    let selected = config.selection_mut(kind);
    let mut pending = vec![id.clone()];
    while let Some(current) = pending.pop() {
        for required in prerequisites(kind, &current) {
            if !selected.contains(*required) {
                pending.push(OptionId::from(*required));
            }
        }
        selected.insert(current);
    }
}

fn remove_guarded(
    config: &mut Configuration,
    kind: OptionKind,
    id: &OptionId,
) -> Result<(), BuilderError> {
    let blocking = config.ordered(kind).into_iter().find(|dependent| {
        *dependent != id && prerequisites(kind, dependent).contains(&id.as_str())
    });
    if let Some(blocking) = blocking {
        return Err(BuilderError::DependencyConflict {
            kind,
            blocking: blocking.clone(),
            required: id.clone(),
        });
    }
    config.selection_mut(kind).remove(id.as_str());
    Ok(())
}

/// Read-only view of a session: the selection plus its derived preset label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub preset: PresetLabel,
    #[serde(flatten)]
    pub configuration: Configuration,
}

/// Owner of a builder session's selection.
///
/// Every mutation goes through [`transition`], so observers only ever see a
/// configuration that satisfies the dependency closure, and the cached preset
/// label is recomputed before the mutating call returns.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: Configuration,
    preset: PresetLabel,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Start a session from the default preset.
    pub fn new() -> Self {
        let config = get_preset(DEFAULT_PRESET)
            .map(devstaller_schema::Preset::configuration)
            .unwrap_or_default();
        Self::from_configuration(config)
    }

    pub fn from_preset(name: &str) -> Result<Self, BuilderError> {
        let mut store = Self::new();
        store.select_preset(name)?;
        Ok(store)
    }

    /// Adopt an arbitrary selection, pulling in any missing prerequisites.
    pub fn from_configuration(mut config: Configuration) -> Self {
        for kind in OptionKind::ALL {
            let selected: Vec<OptionId> = config.selection(kind).iter().cloned().collect();
            for id in &selected {
                add_with_prerequisites(&mut config, kind, id);
            }
        }
        let preset = PresetLabel::of(&config);
        Self { config, preset }
    }

    /// Start from the default preset and apply a builder file on top.
    pub fn from_manifest_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let normalized = parse_manifest_file(path)?.normalize()?;
        let mut store = Self::new();
        store.apply_manifest(&normalized)?;
        Ok(store)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn preset(&self) -> PresetLabel {
        self.preset
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            preset: self.preset,
            configuration: self.config.clone(),
        }
    }

    pub fn compile(&self, options: &CompileOptions) -> String {
        compile(&self.config, options)
    }

    pub fn apply(&mut self, action: &Action) -> Result<(), BuilderError> {
        match transition(&self.config, action) {
            Ok(next) => {
                self.commit(next);
                debug!("applied {action:?}; preset is now {}", self.preset);
                Ok(())
            }
            Err(e) => {
                debug!("rejected {action:?}: {e}");
                Err(e)
            }
        }
    }

    /// Apply a sequence of actions as one unit: either all of them take
    /// effect or none do.
    pub fn apply_all(&mut self, actions: &[Action]) -> Result<(), BuilderError> {
        let mut next = self.config.clone();
        for action in actions {
            next = transition(&next, action).inspect_err(|e| {
                debug!("rejected batch of {} actions at {action:?}: {e}", actions.len());
            })?;
        }
        self.commit(next);
        debug!("applied batch of {} actions; preset is now {}", actions.len(), self.preset);
        Ok(())
    }

    /// Apply a builder file: preset, then version, then added extensions and
    /// features.
    pub fn apply_manifest(&mut self, manifest: &NormalizedManifest) -> Result<(), BuilderError> {
        let mut actions = Vec::with_capacity(4);
        if let Some(preset) = &manifest.preset {
            actions.push(Action::SelectPreset(preset.clone()));
        }
        if let Some(version) = &manifest.ckan_version {
            actions.push(Action::SetVersion(version.clone()));
        }
        actions.push(Action::Select {
            kind: OptionKind::Extension,
            ids: manifest.extensions.clone(),
            mode: SelectionMode::Add,
        });
        actions.push(Action::Select {
            kind: OptionKind::Feature,
            ids: manifest.features.clone(),
            mode: SelectionMode::Add,
        });
        self.apply_all(&actions)
    }

    pub fn select_preset(&mut self, name: &str) -> Result<(), BuilderError> {
        self.apply(&Action::SelectPreset(name.to_owned()))
    }

    /// Change only the target version. Version changes are never rejected.
    pub fn set_version(&mut self, version: impl Into<CkanVersion>) {
        let applied = self.apply(&Action::SetVersion(version.into()));
        debug_assert!(applied.is_ok(), "version changes have no failure mode");
    }

    pub fn toggle(
        &mut self,
        kind: OptionKind,
        id: impl Into<OptionId>,
    ) -> Result<(), BuilderError> {
        self.apply(&Action::Toggle {
            kind,
            id: id.into(),
        })
    }

    pub fn toggle_extension(&mut self, id: impl Into<OptionId>) -> Result<(), BuilderError> {
        self.toggle(OptionKind::Extension, id)
    }

    pub fn toggle_feature(&mut self, id: impl Into<OptionId>) -> Result<(), BuilderError> {
        self.toggle(OptionKind::Feature, id)
    }

    pub fn set_extensions<I, S>(&mut self, ids: I, mode: SelectionMode) -> Result<(), BuilderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionId>,
    {
        self.select(OptionKind::Extension, ids, mode)
    }

    pub fn set_features<I, S>(&mut self, ids: I, mode: SelectionMode) -> Result<(), BuilderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionId>,
    {
        self.select(OptionKind::Feature, ids, mode)
    }

    fn select<I, S>(
        &mut self,
        kind: OptionKind,
        ids: I,
        mode: SelectionMode,
    ) -> Result<(), BuilderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionId>,
    {
        self.apply(&Action::Select {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
            mode,
        })
    }

    fn commit(&mut self, next: Configuration) {
        self.preset = PresetLabel::of(&next);
        self.config = next;
    }
}
