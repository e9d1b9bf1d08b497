use crate::option::{catalog_order, prerequisites, OptionKind};
use crate::types::{CkanVersion, OptionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_CKAN_VERSION: &str = "2.11.3";

/// Releases the installer is known to handle. Anything else is accepted but
/// may produce a broken installation.
pub const SUPPORTED_CKAN_VERSIONS: &[&str] = &["2.11.3", "2.10.8"];

/// The selection a builder session compiles: target version plus the
/// selected extension and feature sets.
///
/// Sets are ordered so equality and hashing depend only on content, never on
/// the order options were picked in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    pub ckan_version: CkanVersion,
    #[serde(default)]
    pub extensions: BTreeSet<OptionId>,
    #[serde(default)]
    pub features: BTreeSet<OptionId>,
}

/// A selected option whose prerequisite is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmetRequirement {
    pub kind: OptionKind,
    pub dependent: OptionId,
    pub required: OptionId,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(DEFAULT_CKAN_VERSION)
    }
}

impl Configuration {
    pub fn new(ckan_version: impl Into<CkanVersion>) -> Self {
        Self {
            ckan_version: ckan_version.into(),
            extensions: BTreeSet::new(),
            features: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_extensions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionId>,
    {
        self.extensions.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_features<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OptionId>,
    {
        self.features.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn selection(&self, kind: OptionKind) -> &BTreeSet<OptionId> {
        match kind {
            OptionKind::Extension => &self.extensions,
            OptionKind::Feature => &self.features,
        }
    }

    pub fn selection_mut(&mut self, kind: OptionKind) -> &mut BTreeSet<OptionId> {
        match kind {
            OptionKind::Extension => &mut self.extensions,
            OptionKind::Feature => &mut self.features,
        }
    }

    pub fn contains(&self, kind: OptionKind, id: &str) -> bool {
        self.selection(kind).contains(id)
    }

    /// Selected options of one kind in catalog-stable order.
    pub fn ordered(&self, kind: OptionKind) -> Vec<&OptionId> {
        catalog_order(kind, self.selection(kind))
    }

    pub fn is_supported_version(&self) -> bool {
        SUPPORTED_CKAN_VERSIONS.contains(&self.ckan_version.as_str())
    }

    /// Every selected option whose direct prerequisite is not selected.
    /// Empty whenever the dependency closure holds.
    pub fn unmet_requirements(&self) -> Vec<UnmetRequirement> {
        let mut unmet = Vec::new();
        for kind in OptionKind::ALL {
            let selected = self.selection(kind);
            for dependent in self.ordered(kind) {
                for required in prerequisites(kind, dependent) {
                    if !selected.contains(*required) {
                        unmet.push(UnmetRequirement {
                            kind,
                            dependent: dependent.clone(),
                            required: OptionId::from(*required),
                        });
                    }
                }
            }
        }
        unmet
    }
}
