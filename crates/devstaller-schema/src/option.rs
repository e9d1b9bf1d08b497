//! Registry of known extensions and features, and the dependency table.
//!
//! Every dependency rule lives in `requires`. The store consults this table
//! both when adding an option (to pull in prerequisites) and when removing
//! one (to refuse removals that would orphan a dependent).

use crate::types::OptionId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Extension,
    Feature,
}

impl OptionKind {
    pub const ALL: [OptionKind; 2] = [OptionKind::Extension, OptionKind::Feature];

    /// Flag that carries this kind of option on the installer command line.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Extension => "--extensions",
            Self::Feature => "--features",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension => f.write_str("extension"),
            Self::Feature => f.write_str("feature"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Options of the same kind that must be selected whenever this one is.
    pub requires: &'static [&'static str],
    /// What the installer does when this option is selected, in install order.
    pub plan: &'static [&'static str],
}

/// Declaration order is the catalog-stable rendering order, and every
/// prerequisite is declared before its dependents.
pub const BUILTIN_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        kind: OptionKind::Extension,
        id: "ckanext-scheming",
        title: "ckanext-scheming",
        description: "Custom dataset, group, and organization schemas for CKAN.",
        requires: &[],
        plan: &["Install the ckanext-scheming extension"],
    },
    OptionSpec {
        kind: OptionKind::Extension,
        id: "DataStore",
        title: "DataStore",
        description: "Stores tabular resource data in a queryable PostgreSQL database.",
        requires: &[],
        plan: &["Install the DataStore extension"],
    },
    OptionSpec {
        kind: OptionKind::Extension,
        id: "DataPusher+",
        title: "DataPusher+",
        description: "Next-generation DataPusher powered by qsv.",
        requires: &["ckanext-scheming", "DataStore"],
        plan: &[
            "Install the DataPusher+ extension",
            "Disable DRUF mode for DataPusher+",
        ],
    },
    OptionSpec {
        kind: OptionKind::Feature,
        id: "enable-ssh",
        title: "Enable SSH",
        description: "Installs the openssh-server package.",
        requires: &[],
        plan: &["Install openssh-server to enable SSH access"],
    },
];

pub fn get_option(kind: OptionKind, id: &str) -> Option<&'static OptionSpec> {
    BUILTIN_OPTIONS
        .iter()
        .find(|o| o.kind == kind && o.id == id)
}

pub fn list_options(kind: OptionKind) -> impl Iterator<Item = &'static OptionSpec> {
    BUILTIN_OPTIONS.iter().filter(move |o| o.kind == kind)
}

/// Direct prerequisites of an option. Unknown options have none.
pub fn prerequisites(kind: OptionKind, id: &str) -> &'static [&'static str] {
    match get_option(kind, id) {
        Some(option) => option.requires,
        None => &[],
    }
}

/// Position of a known option within its kind, `None` for unknown tokens.
pub fn rank(kind: OptionKind, id: &str) -> Option<usize> {
    list_options(kind).position(|o| o.id == id)
}

/// Sort identifiers into catalog-stable order: known options in declaration
/// order, then unknown tokens lexicographically.
pub fn catalog_order<'a, I>(kind: OptionKind, ids: I) -> Vec<&'a OptionId>
where
    I: IntoIterator<Item = &'a OptionId>,
{
    let mut out: Vec<&OptionId> = ids.into_iter().collect();
    out.sort_by(|a, b| {
        let ka = (rank(kind, a).unwrap_or(usize::MAX), a.as_str());
        let kb = (rank(kind, b).unwrap_or(usize::MAX), b.as_str());
        ka.cmp(&kb)
    });
    out
}
