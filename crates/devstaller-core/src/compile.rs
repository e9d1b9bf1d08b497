//! Compilation of a configuration into a `ckan-devstaller` invocation.
//!
//! The output grammar is fixed:
//!
//! ```text
//! ./ckan-devstaller \
//! --preset <name> \
//! --ckan-version <version> \
//! --extensions <id>... \
//! --features <id>... \
//! --skip-interactive \
//! --skip-run
//! ```
//!
//! Groups appear in [`FLAG_ORDER`]; a group is emitted only when it has
//! something to say, except `--ckan-version`, which is always present.
//! Identifiers are listed in catalog-stable order, so equal configurations
//! compile to byte-identical text.

use devstaller_schema::{Configuration, OptionKind, PresetLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

pub const PROGRAM: &str = "./ckan-devstaller";

/// Joins consecutive groups so the command can be pasted into a shell as is.
pub const LINE_CONTINUATION: &str = " \\\n";

/// Fetches the latest installer release into the working directory.
pub const BOOTSTRAP_SCRIPT: &str = "\
wget https://github.com/dathere/ckan-devstaller/releases/latest/download/ckan-devstaller
chmod +x ./ckan-devstaller
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagGroup {
    Preset,
    CkanVersion,
    Extensions,
    Features,
    SkipInteractive,
    SkipRun,
}

pub const FLAG_ORDER: [FlagGroup; 6] = [
    FlagGroup::Preset,
    FlagGroup::CkanVersion,
    FlagGroup::Extensions,
    FlagGroup::Features,
    FlagGroup::SkipInteractive,
    FlagGroup::SkipRun,
];

impl FlagGroup {
    pub fn flag(self) -> &'static str {
        match self {
            Self::Preset => "--preset",
            Self::CkanVersion => "--ckan-version",
            Self::Extensions => OptionKind::Extension.flag(),
            Self::Features => OptionKind::Feature.flag(),
            Self::SkipInteractive => "--skip-interactive",
            Self::SkipRun => "--skip-run",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        FLAG_ORDER.into_iter().find(|g| g.flag() == flag)
    }

    /// Whether the flag is followed by values rather than standing alone.
    pub fn takes_values(self) -> bool {
        !matches!(self, Self::SkipInteractive | Self::SkipRun)
    }

    /// Whether the flag carries exactly one value.
    pub fn is_single_valued(self) -> bool {
        matches!(self, Self::Preset | Self::CkanVersion)
    }
}

impl fmt::Display for FlagGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Presentation switches that do not belong to the selection itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Prepend [`BOOTSTRAP_SCRIPT`] so the command also downloads the installer.
    #[serde(default)]
    pub download_script: bool,
    /// Pass `--skip-interactive` so the installer asks no questions.
    #[serde(default)]
    pub skip_interactive: bool,
    /// Pass `--skip-run` so the installer does not start CKAN at the end.
    #[serde(default)]
    pub skip_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub flag: FlagGroup,
    pub values: Vec<String>,
}

/// Structured form of a compiled invocation, one entry per emitted group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub groups: Vec<Group>,
}

impl CommandLine {
    pub fn from_configuration(config: &Configuration, options: &CompileOptions) -> Self {
        let preset = PresetLabel::of(config);
        let mut groups = Vec::with_capacity(FLAG_ORDER.len());
        for flag in FLAG_ORDER {
            let values = match flag {
                FlagGroup::Preset => match preset.name() {
                    Some(name) => vec![name.to_owned()],
                    None => continue,
                },
                FlagGroup::CkanVersion => vec![config.ckan_version.to_string()],
                FlagGroup::Extensions | FlagGroup::Features => {
                    let kind = if flag == FlagGroup::Extensions {
                        OptionKind::Extension
                    } else {
                        OptionKind::Feature
                    };
                    if config.selection(kind).is_empty() {
                        continue;
                    }
                    config
                        .ordered(kind)
                        .into_iter()
                        .map(ToString::to_string)
                        .collect()
                }
                FlagGroup::SkipInteractive if options.skip_interactive => Vec::new(),
                FlagGroup::SkipRun if options.skip_run => Vec::new(),
                FlagGroup::SkipInteractive | FlagGroup::SkipRun => continue,
            };
            groups.push(Group { flag, values });
        }
        Self { groups }
    }

    /// The invocation as an argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![PROGRAM.to_owned()];
        for group in &self.groups {
            argv.push(group.flag.flag().to_owned());
            argv.extend(group.values.iter().cloned());
        }
        argv
    }

    pub fn render(&self) -> String {
        let mut out = String::from(PROGRAM);
        for group in &self.groups {
            out.push_str(LINE_CONTINUATION);
            out.push_str(group.flag.flag());
            for value in &group.values {
                out.push(' ');
                out.push_str(value);
            }
        }
        out
    }
}

/// Compile a configuration into the text shown to the user.
pub fn compile(config: &Configuration, options: &CompileOptions) -> String {
    let command = CommandLine::from_configuration(config, options).render();
    trace!("compiled {} bytes for ckan {}", command.len(), config.ckan_version);
    if options.download_script {
        format!("{BOOTSTRAP_SCRIPT}{command}")
    } else {
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstaller_schema::get_preset;

    #[test]
    fn default_preset_compiles_to_preset_and_version() {
        let config = Configuration::default();
        assert_eq!(
            compile(&config, &CompileOptions::default()),
            "./ckan-devstaller \\\n--preset ckan-only \\\n--ckan-version 2.11.3"
        );
    }

    #[test]
    fn dathere_default_lists_groups_in_fixed_order() {
        let config = get_preset("dathere-default").unwrap().configuration();
        assert_eq!(
            compile(&config, &CompileOptions::default()),
            "./ckan-devstaller \\\n\
             --preset dathere-default \\\n\
             --ckan-version 2.11.3 \\\n\
             --extensions ckanext-scheming DataStore DataPusher+ \\\n\
             --features enable-ssh"
        );
    }

    #[test]
    fn custom_selection_has_no_preset_flag() {
        let config = Configuration::new("2.10.8").with_features(["enable-ssh"]);
        let out = compile(&config, &CompileOptions::default());
        assert!(!out.contains("--preset"));
        assert!(!out.contains("--extensions"));
        assert_eq!(
            out,
            "./ckan-devstaller \\\n--ckan-version 2.10.8 \\\n--features enable-ssh"
        );
    }

    #[test]
    fn download_script_is_prepended_verbatim() {
        let config = Configuration::new("2.10.8");
        let options = CompileOptions {
            download_script: true,
            ..CompileOptions::default()
        };
        let out = compile(&config, &options);
        assert!(out.starts_with(BOOTSTRAP_SCRIPT));
        assert_eq!(
            &out[BOOTSTRAP_SCRIPT.len()..],
            compile(&config, &CompileOptions::default())
        );
    }

    #[test]
    fn installer_switches_follow_features() {
        let config = Configuration::new("2.10.8").with_features(["enable-ssh"]);
        let options = CompileOptions {
            skip_interactive: true,
            skip_run: true,
            ..CompileOptions::default()
        };
        assert!(compile(&config, &options).ends_with(
            "--features enable-ssh \\\n--skip-interactive \\\n--skip-run"
        ));
    }

    #[test]
    fn argv_matches_rendered_tokens() {
        let config = get_preset("dathere-default").unwrap().configuration();
        let line = CommandLine::from_configuration(&config, &CompileOptions::default());
        let rendered = line.render().replace(LINE_CONTINUATION, " ");
        let tokens: Vec<&str> = rendered.split(' ').collect();
        assert_eq!(line.argv(), tokens);
    }

    #[test]
    fn unknown_identifiers_follow_known_ones() {
        let config = Configuration::new("2.11.3").with_extensions(["ckanext-dcat", "DataStore"]);
        let out = compile(&config, &CompileOptions::default());
        assert!(out.ends_with("--extensions DataStore ckanext-dcat"));
    }

    #[test]
    fn flag_lookup_covers_every_group() {
        for group in FLAG_ORDER {
            assert_eq!(FlagGroup::from_flag(group.flag()), Some(group));
        }
        assert_eq!(FlagGroup::from_flag("--verbose"), None);
    }
}
