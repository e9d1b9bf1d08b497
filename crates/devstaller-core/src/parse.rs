//! Reading a compiled invocation back into a configuration.
//!
//! Accepts exactly what the compiler emits (with or without the bootstrap
//! prefix) and also tolerates the same invocation written on one line.

use crate::compile::{CompileOptions, FlagGroup, PROGRAM};
use devstaller_schema::{get_preset, CkanVersion, Configuration, OptionId, PresetLabel};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no ckan-devstaller invocation found")]
    MissingProgram,
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),
    #[error("unexpected argument '{0}' before any flag")]
    UnexpectedArgument(String),
    #[error("{0} requires a value")]
    MissingValue(FlagGroup),
    #[error("{0} does not take the value '{1}'")]
    UnexpectedValue(FlagGroup, String),
    #[error("{0} given more than once")]
    DuplicateFlag(FlagGroup),
    #[error("missing required flag --ckan-version")]
    MissingVersion,
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("--preset {declared} does not describe the selection (derived preset: {derived})")]
    PresetMismatch {
        declared: String,
        derived: PresetLabel,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    pub preset: PresetLabel,
    pub configuration: Configuration,
    pub options: CompileOptions,
}

/// Parse the text produced by [`crate::compile`].
pub fn parse_command(input: &str) -> Result<ParsedCommand, ParseError> {
    let lines = logical_lines(input);
    let position = lines
        .iter()
        .position(|line| line.split_whitespace().next().is_some_and(is_program))
        .ok_or(ParseError::MissingProgram)?;
    let download_script = lines[..position].iter().any(|l| !l.trim().is_empty());

    let groups = collect_groups(lines[position].split_whitespace().skip(1))?;

    let mut version = None;
    let mut declared_preset = None;
    let mut configuration = Configuration::default();
    let mut options = CompileOptions {
        download_script,
        ..CompileOptions::default()
    };
    for (flag, values) in groups {
        match flag {
            FlagGroup::Preset => declared_preset = values.into_iter().next(),
            FlagGroup::CkanVersion => version = values.into_iter().next().map(CkanVersion::new),
            FlagGroup::Extensions => configuration
                .extensions
                .extend(values.into_iter().map(OptionId::new)),
            FlagGroup::Features => configuration
                .features
                .extend(values.into_iter().map(OptionId::new)),
            FlagGroup::SkipInteractive => options.skip_interactive = true,
            FlagGroup::SkipRun => options.skip_run = true,
        }
    }
    configuration.ckan_version = version.ok_or(ParseError::MissingVersion)?;

    let preset = PresetLabel::of(&configuration);
    if let Some(declared) = declared_preset {
        if get_preset(&declared).is_none() {
            return Err(ParseError::UnknownPreset(declared));
        }
        if preset.name() != Some(declared.as_str()) {
            return Err(ParseError::PresetMismatch {
                declared,
                derived: preset,
            });
        }
    }

    Ok(ParsedCommand {
        preset,
        configuration,
        options,
    })
}

fn is_program(token: &str) -> bool {
    let name = PROGRAM.trim_start_matches("./");
    token
        .strip_suffix(name)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('/'))
}

/// Join backslash-continued physical lines into logical lines.
fn logical_lines(input: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for raw in input.lines() {
        let line = raw.trim_end();
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped);
            current.push(' ');
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn collect_groups<'a, I>(tokens: I) -> Result<Vec<(FlagGroup, Vec<String>)>, ParseError>
where
    I: Iterator<Item = &'a str>,
{
    let mut groups: Vec<(FlagGroup, Vec<String>)> = Vec::new();
    for token in tokens {
        if token.starts_with('-') {
            let flag = FlagGroup::from_flag(token)
                .ok_or_else(|| ParseError::UnknownFlag(token.to_owned()))?;
            if groups.iter().any(|(seen, _)| *seen == flag) {
                return Err(ParseError::DuplicateFlag(flag));
            }
            groups.push((flag, Vec::new()));
        } else if let Some((_, values)) = groups.last_mut() {
            values.push(token.to_owned());
        } else {
            return Err(ParseError::UnexpectedArgument(token.to_owned()));
        }
    }

    for (flag, values) in &groups {
        if !flag.takes_values() {
            if let Some(extra) = values.first() {
                return Err(ParseError::UnexpectedValue(*flag, extra.clone()));
            }
        } else if values.is_empty() {
            return Err(ParseError::MissingValue(*flag));
        } else if flag.is_single_valued() && values.len() > 1 {
            return Err(ParseError::UnexpectedValue(*flag, values[1].clone()));
        }
    }
    Ok(groups)
}
