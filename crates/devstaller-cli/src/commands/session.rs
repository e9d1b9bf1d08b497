//! Line-oriented builder session: one action per line on stdin, the
//! recompiled command after every accepted action.

use super::{EXIT_CONFLICT, EXIT_INPUT_ERROR, EXIT_SUCCESS};
use devstaller_core::{describe_plan, CompileOptions, ConfigStore, SelectionMode, PLAN_HEADER};
use devstaller_schema::{validate_identifier, validate_version, CkanVersion, OptionId, OptionKind};
use std::io::{BufRead, Write};
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Preset(&'a str),
    Version(CkanVersion),
    Toggle(OptionKind, OptionId),
    Add(OptionKind, Vec<OptionId>),
    Script(bool),
    SkipInteractive(bool),
    SkipRun(bool),
    Show,
    Plan,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Changed,
    Printed,
}

fn parse_line(line: &str) -> Result<Option<Line<'_>>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let parsed = match verb {
        "preset" => Line::Preset(single(verb, &args, "a preset name")?),
        "version" => {
            let value = single(verb, &args, "a version")?;
            Line::Version(validate_version(value).map_err(|e| e.to_string())?)
        }
        "extension" => {
            let value = single(verb, &args, "an extension id")?;
            Line::Toggle(OptionKind::Extension, identifier(OptionKind::Extension, value)?)
        }
        "feature" => {
            let value = single(verb, &args, "a feature id")?;
            Line::Toggle(OptionKind::Feature, identifier(OptionKind::Feature, value)?)
        }
        "add-extensions" | "add-features" if args.is_empty() => {
            return Err(format!("'{verb}' requires at least one id"));
        }
        "add-extensions" => {
            Line::Add(OptionKind::Extension, identifiers(OptionKind::Extension, &args)?)
        }
        "add-features" => Line::Add(OptionKind::Feature, identifiers(OptionKind::Feature, &args)?),
        "script" => Line::Script(switch(verb, &args)?),
        "skip-interactive" => Line::SkipInteractive(switch(verb, &args)?),
        "skip-run" => Line::SkipRun(switch(verb, &args)?),
        "show" if args.is_empty() => Line::Show,
        "plan" if args.is_empty() => Line::Plan,
        "show" | "plan" => return Err(format!("'{verb}' takes no arguments")),
        other => return Err(format!("unknown action '{other}'")),
    };
    Ok(Some(parsed))
}

fn single<'a>(verb: &str, args: &[&'a str], what: &str) -> Result<&'a str, String> {
    match args {
        [value] => Ok(*value),
        [] => Err(format!("'{verb}' requires {what}")),
        _ => Err(format!("'{verb}' takes exactly one {what}")),
    }
}

fn identifier(kind: OptionKind, value: &str) -> Result<OptionId, String> {
    validate_identifier(kind, value).map_err(|e| e.to_string())
}

fn identifiers(kind: OptionKind, values: &[&str]) -> Result<Vec<OptionId>, String> {
    values.iter().map(|value| identifier(kind, value)).collect()
}

fn switch(verb: &str, args: &[&str]) -> Result<bool, String> {
    match args {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(format!("'{verb}' expects 'on' or 'off'")),
    }
}

struct Session {
    store: ConfigStore,
    options: CompileOptions,
}

impl Session {
    fn apply(&mut self, line: Line<'_>, out: &mut impl Write) -> Result<Outcome, String> {
        match line {
            Line::Preset(name) => self.store.select_preset(name).map_err(|e| e.to_string())?,
            Line::Version(version) => self.store.set_version(version),
            Line::Toggle(kind, id) => self.store.toggle(kind, id).map_err(|e| e.to_string())?,
            Line::Add(OptionKind::Extension, ids) => self
                .store
                .set_extensions(ids, SelectionMode::Add)
                .map_err(|e| e.to_string())?,
            Line::Add(OptionKind::Feature, ids) => self
                .store
                .set_features(ids, SelectionMode::Add)
                .map_err(|e| e.to_string())?,
            Line::Script(on) => self.options.download_script = on,
            Line::SkipInteractive(on) => self.options.skip_interactive = on,
            Line::SkipRun(on) => self.options.skip_run = on,
            Line::Show => {
                self.print_command(out, false)?;
                return Ok(Outcome::Printed);
            }
            Line::Plan => {
                writeln!(out, "{PLAN_HEADER}").map_err(io_err)?;
                for step in describe_plan(self.store.configuration()) {
                    writeln!(out, "  - {step}").map_err(io_err)?;
                }
                return Ok(Outcome::Printed);
            }
        }
        Ok(Outcome::Changed)
    }

    fn print_command(&self, out: &mut impl Write, json: bool) -> Result<(), String> {
        if json {
            let payload = serde_json::json!({
                "snapshot": self.store.snapshot(),
                "command": self.store.compile(&self.options),
            });
            let line = serde_json::to_string(&payload)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            writeln!(out, "{line}").map_err(io_err)
        } else {
            writeln!(out, "# preset: {}", self.store.preset()).map_err(io_err)?;
            writeln!(out, "{}", self.store.compile(&self.options)).map_err(io_err)
        }
    }
}

fn io_err(e: std::io::Error) -> String {
    format!("write failed: {e}")
}

/// Drive a session over arbitrary streams. Returns the exit code: conflicts
/// outrank syntax errors, and a clean run is success.
pub fn run_with<R: BufRead, W: Write, E: Write>(
    input: R,
    out: &mut W,
    err: &mut E,
    json: bool,
) -> Result<u8, String> {
    let mut session = Session {
        store: ConfigStore::new(),
        options: CompileOptions::default(),
    };
    let mut rejected = false;
    let mut malformed = false;

    for (index, line) in input.lines().enumerate() {
        let number = index + 1;
        let line = line.map_err(|e| format!("failed to read stdin: {e}"))?;
        let parsed = match parse_line(&line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(msg) => {
                malformed = true;
                writeln!(err, "error: line {number}: {msg}").map_err(io_err)?;
                continue;
            }
        };
        match session.apply(parsed, out) {
            Ok(Outcome::Changed) => session.print_command(out, json)?,
            Ok(Outcome::Printed) => {}
            Err(msg) => {
                debug!("line {number} rejected: {msg}");
                rejected = true;
                writeln!(err, "error: line {number}: {msg}").map_err(io_err)?;
            }
        }
    }

    Ok(if rejected {
        EXIT_CONFLICT
    } else if malformed {
        EXIT_INPUT_ERROR
    } else {
        EXIT_SUCCESS
    })
}

pub fn run(json: bool) -> Result<u8, String> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    run_with(stdin.lock(), &mut stdout.lock(), &mut stderr.lock(), json)
}
