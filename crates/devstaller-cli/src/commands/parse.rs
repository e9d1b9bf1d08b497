use super::{colorize_preset, join_ids, json_pretty, EXIT_SUCCESS};
use devstaller_core::{describe_plan, parse_command, CoreError, PLAN_HEADER};
use devstaller_schema::OptionKind;
use std::io::Read;
use tracing::warn;

fn read_input(command: Option<&str>) -> Result<String, String> {
    match command {
        Some(text) if text != "-" => Ok(text.to_owned()),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

pub fn run(command: Option<&str>, json: bool) -> Result<u8, String> {
    let input = read_input(command)?;
    let parsed = parse_command(&input).map_err(|e| CoreError::from(e).to_string())?;
    let config = &parsed.configuration;

    let unmet = config.unmet_requirements();
    for req in &unmet {
        warn!(
            "the {} {} requires {}, which is not selected",
            req.dependent, req.kind, req.required
        );
    }

    if json {
        let payload = serde_json::json!({
            "preset": parsed.preset,
            "ckan_version": config.ckan_version,
            "extensions": config.ordered(OptionKind::Extension),
            "features": config.ordered(OptionKind::Feature),
            "options": parsed.options,
            "unmet_requirements": unmet,
            "plan": describe_plan(config),
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("preset:           {}", colorize_preset(parsed.preset));
    println!("ckan version:     {}", config.ckan_version);
    println!(
        "extensions:       {}",
        join_ids(&config.ordered(OptionKind::Extension))
    );
    println!(
        "features:         {}",
        join_ids(&config.ordered(OptionKind::Feature))
    );
    println!("download script:  {}", yes_no(parsed.options.download_script));
    println!("skip interactive: {}", yes_no(parsed.options.skip_interactive));
    println!("skip run:         {}", yes_no(parsed.options.skip_run));
    println!();
    println!("{PLAN_HEADER}");
    for step in describe_plan(config) {
        println!("  - {step}");
    }
    Ok(EXIT_SUCCESS)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_text_is_used_verbatim() {
        assert_eq!(read_input(Some("./ckan-devstaller")).unwrap(), "./ckan-devstaller");
    }

    #[test]
    fn parse_errors_carry_input_prefix() {
        let err = run(Some("./ckan-devstaller --bogus"), true).unwrap_err();
        assert!(err.starts_with("command parse error:"), "{err}");
        assert!(err.contains("--bogus"));
    }
}
