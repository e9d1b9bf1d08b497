use super::{json_pretty, EXIT_SUCCESS};
use devstaller_schema::{list_presets, DEFAULT_PRESET};

pub fn run(json: bool) -> Result<u8, String> {
    let presets = list_presets();
    if json {
        println!("{}", json_pretty(&presets)?);
        return Ok(EXIT_SUCCESS);
    }
    println!(
        "{:<18} {:<9} {:<48} FEATURES",
        "NAME", "CKAN", "EXTENSIONS"
    );
    for preset in presets {
        let name = if preset.name == DEFAULT_PRESET {
            format!("{} *", preset.name)
        } else {
            preset.name.to_owned()
        };
        println!(
            "{:<18} {:<9} {:<48} {}",
            name,
            preset.ckan_version,
            dash_if_empty(preset.extensions),
            dash_if_empty(preset.features)
        );
    }
    println!();
    println!("* default preset");
    Ok(EXIT_SUCCESS)
}

fn dash_if_empty(ids: &[&str]) -> String {
    if ids.is_empty() {
        "-".to_owned()
    } else {
        ids.join(" ")
    }
}
