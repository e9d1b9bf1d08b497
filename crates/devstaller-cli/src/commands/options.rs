use super::{json_pretty, EXIT_SUCCESS};
use devstaller_schema::{list_options, OptionKind};

pub fn run(json: bool) -> Result<u8, String> {
    if json {
        let payload: serde_json::Map<String, serde_json::Value> = OptionKind::ALL
            .iter()
            .map(|kind| {
                let specs: Vec<_> = list_options(*kind).collect();
                let value = serde_json::to_value(specs)
                    .map_err(|e| format!("JSON serialization failed: {e}"))?;
                Ok((format!("{kind}s"), value))
            })
            .collect::<Result<_, String>>()?;
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("{:<10} {:<18} {:<32} DESCRIPTION", "KIND", "ID", "REQUIRES");
    for kind in OptionKind::ALL {
        for spec in list_options(kind) {
            let requires = if spec.requires.is_empty() {
                "-".to_owned()
            } else {
                spec.requires.join(", ")
            };
            println!(
                "{:<10} {:<18} {:<32} {}",
                kind, spec.id, requires, spec.description
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
