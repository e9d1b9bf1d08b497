use devstaller_schema::{get_option, Configuration, OptionKind};

pub const PLAN_HEADER: &str = "The current configuration for ckan-devstaller does the following:";

/// Steps the installer will take for `config`, in the order it takes them:
/// features first, then the CKAN backend and CKAN itself, then extensions.
pub fn describe_plan(config: &Configuration) -> Vec<String> {
    let mut steps = Vec::new();
    push_option_steps(&mut steps, config, OptionKind::Feature);
    steps.push(
        "Install ckan-compose which sets up the CKAN backend (PostgreSQL, SOLR, Redis)".to_owned(),
    );
    steps.push(format!("Install CKAN v{}", config.ckan_version));
    push_option_steps(&mut steps, config, OptionKind::Extension);
    steps
}

fn push_option_steps(steps: &mut Vec<String>, config: &Configuration, kind: OptionKind) {
    for id in config.ordered(kind) {
        match get_option(kind, id) {
            Some(spec) => steps.extend(spec.plan.iter().map(|s| (*s).to_owned())),
            None => match kind {
                OptionKind::Extension => steps.push(format!("Install the {id} extension")),
                OptionKind::Feature => steps.push(format!("Enable the {id} feature")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstaller_schema::get_preset;

    #[test]
    fn ckan_only_plan_installs_backend_and_ckan() {
        let plan = describe_plan(&Configuration::default());
        assert_eq!(plan.len(), 2);
        assert!(plan[0].starts_with("Install ckan-compose"));
        assert_eq!(plan[1], "Install CKAN v2.11.3");
    }

    #[test]
    fn dathere_default_plan_orders_ssh_first_and_datapusher_last() {
        let plan = describe_plan(&get_preset("dathere-default").unwrap().configuration());
        assert_eq!(plan.first().unwrap(), "Install openssh-server to enable SSH access");
        assert_eq!(plan.last().unwrap(), "Disable DRUF mode for DataPusher+");
        assert!(plan.contains(&"Install the DataStore extension".to_owned()));
    }

    #[test]
    fn unknown_options_get_generic_steps() {
        let config = Configuration::new("2.10.8")
            .with_extensions(["ckanext-dcat"])
            .with_features(["enable-mail"]);
        let plan = describe_plan(&config);
        assert_eq!(plan[0], "Enable the enable-mail feature");
        assert_eq!(plan.last().unwrap(), "Install the ckanext-dcat extension");
    }
}
