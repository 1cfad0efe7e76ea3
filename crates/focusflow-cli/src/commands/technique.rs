use clap::Subcommand;
use focusflow_core::{Config, Technique};
use serde_json::json;

#[derive(Subcommand)]
pub enum TechniqueAction {
    /// List techniques with their work/rest durations
    List,
}

pub fn run(action: TechniqueAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TechniqueAction::List => {
            let table = config.technique_table();
            let rows: Vec<_> = Technique::ALL
                .iter()
                .map(|technique| match table.get(*technique) {
                    Some(d) => json!({
                        "technique": technique,
                        "work_secs": d.work_secs,
                        "rest_secs": d.rest_secs,
                    }),
                    None => json!({
                        "technique": technique,
                        "work_secs": null,
                        "rest_secs": null,
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
