use clap::Subcommand;
use focusflow_core::{Config, CoreError, Database, SessionStore};
use serde_json::json;

#[derive(Subcommand)]
pub enum SessionAction {
    /// List custom sessions
    List {
        /// Owner id (defaults to `owner_id` from config)
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show one custom session
    Show {
        /// Session id
        id: String,
    },
}

pub fn run(action: SessionAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::List { owner } => {
            let owner = owner.unwrap_or_else(|| config.owner_id.clone());
            let rows: Vec<_> = db
                .list(&owner)?
                .into_iter()
                .map(|s| {
                    json!({
                        "id": s.id,
                        "name": s.name,
                        "intervals": s.intervals.len(),
                        "total_secs": s.total_duration_secs(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        SessionAction::Show { id } => {
            let session = db
                .get(&id)?
                .ok_or(CoreError::SessionNotFound { session_id: id })?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
    }
    Ok(())
}
