use std::path::PathBuf;

use clap::Subcommand;

use crate::{config::Config, startup::Application};

pub mod import;

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve,
    /// Load ingredients from a JSON or CSV file.
    ImportIngredients { file: PathBuf },
    /// Load tags from a JSON or CSV file.
    ImportTags { file: PathBuf },
}

impl Default for Command {
    fn default() -> Self {
        Self::Serve
    }
}

impl Command {
    pub async fn run(&self) -> Result<(), anyhow::Error> {
        let config = Config::new()?;

        match &self {
            Command::Serve => serve(config).await,
            Command::ImportIngredients { file } => {
                let inserted = import::import_ingredients(config, file).await?;
                println!("Imported {} ingredients", inserted);
                Ok(())
            }
            Command::ImportTags { file } => {
                let inserted = import::import_tags(config, file).await?;
                println!("Imported {} tags", inserted);
                Ok(())
            }
        }
    }
}

async fn serve(config: Config) -> Result<(), anyhow::Error> {
    let application = Application::build(config).await?;

    tracing::info!(
        "Started at http://{}:{}",
        application.host(),
        application.port()
    );

    application.run_until_stopped().await?;

    Ok(())
}
