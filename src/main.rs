use clap::Parser;
use foodgram::{
    commands::Command,
    telemetry::{get_subscriber, init_subscriber},
};

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("foodgram".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run().await
}
