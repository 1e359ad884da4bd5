use anyhow::Result;
use clap::Parser;

use parley_cli::app::App;
use parley_cli::config::Settings;
use parley_cli::persona::Persona;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Streaming terminal chat for a remote completion endpoint", long_about = None)]
struct Cli {
    /// Completion endpoint base URL (overrides the configured value)
    #[arg(long)]
    endpoint: Option<String>,

    /// Persona used to seed a new conversation
    #[arg(long)]
    persona: Option<String>,

    /// Verbose logging (same as RUST_LOG=parley_cli=debug)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "parley_cli=debug"
    } else {
        "parley_cli=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = color_eyre::install() {
        eprintln!("failed to install error reporting: {err}");
    }
    init_tracing(cli.verbose);

    let mut settings = Settings::load_or_default();
    if let Some(endpoint) = cli.endpoint {
        settings.api_url = endpoint;
    }
    if let Some(name) = cli.persona.as_deref() {
        match Persona::from_name(name) {
            Some(persona) => settings.persona = persona,
            None => anyhow::bail!(
                "unknown persona: {name} (expected one of: {})",
                Persona::all()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    let mut app = App::new(settings)?;
    app.run().await
}
