use clap::{Parser, Subcommand};
use citizen_core::{
    host_for, CallerAttributes, InMemoryLedger, RecordVariant, ResponseStatus, ServiceConfig,
    Snapshot,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_LEDGER_FILE: &str = "citizen-ledger.json";

#[derive(Parser)]
#[command(name = "citizen")]
#[command(about = "Citizen records CLI over a file-backed ledger")]
struct Cli {
    /// Ledger snapshot file (default: $CITIZEN_LEDGER_FILE or ./citizen-ledger.json)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,
    /// YAML service configuration (default: $CITIZEN_CONFIG or a health deployment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the ledger with an empty registry and credentials
    Init {
        /// Alternating credential names and values
        #[arg(required = true)]
        credentials: Vec<String>,
    },
    /// Run a mutating operation and save the ledger
    Invoke {
        #[command(flatten)]
        call: Call,
    },
    /// Run a read-only operation
    Query {
        #[command(flatten)]
        call: Call,
    },
    /// List the keys stored in the ledger
    List,
}

#[derive(clap::Args)]
struct Call {
    /// Operation name, current or legacy
    operation: String,
    /// Positional arguments
    args: Vec<String>,
    /// Caller username
    #[arg(long)]
    user: String,
    /// Caller role attribute
    #[arg(long)]
    role: String,
}

impl Call {
    fn caller(&self) -> CallerAttributes {
        CallerAttributes::new()
            .with("username", self.user.as_str())
            .with("role", self.role.as_str())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("citizen=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    run(cli, &mut stdout)
}

fn run(cli: Cli, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    let ledger_path = cli
        .ledger
        .or_else(|| std::env::var_os("CITIZEN_LEDGER_FILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE));
    let config = match cli
        .config
        .or_else(|| std::env::var_os("CITIZEN_CONFIG").map(PathBuf::from))
    {
        Some(path) => ServiceConfig::load(&path)?,
        None => ServiceConfig::for_variant(RecordVariant::Health),
    };

    let ledger = InMemoryLedger::from_snapshot(Snapshot::read_from(&ledger_path)?);
    let host = host_for(Arc::new(config), ledger)?;

    match cli.command {
        Some(Commands::Init { credentials }) => {
            host.initialise(&credentials)?;
            save(&host.snapshot()?, &ledger_path)?;
            writeln!(
                out,
                "Initialised ledger at {} with {} credential(s)",
                ledger_path.display(),
                credentials.len() / 2
            )?;
        }
        Some(Commands::Invoke { call }) => {
            let response = host.invoke(&call.caller(), &call.operation, &call.args)?;
            save(&host.snapshot()?, &ledger_path)?;
            if !response.payload.is_empty() {
                writeln!(out, "{}", response.payload_text())?;
            }
        }
        Some(Commands::Query { call }) => {
            let response = host.query(&call.caller(), &call.operation, &call.args)?;
            writeln!(out, "{}", response.payload_text())?;
            if response.status == ResponseStatus::NotUnique {
                writeln!(out, "(not unique)")?;
            }
        }
        Some(Commands::List) => {
            let snapshot = host.snapshot()?;
            if snapshot.is_empty() {
                writeln!(out, "No keys found.")?;
            } else {
                for key in snapshot.keys() {
                    writeln!(out, "{key}")?;
                }
            }
        }
        None => {
            writeln!(out, "No command given. Use --help for usage.")?;
        }
    }
    Ok(())
}

fn save(snapshot: &Snapshot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    snapshot.write_to(path)?;
    Ok(())
}
