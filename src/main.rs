use chargechannel::application::callback::CallbackProcessor;
use chargechannel::application::charge::{ChargeRequest, ChargeService};
use chargechannel::config::GatewayConfig;
use chargechannel::domain::channel::ChannelKey;
use chargechannel::domain::order::ExtendParams;
use chargechannel::domain::ports::{AccessorBox, LedgerBox, RecordLedger, RegistryBox};
use chargechannel::infrastructure::in_memory::InMemoryAccessor;
#[cfg(feature = "storage-rocksdb")]
use chargechannel::infrastructure::rocksdb::RocksDBAccessor;
use chargechannel::interfaces::csv::callback_reader::CallbackReader;
use chargechannel::interfaces::csv::record_writer::RecordWriter;
use chargechannel::interfaces::webhook::WebhookRoute;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay recorded provider notifications and print the settlements
    Replay {
        /// CSV file with `channel,order_no,payload` rows
        input: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Create a payment order and print the payment link
    Charge {
        #[arg(long)]
        channel: ChannelKey,

        /// Internal order id the attempt is recorded under
        #[arg(long)]
        id: i64,

        #[arg(long)]
        amount: Decimal,

        /// Overall deadline for creating the order, in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        #[command(flatten)]
        extend: ExtendArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Gateway configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// Payer details; only some channels need them.
#[derive(Args)]
struct ExtendArgs {
    #[arg(long)]
    pay_code: Option<i64>,

    #[arg(long)]
    user_id: Option<i64>,

    #[arg(long)]
    user_ip: Option<String>,

    #[arg(long)]
    success_url: Option<String>,
}

impl ExtendArgs {
    fn into_params(self) -> Option<ExtendParams> {
        let success_url = self.success_url?;
        Some(ExtendParams {
            pay_code: self.pay_code.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
            user_ip: self.user_ip.unwrap_or_default(),
            success_url,
        })
    }
}

fn shared<T: RecordLedger + 'static>(ledger: T) -> (AccessorBox, LedgerBox) {
    let ledger = Arc::new(ledger);
    let accessor: AccessorBox = ledger.clone();
    let ledger: LedgerBox = ledger;
    (accessor, ledger)
}

fn open_ledger(db_path: Option<PathBuf>) -> Result<(AccessorBox, LedgerBox)> {
    if let Some(db_path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            return Ok(shared(RocksDBAccessor::open(db_path).into_diagnostic()?));
        }

        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(shared(InMemoryAccessor::new()))
}

fn load_registry(config: &GatewayConfig) -> Result<RegistryBox> {
    Ok(Arc::new(config.build_registry().into_diagnostic()?))
}

async fn replay(input: PathBuf, common: CommonArgs) -> Result<()> {
    let config = GatewayConfig::from_path(&common.config).into_diagnostic()?;
    let registry = load_registry(&config)?;
    let (accessor, ledger) = open_ledger(common.db_path)?;
    let processor = CallbackProcessor::new(registry, accessor).with_labels(config.labels());

    let file = File::open(input).into_diagnostic()?;
    for record in CallbackReader::new(file).callbacks() {
        match record {
            Ok(record) => {
                let route = WebhookRoute::for_channel(record.channel, &record.order_no);
                match route.deliver(&processor, record.payload.as_bytes()).await {
                    Ok(reply) => {
                        if let Some(e) = reply.error() {
                            eprintln!("Rejected callback for order {}: {}", record.order_no, e);
                        }
                    }
                    Err(e) => {
                        eprintln!("Error processing callback: {}", e);
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading callback: {}", e);
            }
        }
    }

    let settlements = ledger.settlements().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    writer.write_settlements(&settlements).into_diagnostic()?;

    Ok(())
}

async fn charge(request: ChargeRequest, common: CommonArgs) -> Result<()> {
    let config = GatewayConfig::from_path(&common.config).into_diagnostic()?;
    let registry = load_registry(&config)?;
    let (accessor, ledger) = open_ledger(common.db_path)?;
    let service = ChargeService::new(registry, accessor, config.callback_base_url.clone());

    let result = service.charge(request).await;
    if let Ok(receipt) = &result {
        println!("order_no: {}", receipt.order_number);
        println!("link: {}", receipt.link.as_str());
    }

    let attempts = ledger.attempts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    writer.write_attempts(&attempts).into_diagnostic()?;

    result.map(|_| ()).into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Replay { input, common } => replay(input, common).await,
        Command::Charge {
            channel,
            id,
            amount,
            deadline_secs,
            extend,
            common,
        } => {
            let request = ChargeRequest {
                internal_id: id,
                amount,
                channel,
                extend: extend.into_params(),
                deadline: deadline_secs.map(Duration::from_secs),
            };
            charge(request, common).await
        }
    }
}
