use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hashguard::core::ArcReputation;
use hashguard::prelude::*;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "hashguard.yaml";

#[derive(Parser)]
#[command(name = "hashguard")]
#[command(about = "Hash-based malware scanner with quarantine", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./hashguard.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a file or directory
    Scan {
        /// File or directory to scan
        target: PathBuf,

        /// Signature file, overriding the settings
        #[arg(short, long)]
        signatures: Option<PathBuf>,

        /// Number of workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// How threats are handled
        #[arg(short, long, value_enum, default_value = "ask")]
        decision: DecisionMode,

        /// Skip reputation lookups
        #[arg(long)]
        offline: bool,

        /// Upload files unknown to the reputation service
        #[arg(long)]
        submit_unknown: bool,

        /// Print threat records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage quarantined files
    Quarantine {
        #[command(subcommand)]
        action: QuarantineCommand,
    },
}

#[derive(Subcommand)]
enum QuarantineCommand {
    /// List quarantined files
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a quarantined file back
    Restore {
        /// Quarantine id
        id: String,
    },

    /// Permanently delete a quarantined file
    Purge {
        /// Quarantine id
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionMode {
    /// Prompt on the terminal for every threat
    Ask,
    Delete,
    Quarantine,
    Ignore,
}

/// Prints threats and the summary as they happen.
struct ConsoleObserver;

impl ScanObserver for ConsoleObserver {
    fn on_progress(&self, index: usize, total: usize, path: &Path) {
        tracing::debug!(index, total, file = %path.display(), "Scanning");
    }

    fn on_threat(&self, record: &ThreatRecord) {
        let counts = match (record.malicious, record.suspicious) {
            (Some(m), Some(s)) => format!(" malicious={m} suspicious={s}"),
            _ => String::new(),
        };
        println!(
            "THREAT {} [{}]{} -> {}{}",
            record.file_path.display(),
            record.source,
            counts,
            record.decision,
            if record.decision.is_destructive() && !record.action_applied {
                " (failed)"
            } else {
                ""
            }
        );
    }

    fn on_complete(&self, summary: &ScanSummary) {
        match &summary.termination {
            ScanTermination::Aborted(reason) => eprintln!("Scan aborted: {reason}"),
            termination => eprintln!(
                "Scan {}: {}/{} files, {} threats in {:.2}s",
                if matches!(termination, ScanTermination::Stopped) {
                    "stopped"
                } else {
                    "completed"
                },
                summary.processed,
                summary.total_files,
                summary.threats,
                summary.elapsed.as_secs_f64()
            ),
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Settings::load(DEFAULT_CONFIG).context("loading default settings")
        }
        None => {
            let mut settings = Settings::default();
            settings.apply_env();
            Ok(settings)
        }
    }
}

/// Answers decision requests from the terminal on a blocking thread.
fn spawn_prompt(mut inbox: DecisionInbox) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        while let Some(request) = inbox.blocking_recv() {
            if request.is_cancelled() {
                continue;
            }
            let decision = ask_terminal(request.prompt(), &mut stdin.lock());
            if !request.respond(decision) {
                eprintln!("Decision arrived too late; file was left untouched");
            }
        }
    });
}

fn ask_terminal(prompt: &ThreatPrompt, input: &mut impl BufRead) -> Decision {
    let detail = match prompt.verdict {
        Verdict::RemoteMatch {
            malicious,
            suspicious,
        } => format!(" ({malicious} malicious, {suspicious} suspicious)"),
        Verdict::LookupFailed => " (lookup failed)".to_string(),
        _ => String::new(),
    };

    loop {
        print!(
            "\nThreat found by {}{}:\n  {}\n  [1] delete  [2] quarantine  [3] ignore > ",
            prompt.source_label(),
            detail,
            prompt.file_path.display()
        );
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return Decision::Ignore,
            Ok(_) => match line.parse::<Decision>() {
                Ok(decision) => return decision,
                Err(e) => eprintln!("{e}"),
            },
        }
    }
}

fn build_reputation(settings: &Settings, offline: bool) -> Result<Option<ArcReputation>> {
    if offline {
        return Ok(None);
    }

    #[cfg(feature = "virustotal")]
    {
        if let Some(config) = settings.virustotal_config() {
            let client: ArcReputation = Arc::new(
                hashguard::backends::VirusTotalClient::new(config)
                    .context("creating VirusTotal client")?,
            );
            return Ok(Some(client));
        }
    }

    #[cfg(not(feature = "virustotal"))]
    let _ = settings;

    Ok(None)
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    settings: Settings,
    target: PathBuf,
    signatures: Option<PathBuf>,
    workers: Option<usize>,
    mode: DecisionMode,
    offline: bool,
    submit_unknown: bool,
    json: bool,
) -> Result<ExitCode> {
    let mut settings = settings;
    if submit_unknown {
        settings.reputation.submit_unknown = true;
    }
    let signatures = Arc::new(SignatureSet::load(
        signatures.as_deref().unwrap_or(&settings.signatures),
    ));

    let mut config = settings.scan_config();
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }

    let mut builder = ScanManager::builder()
        .with_config(config)
        .with_quarantine(settings.quarantine_store()?);
    if let Some(reputation) = build_reputation(&settings, offline)? {
        builder = builder.with_arc_reputation(reputation);
    }
    let manager = builder.build()?;

    let gateway = match mode {
        DecisionMode::Ask => {
            let (gateway, inbox) = DecisionGateway::channel(1);
            spawn_prompt(inbox);
            gateway
        }
        DecisionMode::Delete => DecisionGateway::fixed(Decision::Delete),
        DecisionMode::Quarantine => DecisionGateway::fixed(Decision::Quarantine),
        DecisionMode::Ignore => DecisionGateway::fixed(Decision::Ignore),
    };

    let task = manager.spawn_scan(target, signatures, Arc::new(ConsoleObserver), gateway);
    let stop = task.stop_signal().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nStopping after in-flight files...");
            stop.stop();
        }
    });

    let records = task.join().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(if records.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

async fn run_quarantine(settings: &Settings, action: QuarantineCommand) -> Result<()> {
    let store = settings.quarantine_store()?;

    match action {
        QuarantineCommand::List { json } => {
            let entries = store.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("Quarantine is empty");
            } else {
                for entry in &entries {
                    println!(
                        "{}  {}  {:>10}  {}",
                        entry.id,
                        entry.quarantined_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.size,
                        entry
                            .original_path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| entry.display_name().to_string())
                    );
                }
            }
        }
        QuarantineCommand::Restore { id } => {
            let id = parse_id(&id)?;
            let destination = store.restore(&id).await?;
            println!("Restored to {}", destination.display());
        }
        QuarantineCommand::Purge { id } => {
            let id = parse_id(&id)?;
            store.purge(&id).await?;
            println!("Purged {id}");
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<QuarantineId> {
    match QuarantineId::parse(raw) {
        Some(id) => Ok(id),
        None => bail!("'{raw}' is not a quarantine id"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            target,
            signatures,
            workers,
            decision,
            offline,
            submit_unknown,
            json,
        } => {
            run_scan(
                settings,
                target,
                signatures,
                workers,
                decision,
                offline,
                submit_unknown,
                json,
            )
            .await
        }
        Commands::Quarantine { action } => {
            run_quarantine(&settings, action).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
