//! Interactive decision example.
//!
//! Workers send each threat to a decision inbox; this example answers from
//! a foreground task while the scan runs in the background, and prints
//! every scan event received over a channel observer.
//!
//! Run with: cargo run --example interactive_decisions

use hashguard::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let workdir = std::env::temp_dir().join(format!("hashguard-ask-{}", std::process::id()));
    std::fs::create_dir_all(&workdir)?;

    let mut known_bad = Vec::new();
    for i in 0..4 {
        let content = format!("sample {i}");
        std::fs::write(workdir.join(format!("sample-{i}.bin")), &content)?;
        known_bad.push(FileHasher::new().digest_bytes(content.as_bytes()));
    }
    let signatures = Arc::new(SignatureSet::from_digests(
        known_bad.iter().map(|d| d.as_str()),
    ));

    let manager = ScanManager::builder()
        .with_quarantine(FilesystemQuarantine::new(workdir.join(".quarantine"))?)
        .with_config(ScanManagerConfig::new().with_workers(2))
        .build()?;

    // Unanswered prompts resolve to Ignore after five seconds
    let (gateway, mut inbox) = DecisionGateway::channel(4);
    let gateway = gateway.with_timeout(Duration::from_secs(5));
    let (observer, mut events) = ChannelObserver::new();

    let task = manager.spawn_scan(&workdir, signatures, Arc::new(observer), gateway);

    // Alternate between deleting and quarantining
    let decider = tokio::spawn(async move {
        let mut n = 0;
        while let Some(request) = inbox.recv().await {
            let decision = if n % 2 == 0 {
                Decision::Delete
            } else {
                Decision::Quarantine
            };
            println!(
                "asked about {} ({}) -> {decision}",
                request.prompt().file_path.display(),
                request.prompt().source_label()
            );
            request.respond(decision);
            n += 1;
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                println!("event: {json}");
            }
        }
    });

    let records = task.join().await?;
    decider.await?;
    printer.await?;

    println!("\n{} threats handled", records.len());
    std::fs::remove_dir_all(&workdir)?;
    Ok(())
}
