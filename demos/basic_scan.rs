//! Basic scan example demonstrating a directory scan.
//!
//! This example shows how to:
//! - Load a signature set
//! - Build a ScanManager with a reputation service and quarantine
//! - Scan a directory and inspect the threat records
//!
//! Run with: cargo run --example basic_scan

use hashguard::prelude::*;
use hashguard::signatures::EICAR_MD5;
use std::sync::Arc;

const EICAR: &[u8] = br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Hashguard Basic Scan Example ===\n");

    // A throwaway directory with one clean file, the EICAR test file and a
    // file that only the (mock) reputation service knows about.
    let workdir = std::env::temp_dir().join(format!("hashguard-demo-{}", std::process::id()));
    let scan_dir = workdir.join("downloads");
    std::fs::create_dir_all(&scan_dir)?;
    std::fs::write(scan_dir.join("notes.txt"), b"Just some notes.")?;
    std::fs::write(scan_dir.join("eicar.com"), EICAR)?;
    std::fs::write(scan_dir.join("invoice.pdf.exe"), b"pretend dropper")?;

    let signatures = Arc::new(SignatureSet::from_digests([EICAR_MD5]));

    // The mock service flags the dropper as known-bad on three engines
    let dropper = FileHasher::new().digest_bytes(b"pretend dropper");
    let reputation = MockReputation::new().with_response(
        dropper.as_str(),
        LookupOutcome::Known {
            malicious: 3,
            suspicious: 1,
        },
    );

    let quarantine = FilesystemQuarantine::new(workdir.join("quarantine"))?;

    let manager = ScanManager::builder()
        .with_reputation(reputation)
        .with_quarantine(quarantine.clone())
        .build()?;

    let observer = FnObserver::new(|index, total, path: &std::path::Path| {
        println!("[{index}/{total}] {}", path.display());
    });

    let records = manager
        .scan(
            &scan_dir,
            signatures,
            Arc::new(observer),
            &DecisionGateway::fixed(Decision::Quarantine),
        )
        .await;

    println!("\n=== Scan Results ===");
    for record in &records {
        println!(
            "{} [{}] -> {} (applied: {})",
            record.file_path.display(),
            record.source,
            record.decision,
            record.action_applied
        );
    }

    println!("\n=== Quarantine ===");
    for entry in quarantine.list().await? {
        println!("{}  {}", entry.id, entry.display_name());
        quarantine.purge(&entry.id).await?;
    }

    std::fs::remove_dir_all(&workdir)?;
    println!("\n=== Example Complete ===");
    Ok(())
}
