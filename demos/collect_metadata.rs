use anyhow::Result;
use beaapi::{Client, MetadataCollector};
use std::path::Path;

fn main() -> Result<()> {
    // Example program that walks the whole BEA parameter space.
    // Configure the API key via env vars or a `.beaapirc` file.
    env_logger::init();

    let client = Client::from_env()?;
    client.ping()?;

    let collector = MetadataCollector::new();

    // The walk is one remote call per dataset/parameter pair and can run
    // for a while; pressing Enter stops it between calls.
    let cancel = collector.cancel_token();
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = std::io::stdin().read_line(&mut buf);
        cancel.cancel();
    });
    eprintln!("collecting BEA metadata (press Enter to stop)...");

    let snapshot = collector.collect(&client)?;
    let written = snapshot.export_csv(Path::new("bea-metadata"))?;
    eprintln!(
        "wrote {} table(s) for {} dataset(s) under bea-metadata/",
        written.len(),
        snapshot.datasets.len()
    );
    Ok(())
}
