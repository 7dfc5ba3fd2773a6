//! Loader tool: publishes preprocessed road-network artifacts into shared
//! memory for the query-serving process.

use clap::{App, Arg};
use log::{error, info};
use roadstore::{ArtifactPaths, Publisher, Result, StoreError};
use std::path::PathBuf;

fn main() {
    env_logger::init();

    // Recoverable failures are logged and exit cleanly; bad input is a
    // one-shot batch failure, not a crash.
    if let Err(e) = run() {
        error!("publish cycle aborted: {}", e);
    }
}

fn run() -> Result<()> {
    let matches = App::new("roadstore-loader")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Publishes road-network artifacts into a shared-memory region")
        .arg(
            Arg::with_name("base")
                .value_name("BASE")
                .help("Common stem of the artifact files (BASE.hsgr, BASE.ramIndex, ...)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("shm-dir")
                .long("shm-dir")
                .value_name("DIR")
                .help("Directory for the shared regions (default /dev/shm)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("timestamp")
                .long("timestamp")
                .value_name("FILE")
                .help("Override the timestamp file path")
                .takes_value(true),
        )
        .get_matches();

    let base = matches
        .value_of("base")
        .ok_or_else(|| StoreError::config("no artifact base path given"))?;
    let shm_dir = matches
        .value_of("shm-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(roadstore::memory::DEFAULT_REGION_DIR));

    let mut paths = ArtifactPaths::from_base(base);
    if let Some(ts) = matches.value_of("timestamp") {
        paths.timestamp = Some(PathBuf::from(ts));
    }

    info!("checking input parameters");
    let mut publisher = Publisher::new(&shm_dir)?;
    let generation = publisher.publish(&paths)?;
    info!("all data loaded, generation {} is live", generation);
    // file-backed names keep the generation resolvable after exit
    info!("regions persist under {}", shm_dir.display());
    Ok(())
}
