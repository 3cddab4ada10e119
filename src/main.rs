//! romdb daemon entry point.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use romdb::cli::Cli;
use romdb::loader::Loader;
use romdb::observability::Logger;
use romdb::reload::Coordinator;
use romdb::server::{self, Network};
use romdb::storage::JsonStorage;
use romdb::watcher;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let logger = Arc::new(Logger::stderr(cli.log_level.into()));

    let loader = match Loader::new(&cli.basedir, cli.filename.clone()) {
        Ok(loader) => loader,
        Err(e) => {
            logger.fatal("ROMDB_LOADER_INIT_FAILED", &[("error", &e.to_string())]);
            process::exit(1);
        }
    };

    let storage = Arc::new(JsonStorage::new(cli.gzipped));
    let mut coordinator = Coordinator::new(loader, storage.clone(), logger.clone());
    coordinator.install_existing().await;

    let cancel = CancellationToken::new();
    let events = watcher::start(
        cli.file.clone(),
        Duration::from_millis(cli.poll_interval_ms),
        logger.clone(),
        cancel.clone(),
    );
    tokio::spawn(coordinator.run(events));

    let network: Network = cli.network.into();
    if let Err(e) = server::serve(network, &cli.addr, storage, logger.clone()).await {
        logger.fatal("ROMDB_SERVER_LISTEN_FAILED", &[("error", &e.to_string())]);
        cancel.cancel();
        process::exit(1);
    }
}
