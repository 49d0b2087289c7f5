pub mod worker;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fex_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = fex_cli::VERSION,
	rename_all = "kebab",
	styles = fex_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Run a single backfill pass and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = fex_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.storage.vector_dim).await?;

	let state = worker::WorkerState {
		db,
		embedding: config.providers.embedding,
		batch_size: config.worker.batch_size,
		poll_interval: Duration::from_millis(config.worker.poll_interval_ms),
	};

	if args.once {
		let report = worker::backfill_pass(&state).await?;

		tracing::info!(
			scanned = report.scanned,
			embedded = report.embedded,
			"Embedding backfill pass finished."
		);

		return Ok(());
	}

	worker::run_worker(state).await
}
