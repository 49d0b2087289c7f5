use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = fex_worker::Args::parse();

	fex_worker::run(args).await
}
