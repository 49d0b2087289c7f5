use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = fex_api::Args::parse();

	fex_api::run(args).await
}
