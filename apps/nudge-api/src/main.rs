use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = nudge_api::Args::parse();

	nudge_api::run(args).await
}
