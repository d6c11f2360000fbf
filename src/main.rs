use anyhow::Result;
use templar::cli::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args = templar::cli::Args::parse_args();
    let app = App::from_args(&args)?;

    app.run(args).await?;

    Ok(())
}
