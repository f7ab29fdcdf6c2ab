use clap::Parser;
use superuser_api::cli::client::ApiFailure;
use superuser_api::cli::utils::output_error;
use superuser_api::cli::{Cli, OutputFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = superuser_api::cli::run(cli).await {
        let code = e.downcast_ref::<ApiFailure>().and_then(|f| f.code.clone());
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => output_error(&output_format, &e.to_string(), code.as_deref())?,
        }
        std::process::exit(1);
    }

    Ok(())
}
