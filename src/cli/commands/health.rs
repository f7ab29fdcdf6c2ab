use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, str_field};
use crate::cli::OutputFormat;

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let response = client.get("/health").await?;
    let data = response.get("data").cloned().unwrap_or(Value::Null);

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            &format!("{} is healthy", client.base_url()),
            Some(response),
        ),
        OutputFormat::Text => {
            println!("Server:   {}", client.base_url());
            println!("Status:   {}", str_field(&data, "status"));
            println!("Database: {}", str_field(&data, "database"));
            Ok(())
        }
    }
}
