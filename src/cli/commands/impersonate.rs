use clap::Subcommand;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_empty_collection, output_success, print_user, str_field};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ImpersonateCommands {
    #[command(about = "Start impersonating a business user")]
    Start {
        #[arg(help = "Id of the user to impersonate")]
        target_id: Uuid,
    },

    #[command(about = "End an impersonation grant")]
    Revert {
        #[arg(help = "Impersonation token returned by `start`")]
        impersonation_token: String,
    },

    #[command(about = "Show the state of an impersonation grant")]
    Status {
        #[arg(help = "Impersonation token returned by `start`")]
        impersonation_token: Option<String>,
    },

    #[command(about = "List active businesses and their impersonable users")]
    Businesses,
}

pub async fn handle(
    cmd: ImpersonateCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    client.require_token()?;

    match cmd {
        ImpersonateCommands::Start { target_id } => {
            let response = client
                .post(&format!("/api/impersonate/{}", target_id), None)
                .await?;
            let message = str_field(&response, "message").to_string();

            match output_format {
                OutputFormat::Json => output_success(&output_format, &message, Some(response)),
                OutputFormat::Text => {
                    println!("✓ {}", message);
                    if let Some(target) = response.get("target_user") {
                        print_user("Target", target);
                    }
                    println!("Impersonation token: {}", str_field(&response, "impersonation_token"));
                    println!("API token:           {}", str_field(&response, "api_token"));
                    println!("Expires at:          {}", str_field(&response, "expires_at"));
                    Ok(())
                }
            }
        }
        ImpersonateCommands::Revert { impersonation_token } => {
            let response = client
                .post(
                    "/api/impersonate/revert",
                    Some(json!({ "impersonation_token": impersonation_token })),
                )
                .await?;
            let message = str_field(&response, "message").to_string();

            match output_format {
                OutputFormat::Json => output_success(&output_format, &message, Some(response)),
                OutputFormat::Text => {
                    println!("✓ {}", message);
                    if let Some(original) = response.get("original_user") {
                        print_user("Back to", original);
                    }
                    Ok(())
                }
            }
        }
        ImpersonateCommands::Status { impersonation_token } => {
            let response = match impersonation_token.as_deref() {
                Some(token) => {
                    client
                        .get_with_query("/api/impersonate/status", &[("impersonation_token", token)])
                        .await?
                }
                None => client.get("/api/impersonate/status").await?,
            };
            let active = response
                .get("impersonating")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    Ok(())
                }
                OutputFormat::Text if !active => {
                    println!("Not impersonating");
                    Ok(())
                }
                OutputFormat::Text => {
                    if let Some(original) = response.get("original_user") {
                        print_user("Admin", original);
                    }
                    if let Some(target) = response.get("target_user") {
                        print_user("Impersonating", target);
                    }
                    if let Some(minutes) = response.get("remaining_minutes").and_then(Value::as_i64) {
                        println!("Remaining: {} min", minutes);
                    }
                    Ok(())
                }
            }
        }
        ImpersonateCommands::Businesses => {
            let response = client.get("/api/impersonate/businesses").await?;
            let businesses = response
                .get("businesses")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            if businesses.is_empty() {
                return output_empty_collection(&output_format, "businesses", "No active businesses");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "businesses": businesses }))?);
                }
                OutputFormat::Text => {
                    for business in &businesses {
                        println!("{} ({})", str_field(business, "name"), str_field(business, "id"));
                        let users = business
                            .get("users")
                            .and_then(Value::as_array)
                            .cloned()
                            .unwrap_or_default();
                        for user in &users {
                            println!(
                                "  {}  {} <{}> [{}]",
                                str_field(user, "id"),
                                str_field(user, "name"),
                                str_field(user, "email"),
                                str_field(user, "role")
                            );
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
