use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::context::CliContext;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::lifecycle::{allowed_actions, SchoolAction};

#[derive(Subcommand)]
pub enum SchoolCommands {
    #[command(about = "List all schools with their lifecycle status")]
    List,

    #[command(about = "Approve a school (also re-activates suspended or deactivated schools)")]
    Approve {
        #[arg(help = "School ID")]
        id: String,
    },

    #[command(about = "Reject a school registration")]
    Reject {
        #[arg(help = "School ID")]
        id: String,
        #[arg(long, help = "Reason shown to the school")]
        reason: Option<String>,
    },

    #[command(about = "Suspend an active school")]
    Suspend {
        #[arg(help = "School ID")]
        id: String,
        #[arg(long, help = "Reason shown to the school")]
        reason: Option<String>,
    },

    #[command(about = "Deactivate a school")]
    Deactivate {
        #[arg(help = "School ID")]
        id: String,
    },

    #[command(about = "Submit the logged-in admin's school profile from a JSON file")]
    Profile {
        #[arg(help = "Path to the profile JSON")]
        file: String,
    },
}

pub async fn handle(cmd: SchoolCommands, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let (id, action, reason) = match cmd {
        SchoolCommands::List => return list(ctx, output_format).await,
        SchoolCommands::Profile { file } => return submit_profile(&file, ctx, output_format).await,
        SchoolCommands::Approve { id } => (id, SchoolAction::Approve, None),
        SchoolCommands::Reject { id, reason } => (id, SchoolAction::Reject, reason),
        SchoolCommands::Suspend { id, reason } => (id, SchoolAction::Suspend, reason),
        SchoolCommands::Deactivate { id } => (id, SchoolAction::Deactivate, None),
    };

    // Look the school up so the transition can be checked before calling out
    let schools = ctx.client.list_schools().await?;
    let current = schools
        .iter()
        .find(|school| school.id == id)
        .and_then(|school| school.lifecycle_status());

    let status = ctx
        .client
        .school_action(&id, action, current, reason.as_deref())
        .await?;

    output_success(
        &output_format,
        &format!("School {} is now {}", id, status),
        Some(json!({ "id": id, "status": status })),
    )
}

async fn list(ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let schools = ctx.client.list_schools().await?;

    match output_format {
        OutputFormat::Json => {
            let rows: Vec<Value> = schools
                .iter()
                .map(|school| {
                    let actions = school
                        .lifecycle_status()
                        .map(allowed_actions)
                        .unwrap_or(&[]);
                    json!({
                        "id": school.id,
                        "name": school.name,
                        "status": school.status,
                        "actions": actions,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "schools": rows }))?);
        }
        OutputFormat::Text => {
            if schools.is_empty() {
                println!("No schools registered");
                return Ok(());
            }

            println!("{:<10} {:<30} {:<20} {}", "ID", "NAME", "STATUS", "ACTIONS");
            println!("{}", "-".repeat(80));
            for school in &schools {
                let actions: Vec<&str> = school
                    .lifecycle_status()
                    .map(allowed_actions)
                    .unwrap_or(&[])
                    .iter()
                    .map(SchoolAction::endpoint)
                    .collect();
                println!(
                    "{:<10} {:<30} {:<20} {}",
                    school.id,
                    school.name.as_deref().unwrap_or("-"),
                    school.status.as_deref().unwrap_or("-"),
                    actions.join(", ")
                );
            }
        }
    }
    Ok(())
}

async fn submit_profile(file: &str, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let profile: Value = serde_json::from_str(&content)?;
    let status = ctx.client.submit_profile(profile).await?;

    output_success(
        &output_format,
        &format!("Profile submitted; school is {}", status),
        Some(json!({ "status": status })),
    )
}
