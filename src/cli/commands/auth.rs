use clap::Subcommand;
use serde_json::json;

use crate::claims::decode_claims;
use crate::cli::context::CliContext;
use crate::cli::utils::{output_success, resolve_secret};
use crate::cli::OutputFormat;
use crate::redirector::History;
use crate::session::SessionSnapshot;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the portal API")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and clear the stored session")]
    Logout,

    #[command(about = "Show the stored session and its token claims")]
    Status,

    #[command(about = "Change the current user's password")]
    ChangePassword {
        #[arg(long, help = "New password (will prompt if not provided)")]
        new_password: Option<String>,
        #[arg(long, help = "Confirmation (will prompt if not provided)")]
        confirm: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = resolve_secret(password, "Password")?;
            let login = ctx.client.login(&email, &password).await?;

            let mut history = History::default();
            let landing = ctx.redirector.on_mount(ctx.store.as_ref(), &mut history);
            let landing_path = landing.as_ref().map(|r| r.path());

            output_success(
                &output_format,
                &format!("Logged in as {} ({})", email, login.role),
                Some(json!({
                    "role": login.role,
                    "status": login.status,
                    "landing": landing_path,
                })),
            )
        }
        AuthCommands::Logout => {
            ctx.client.logout()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let snapshot = SessionSnapshot::load(ctx.store.as_ref());
            let claims = snapshot.token.as_deref().and_then(decode_claims);
            let principal = snapshot.principal();
            let expired = claims.as_ref().map(|c| c.is_expired(chrono::Utc::now()));

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "logged_in": snapshot.logged_in,
                            "has_token": snapshot.has_token(),
                            "role": snapshot.role,
                            "status": snapshot.status,
                            "profile_completed": snapshot.profile_completed,
                            "tenant_id": principal.tenant_id,
                            "claims": claims,
                            "token_expired": expired,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    if !snapshot.has_token() {
                        println!("Not logged in");
                        return Ok(());
                    }
                    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
                    println!("Role:    {}", or_dash(snapshot.role.map(|r| r.to_string())));
                    println!("Status:  {}", or_dash(snapshot.status.map(|s| s.to_string())));
                    println!("School:  {}", or_dash(principal.tenant_id));
                    if let Some(claims) = &claims {
                        println!("User:    {}", or_dash(claims.id.clone()));
                        if let Some(at) = claims.expires_at() {
                            let note = if expired == Some(true) { " (expired)" } else { "" };
                            println!("Expires: {}{}", at.format("%Y-%m-%d %H:%M UTC"), note);
                        }
                    } else {
                        println!("Token claims could not be decoded");
                    }
                }
            }
            Ok(())
        }
        AuthCommands::ChangePassword { new_password, confirm } => {
            let new_password = resolve_secret(new_password, "New password")?;
            let confirm = resolve_secret(confirm, "Confirm password")?;
            let change = ctx.client.change_password(&new_password, &confirm).await?;

            let message = if change.logged_out {
                format!("{}. Please login again.", change.message)
            } else {
                change.message.clone()
            };
            output_success(&output_format, &message, Some(json!({ "logged_out": change.logged_out })))
        }
    }
}
