use serde_json::{json, Value};
use std::io::BufRead;

use crate::cli::OutputFormat;
use crate::routes::Verdict;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a routing verdict; `subject` names what was evaluated
pub fn output_verdict(
    output_format: &OutputFormat,
    subject: &str,
    verdict: &Verdict,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = serde_json::to_value(verdict)?;
            if let Some(object) = response.as_object_mut() {
                object.insert("subject".to_string(), json!(subject));
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => match verdict {
            Verdict::Render => println!("{}: render", subject),
            Verdict::Redirect(route) => println!("{}: redirect to {}", subject, route),
        },
    }
    Ok(())
}

/// Output an arbitrary JSON payload; text mode pretty-prints it as-is
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "data": value }))?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Use the provided secret, or read one line from stdin
pub fn resolve_secret(provided: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(secret) = provided {
        return Ok(secret);
    }

    eprint!("{}: ", prompt);
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        anyhow::bail!("{} is required", prompt);
    }
    Ok(secret)
}

/// Parse `Name: value` header arguments
pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Header '{}' must be in 'Name: value' form", raw))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header '{}' has an empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}
