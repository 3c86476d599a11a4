use clap::Args;
use reqwest::Method;

use crate::cli::context::CliContext;
use crate::cli::utils::{output_value, parse_header};
use crate::cli::OutputFormat;
use crate::gateway::{FetchState, RequestOptions, Resource};

#[derive(Args)]
pub struct FetchArgs {
    #[arg(help = "API path, e.g. /api/superadmin/schools")]
    pub path: String,

    #[arg(long, short = 'X', default_value = "GET", help = "HTTP method")]
    pub method: String,

    #[arg(long, help = "JSON request body")]
    pub body: Option<String>,

    #[arg(long = "header", short = 'H', help = "Extra header, 'Name: value' (repeatable)")]
    pub headers: Vec<String>,
}

impl FetchArgs {
    fn options(&self) -> anyhow::Result<RequestOptions> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| anyhow::anyhow!("Invalid HTTP method '{}'", self.method))?;

        let mut options = RequestOptions::new(method);
        if let Some(body) = &self.body {
            let body = serde_json::from_str(body).map_err(|e| anyhow::anyhow!("Invalid JSON body: {}", e))?;
            options = options.with_body(body);
        }
        for raw in &self.headers {
            let (name, value) = parse_header(raw)?;
            options = options.with_header(name, value);
        }
        Ok(options)
    }
}

pub async fn handle(args: FetchArgs, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let options = args.options()?;

    let mut resource = Resource::new(ctx.gateway().clone());
    resource.sync(&args.path, &options, true);

    match resource.settled().await {
        FetchState::Success(data) => output_value(&output_format, &data),
        FetchState::Failed(error) => Err(anyhow::anyhow!(error)),
        FetchState::Idle | FetchState::Loading => Err(anyhow::anyhow!("Request did not complete")),
    }
}
