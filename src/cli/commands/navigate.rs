use crate::cli::context::CliContext;
use crate::cli::utils::output_verdict;
use crate::cli::OutputFormat;
use crate::gate::authorize_path;
use crate::redirector::History;
use crate::routes::{Route, Verdict};

/// Mount the shell (optionally on a page) and report the redirect, if any
pub fn route(from: Option<String>, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut history = match from.as_deref().and_then(Route::from_path) {
        Some(route) => History::starting_at(route),
        None => History::default(),
    };

    let verdict = match ctx.redirector.on_mount(ctx.store.as_ref(), &mut history) {
        Some(route) => Verdict::Redirect(route),
        None => Verdict::Render,
    };

    let subject = from.unwrap_or_else(|| "shell".to_string());
    output_verdict(&output_format, &subject, &verdict)
}

/// Run the role gate for a page
pub fn open(path: &str, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let verdict = authorize_path(path, ctx.store.as_ref());
    output_verdict(&output_format, path, &verdict)
}
