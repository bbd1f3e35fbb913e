use std::io::Write as _;

use anyhow::Context as _;

use crate::cli::{OutputFormat, ViewArgs};
use crate::navigator::{Navigator, View};

pub async fn run(base_url: &str, args: ViewArgs) -> anyhow::Result<()> {
    let mut navigator = Navigator::connect(base_url).await?;
    let view = navigator.navigate(&args.hash).await;
    tracing::info!(hash = %args.hash, route = ?view.route, "rendered view");

    let out = match args.format {
        OutputFormat::Html => render_page(&view),
        OutputFormat::Json => serde_json::to_string_pretty(&view).context("serialize view")?,
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{out}").context("write view")?;
    Ok(())
}

/// Breadcrumbs and content in the page's `crumbs` and `scriptures` panes.
pub fn render_page(view: &View) -> String {
    format!(
        "<div id=\"crumbs\">{}</div>\n<div id=\"scriptures\">{}</div>",
        view.breadcrumbs, view.content
    )
}
