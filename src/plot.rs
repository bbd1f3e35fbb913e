use std::io::Write as _;

use anyhow::Context as _;
use serde::Serialize;

use crate::api::ChapterRequest;
use crate::cli::MarkersArgs;
use crate::markers::{Marker, Viewport};
use crate::navigator::Navigator;
use crate::places::PlaceTag;

#[derive(Debug, Serialize)]
pub struct PlotReport<'a> {
    pub book_id: u32,
    pub chapter: u32,
    pub places: &'a [PlaceTag],
    pub markers: &'a [Marker],
    pub viewport: Viewport,
}

pub async fn run(base_url: &str, args: MarkersArgs) -> anyhow::Result<()> {
    let mut navigator = Navigator::connect(base_url).await?;
    if !navigator
        .catalog()
        .book_chapter_valid(i64::from(args.book), i64::from(args.chapter))
    {
        anyhow::bail!("no chapter {} in book {}", args.chapter, args.book);
    }

    let request = ChapterRequest {
        book_id: args.book,
        chapter: args.chapter,
        verses: args.verses,
        jst: args.jst,
    };
    let chapter = navigator.load_chapter(&request).await?;
    let viewport = navigator.plot_places(&chapter.places);
    tracing::info!(
        places = chapter.places.len(),
        markers = navigator.markers().len(),
        "plotted chapter places"
    );

    let report = PlotReport {
        book_id: chapter.book_id,
        chapter: chapter.chapter,
        places: &chapter.places,
        markers: navigator.markers(),
        viewport,
    };
    let json = serde_json::to_string_pretty(&report).context("serialize markers")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("write markers")?;
    Ok(())
}
