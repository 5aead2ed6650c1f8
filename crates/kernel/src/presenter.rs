//! Listing presenter.
//!
//! Renders exactly one of: loading indicator, verbatim error message,
//! empty-state message, or the row collection. It never filters or enriches
//! rows itself.

use anyhow::{Context, Result};
use serde::Serialize;
use tera::Tera;

use crate::directory::{DirectoryRecord, FetchState, ListingFilter};

const LISTING_TEMPLATE: &str = "listing.html";

/// What a listing view shows for a given fetch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingView {
    Loading,
    Error,
    Empty,
    Rows,
}

impl ListingView {
    /// Classify a fetch state. `Idle` counts as loading: a mounted view
    /// always has a fetch pending.
    pub fn of<R>(state: &FetchState<R>) -> Self {
        match state {
            FetchState::Idle | FetchState::Loading => Self::Loading,
            FetchState::Failed(_) => Self::Error,
            FetchState::Ready(page) if page.is_empty() => Self::Empty,
            FetchState::Ready(_) => Self::Rows,
        }
    }
}

/// Tera-backed HTML renderer for directory listings.
pub struct ListingPresenter {
    tera: Tera,
}

impl ListingPresenter {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            LISTING_TEMPLATE,
            include_str!("../templates/listing.html"),
        )
        .context("failed to load listing template")?;

        Ok(Self { tera })
    }

    /// Render one listing view to HTML.
    pub fn render<R: DirectoryRecord>(
        &self,
        title: &str,
        state: &FetchState<R>,
        filter: &ListingFilter,
    ) -> Result<String> {
        let view = ListingView::of(state);

        let mut context = tera::Context::new();
        context.insert("title", title);
        context.insert("view", &view);
        context.insert("empty_text", R::TABLE.empty_text());

        match state {
            FetchState::Failed(failure) => {
                context.insert("message", &failure.message);
                context.insert("error_kind", &failure.kind);
            }
            FetchState::Ready(page) => {
                let shown = page.rows.len() as u64;
                context.insert("rows", &page.rows);
                context.insert("page", page);
                context.insert("filter", filter);
                context.insert("first", &(page.offset + 1));
                context.insert("last", &(page.offset + shown));
                context.insert("prev_offset", &page.offset.saturating_sub(page.limit));
                context.insert("next_offset", &(page.offset + page.limit));
            }
            FetchState::Idle | FetchState::Loading => {}
        }

        self.tera
            .render(LISTING_TEMPLATE, &context)
            .context("failed to render listing template")
    }
}
