//! # Instantiation Orchestrator
//!
//! Drives the whole pipeline: for every CSV row, deep-copy the template's
//! label subtrees, run the filter pass, ask the layout engine where the
//! label lands, and append the translated copy to its page.
//!
//! Fatal errors (bad start position) abort before any page exists. Per-row
//! errors are collected into [`RowError`] records and returned alongside the
//! pages, so callers can write output and report problems together.

use crate::data::Row;
use crate::error::{EtiquetaError, RowError};
use crate::sheet::SheetConfig;
use crate::svg::{Element, Node};
use crate::template::Template;

/// One output page: the template's base document with the sheet geometry
/// applied and one translated group appended per label, in row order.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub doc: Element,
    /// Number of labels placed on this page.
    pub labels: usize,
}

/// Caller-supplied run adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Grid row of the first label on the first page, zero is topmost.
    pub start_row: usize,
    /// Grid column of the first label on the first page, zero is leftmost.
    pub start_col: usize,
}

/// Instantiate `template` once per row, arranged across pages per `config`.
///
/// Returns the pages in ascending index order plus all collected per-row
/// errors. Labels within a page appear in ascending row order.
pub fn generate(
    template: &Template,
    config: &SheetConfig,
    rows: &[Row],
    options: &RunOptions,
) -> Result<(Vec<Page>, Vec<RowError>), EtiquetaError> {
    let start = config.start_slot(options.start_row, options.start_col)?;

    let mut pages: Vec<Page> = Vec::new();
    let mut errors: Vec<RowError> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let (page_index, offset) = config.place(start + index);
        while pages.len() <= page_index {
            pages.push(new_page(template, config, pages.len()));
        }

        let (instances, row_errors) = template.generate(row);
        errors.extend(
            row_errors
                .into_iter()
                .map(|error| RowError { row: index, error }),
        );

        let mut group = Element::new("g");
        group.set_attr("transform", format!("translate({},{})", offset.x, offset.y));
        group.children = instances.into_iter().map(Node::Element).collect();

        let page = &mut pages[page_index];
        page.doc.children.push(Node::Element(group));
        page.labels += 1;
    }

    Ok((pages, errors))
}

fn new_page(template: &Template, config: &SheetConfig, index: usize) -> Page {
    let mut doc = template.clone_base();
    doc.set_attr("width", config.size.x.to_string());
    doc.set_attr("height", config.size.y.to_string());
    doc.set_attr("viewBox", format!("0 0 {} {}", config.size.x, config.size.y));
    Page {
        index,
        doc,
        labels: 0,
    }
}

/// Output file name for one page: `<prefix>_<index>.svg`, with a trailing
/// `.svg` on the prefix stripped first (case-insensitive).
pub fn page_filename(prefix: &str, index: usize) -> String {
    let stem = if prefix.to_ascii_lowercase().ends_with(".svg") {
        &prefix[..prefix.len() - 4]
    } else {
        prefix
    };
    format!("{stem}_{index}.svg")
}
