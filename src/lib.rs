//! # Etiqueta - SVG Label Sheet Generator
//!
//! Etiqueta turns an SVG label template, a CSV file of per-label data and a
//! sheet configuration into printable SVG pages: the template is replicated
//! once per CSV row and arranged in a grid across pages. It provides:
//!
//! - **Template filters**: `%(field)` text interpolation, `#code128`
//!   barcode placeholders, `#style` attribute rewriting
//! - **Barcode codec**: a pure Code128 encoder with codeset switching and
//!   mod-103 checksum
//! - **Layout engine**: grid placement with row/column fill order and
//!   automatic page breaks
//!
//! ## Quick Start
//!
//! ```
//! use etiqueta::{RunOptions, SheetConfig, Template, run};
//!
//! let template = Template::parse(
//!     r#"<svg><g><text>%(name)</text></g></svg>"#,
//! )?;
//! let config = SheetConfig::parse(
//!     "[sheet]\nsizex = 8.5in\nsizey = 11in\noffx = 10\noffy = 10\n\
//!      incx = 180\nincy = 72\nnrows = 10\nncols = 3\n",
//! )?;
//! let rows = etiqueta::data::read_rows("name\nAlice\nBob\n".as_bytes())?;
//!
//! let (pages, errors) = run::generate(&template, &config, &rows, &RunOptions::default())?;
//! assert_eq!(pages.len(), 1);
//! assert!(errors.is_empty());
//!
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template parsing, command grammar, filter pass |
//! | [`code128`] | Code128 barcode encoder |
//! | [`sheet`] | Sheet configuration and grid/pagination engine |
//! | [`run`] | Per-row instantiation and page assembly |
//! | [`data`] | CSV rows and `--only` row selection |
//! | [`svg`] | Mutable SVG element tree |
//! | [`geom`] | Length units and 2D offsets |
//! | [`error`] | Error types |
//!
//! ## Error Model
//!
//! Configuration and template problems are fatal and reported before any
//! page is written. Per-row problems (unknown field, unencodable barcode
//! character, malformed command) leave the offending placeholder unfiltered,
//! never block other rows, and are returned as a summary next to the pages.

pub mod code128;
pub mod data;
pub mod error;
pub mod geom;
pub mod run;
pub mod sheet;
pub mod svg;
pub mod template;

// Re-exports for convenience
pub use error::{EtiquetaError, RowError};
pub use run::{Page, RunOptions};
pub use sheet::{FillDir, SheetConfig};
pub use template::Template;
