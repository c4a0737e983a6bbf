//! Paginated PDF tables from a lazily produced row stream.
//!
//! A [`TableSource`] describes the page, the column schema and the row
//! stream; [`generate_table`] lays the rows out onto a [`Canvas`] and writes
//! the result to the source's sink. [`PdfCanvas`] is the PDF backend and
//! [`ConfigSource`] drives a render from a JSON description.

pub mod core;
pub mod error;

pub use crate::core::canvas::Canvas;
pub use crate::core::config::{row_from_json, ConfigSource, RowConfig, TableConfig};
pub use crate::core::generator::{generate_pdf_table, generate_table, Outcome, SkipReason};
pub use crate::core::pdf_canvas::{LineType, PdfCanvas};
pub use crate::core::source::{row_channel, RowReceiver, RowSender, TableSource};
pub use crate::core::table::{RowGeometry, TableLayout};
pub use crate::core::types::{
    ColumnHeader, FontSpec, ImageAttr, LineStyle, PageTitle, Point, Rect, Row, RowSpec, RowStream, Title,
};
pub use crate::error::{Error, Result};
