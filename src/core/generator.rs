use std::ops::{Deref, DerefMut};
use log::{debug, info, warn};
use crate::core::canvas::Canvas;
use crate::core::pdf_canvas::PdfCanvas;
use crate::core::source::{drain, TableSource};
use crate::core::table::{RowGeometry, TableLayout};
use crate::core::types::{Rect, RowSpec, RowStream};
use crate::error::Result;

/// Why a render produced no document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source supplied no row stream
    NoRows,
    /// The source supplied no output sink
    NoWriter,
    /// The column schema was empty
    NoColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rendered { pages: usize },
    Skipped(SkipReason),
}

/// Calls `cleanup` on the source when dropped
struct Cleanup<'a, S: TableSource + ?Sized>(&'a mut S);

impl<S: TableSource + ?Sized> Deref for Cleanup<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.0
    }
}

impl<S: TableSource + ?Sized> DerefMut for Cleanup<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.0
    }
}

impl<S: TableSource + ?Sized> Drop for Cleanup<'_, S> {
    fn drop(&mut self) {
        self.0.cleanup();
    }
}

/// Pulls the rest of the stream when dropped, unless layout took it over
struct PendingRows {
    rows: RowStream,
    handled: bool,
}

impl Drop for PendingRows {
    fn drop(&mut self) {
        if self.handled {
            return;
        }
        let n = drain(&mut self.rows);
        debug!("Drained {} unrendered rows", n);
    }
}

/// Render the source's rows as a paginated table onto `canvas` and write the
/// result to the source's sink.
///
/// `cleanup` runs on every exit path. Once the row stream has been obtained
/// it is always consumed to the end, even when the render is abandoned, so a
/// producer feeding it is never left blocked.
pub fn generate_table<S, C>(source: &mut S, canvas: &mut C) -> Result<Outcome>
where
    S: TableSource + ?Sized,
    C: Canvas + ?Sized,
{
    source.init();
    let mut source = Cleanup(source);

    let RowSpec { first_y, height, font_family, font_size, rows } = source.rows();
    let Some(rows) = rows else {
        debug!("No row stream, nothing to render");
        return Ok(Outcome::Skipped(SkipReason::NoRows));
    };
    let mut rows = PendingRows { rows, handled: false };

    if source.writer().is_none() {
        debug!("No output sink, nothing to render");
        return Ok(Outcome::Skipped(SkipReason::NoWriter));
    }

    let header = source.column_titles();
    if header.titles.is_empty() {
        debug!("No column titles, nothing to render");
        return Ok(Outcome::Skipped(SkipReason::NoColumns));
    }

    let page_size = source.page_size().unwrap_or_else(Rect::a4);
    canvas.start(page_size);

    let line = source.line_style();
    if line.draw {
        canvas.set_line_width(line.width);
        canvas.set_line_type(&line.line_type);
    }
    register_fonts(canvas, &*source);

    rows.handled = true;
    let row = RowGeometry { first_y, height, font_family, font_size };
    let layout = TableLayout::new(page_size, header, row, line);
    let pages = layout.render(canvas, &*source, &mut rows.rows);
    info!("Laid out {} page(s) with {} column(s)", pages, layout.header.titles.len());

    let result = match source.writer() {
        Some(sink) => canvas.serialize_to(sink).map(|_| Outcome::Rendered { pages }),
        None => {
            warn!("Output sink went away before the document was written");
            Ok(Outcome::Skipped(SkipReason::NoWriter))
        }
    };
    canvas.close();
    result
}

/// [`generate_table`] onto a fresh [`PdfCanvas`]
pub fn generate_pdf_table<S: TableSource + ?Sized>(source: &mut S) -> Result<Outcome> {
    let mut canvas = PdfCanvas::new();
    generate_table(source, &mut canvas)
}

fn register_fonts<C, S>(canvas: &mut C, source: &S)
where
    C: Canvas + ?Sized,
    S: TableSource + ?Sized,
{
    for font in source.fonts() {
        if let Err(e) = canvas.register_font(&font.family, &font.path) {
            warn!("failed to read font {}: {}", font.family, e);
        }
    }
}
