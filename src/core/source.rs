use std::io::Write;
use crate::core::types::{ColumnHeader, FontSpec, ImageAttr, LineStyle, PageTitle, Rect, Row, RowSpec, RowStream};

/// Everything a table render needs: page geometry, decorations, the column
/// schema, the row stream and the output sink.
///
/// Every method has a neutral default (A4 page, no grid, no fonts or images,
/// no title, empty schema, no sink, no rows) so implementors only override
/// what they actually supply.
pub trait TableSource {
    /// Called before any other query
    fn init(&mut self) {}

    /// Called last, on every exit path
    fn cleanup(&mut self) {}

    /// `None` falls back to A4
    fn page_size(&self) -> Option<Rect> {
        Some(Rect::a4())
    }

    fn line_style(&self) -> LineStyle {
        LineStyle::default()
    }

    /// Fonts to register before layout starts
    fn fonts(&self) -> Box<dyn Iterator<Item = FontSpec> + '_> {
        Box::new(std::iter::empty())
    }

    /// Images drawn on every page. Queried once per page.
    fn images(&self) -> Box<dyn Iterator<Item = ImageAttr> + '_> {
        Box::new(std::iter::empty())
    }

    /// Where the finished document goes. `None` aborts the render.
    fn writer(&mut self) -> Option<&mut dyn Write> {
        None
    }

    /// Page title. An empty text is not drawn.
    fn title(&self) -> PageTitle {
        PageTitle::default()
    }

    /// Header geometry and column schema. An empty schema aborts the render.
    fn column_titles(&self) -> ColumnHeader {
        ColumnHeader::default()
    }

    /// Row geometry and the row stream. A missing stream aborts the render.
    fn rows(&mut self) -> RowSpec {
        RowSpec::default()
    }
}

/// Build a bounded single-producer row handoff.
///
/// The sender blocks while `capacity` rows are waiting; the receiver blocks
/// until a row arrives and ends once every sender is dropped.
pub fn row_channel(capacity: usize) -> (RowSender, RowReceiver) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (RowSender { tx }, RowReceiver { rx })
}

/// Producer half of [`row_channel`]
#[derive(Clone)]
pub struct RowSender {
    tx: async_channel::Sender<Row>,
}

impl RowSender {
    /// Hand a row over, blocking while the channel is full.
    /// Returns the row back if the receiver is gone.
    pub fn send(&self, row: Row) -> Result<(), Row> {
        self.tx.send_blocking(row).map_err(|e| e.into_inner())
    }
}

/// Consumer half of [`row_channel`], a blocking iterator
pub struct RowReceiver {
    rx: async_channel::Receiver<Row>,
}

impl RowReceiver {
    pub fn into_stream(self) -> RowStream {
        Box::new(self)
    }
}

impl Iterator for RowReceiver {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rx.recv_blocking().ok()
    }
}

/// Pull every remaining row so a blocked producer can finish
pub(crate) fn drain(rows: &mut RowStream) -> usize {
    rows.by_ref().count()
}
