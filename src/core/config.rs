use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::thread::{self, JoinHandle};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::source::{row_channel, TableSource};
use crate::core::types::{ColumnHeader, FontSpec, ImageAttr, LineStyle, PageTitle, Rect, Row, RowSpec, RowStream};
use crate::error::Result;

/// A complete table render described as JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Falls back to A4 when absent
    pub page_size: Option<Rect>,
    pub line: LineStyle,
    pub fonts: Vec<FontSpec>,
    pub images: Vec<ImageAttr>,
    pub title: PageTitle,
    pub header: ColumnHeader,
    pub rows: RowConfig,
}

/// Row geometry and where the rows come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    pub first_y: f64,
    pub height: f64,
    pub font_family: String,
    pub font_size: f64,
    /// Inline rows, used when `path` is not set
    pub data: Vec<Value>,
    /// JSON-lines file with one row object per line
    pub path: Option<String>,
    /// Rows buffered between the file reader and the layout
    pub channel_capacity: usize,
}

impl Default for RowConfig {
    fn default() -> Self {
        RowConfig {
            first_y: 0.0,
            height: 0.0,
            font_family: String::new(),
            font_size: 0.0,
            data: Vec::new(),
            path: None,
            channel_capacity: 16,
        }
    }
}

impl TableConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Turn a JSON object into a row. Strings are kept as-is, nulls dropped,
/// other scalars rendered with their JSON text.
pub fn row_from_json(value: Value) -> Option<Row> {
    let Value::Object(map) = value else {
        return None;
    };
    Some(map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}

/// [`TableSource`] backed by a [`TableConfig`].
///
/// Rows from a file are read by a producer thread and handed over through a
/// bounded channel; the thread is joined in `cleanup`.
pub struct ConfigSource {
    config: TableConfig,
    writer: Option<Box<dyn Write>>,
    producer: Option<JoinHandle<usize>>,
}

impl ConfigSource {
    pub fn new(config: TableConfig) -> Self {
        ConfigSource { config, writer: None, producer: None }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(TableConfig::from_json(json)?))
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Set the sink the finished document is written to
    pub fn with_writer(mut self, writer: impl Write + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    fn spawn_reader(&mut self, path: &str) -> Option<RowStream> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("cannot open row file {}: {}", path, e);
                return None;
            }
        };
        let (tx, rx) = row_channel(self.config.rows.channel_capacity);
        let path = path.to_string();

        self.producer = Some(thread::spawn(move || {
            let mut sent = 0;
            for (n, line) in BufReader::new(file).lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("stopped reading {} at line {}: {}", path, n + 1, e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line).ok().and_then(row_from_json);
                let Some(row) = row else {
                    warn!("skipping line {} of {}: not a JSON object", n + 1, path);
                    continue;
                };
                if tx.send(row).is_err() {
                    break;
                }
                sent += 1;
            }
            sent
        }));
        Some(rx.into_stream())
    }
}

impl TableSource for ConfigSource {
    fn cleanup(&mut self) {
        if let Some(producer) = self.producer.take() {
            match producer.join() {
                Ok(sent) => debug!("Row reader finished after {} rows", sent),
                Err(_) => warn!("row reader thread panicked"),
            }
        }
    }

    fn page_size(&self) -> Option<Rect> {
        self.config.page_size
    }

    fn line_style(&self) -> LineStyle {
        self.config.line.clone()
    }

    fn fonts(&self) -> Box<dyn Iterator<Item = FontSpec> + '_> {
        Box::new(self.config.fonts.iter().cloned())
    }

    fn images(&self) -> Box<dyn Iterator<Item = ImageAttr> + '_> {
        Box::new(self.config.images.iter().cloned())
    }

    fn writer(&mut self) -> Option<&mut dyn Write> {
        self.writer.as_mut().map(|w| w as &mut dyn Write)
    }

    fn title(&self) -> PageTitle {
        self.config.title.clone()
    }

    fn column_titles(&self) -> ColumnHeader {
        self.config.header.clone()
    }

    fn rows(&mut self) -> RowSpec {
        let rows = match self.config.rows.path.clone() {
            Some(path) => self.spawn_reader(&path),
            None => {
                let data = std::mem::take(&mut self.config.rows.data);
                Some(Box::new(data.into_iter().filter_map(row_from_json)) as RowStream)
            }
        };
        let geometry = &self.config.rows;
        RowSpec {
            first_y: geometry.first_y,
            height: geometry.height,
            font_family: geometry.font_family.clone(),
            font_size: geometry.font_size,
            rows,
        }
    }
}
