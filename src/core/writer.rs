use std::io::{self, Write};
use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Core PDF Objects based on PDF Reference 1.7
#[derive(Debug, Clone)]
pub enum PdfObject {
    Integer(i64),
    Real(f64),
    Name(String),
    String(String),
    Array(Vec<PdfObject>),
    Dictionary(Vec<(String, PdfObject)>),
    Stream(Vec<(String, PdfObject)>, Vec<u8>), // Dictionary + Content
    Reference(u32), // Indirect Object Reference (id)
}

impl PdfObject {
    pub fn name(n: &str) -> Self {
        PdfObject::Name(n.to_string())
    }

    /// Stream whose content is deflated and tagged /FlateDecode
    pub fn flate_stream(mut dict: Vec<(String, PdfObject)>, content: &[u8]) -> io::Result<Self> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content)?;
        dict.push(("Filter".to_string(), PdfObject::name("FlateDecode")));
        Ok(PdfObject::Stream(dict, encoder.finish()?))
    }

    /// Serializes the object to the writer
    pub fn serialize<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        match self {
            PdfObject::Integer(i) => write!(w, "{}", i),
            PdfObject::Real(r) => write!(w, "{}", format_real(*r)),
            PdfObject::Name(n) => write!(w, "/{}", n),
            PdfObject::String(s) => {
                w.write_all(b"(")?;
                w.write_all(&escape_string(s))?;
                w.write_all(b")")
            }
            PdfObject::Array(arr) => {
                write!(w, "[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 { write!(w, " ")?; }
                    obj.serialize(w)?;
                }
                write!(w, "]")
            }
            PdfObject::Dictionary(dict) => {
                write!(w, "<<")?;
                for (key, val) in dict {
                    write!(w, " /{} ", key)?;
                    val.serialize(w)?;
                }
                write!(w, " >>")
            }
            PdfObject::Stream(dict, content) => {
                write!(w, "<<")?;
                for (key, val) in dict {
                    write!(w, " /{} ", key)?;
                    val.serialize(w)?;
                }
                write!(w, " /Length {} >>\nstream\n", content.len())?;
                w.write_all(content)?;
                write!(w, "\nendstream")
            }
            PdfObject::Reference(id) => write!(w, "{} 0 R", id),
        }
    }
}

/// Number formatting for content streams: at most 3 decimals, no trailing zeros
pub fn format_real(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escape a literal string. Characters outside Latin-1 become '?'.
pub fn escape_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            c if (c as u32) < 256 => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Writes numbered objects to any sink, tracking byte offsets for the xref table
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: u64,
    xref: Vec<(u32, u64)>, // id -> offset
}

impl<W: Write> PdfWriter<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        // Binary comment marks the file as binary
        let header = b"%PDF-1.7\n%\x93\x8C\x8B\x9E\n";
        writer.write_all(header)?;

        Ok(PdfWriter {
            writer,
            offset: header.len() as u64,
            xref: Vec::new(),
        })
    }

    pub fn write_object(&mut self, id: u32, object: &PdfObject) -> io::Result<()> {
        let mut buf = Vec::new();
        write!(buf, "{} 0 obj\n", id)?;
        object.serialize(&mut buf)?;
        write!(buf, "\nendobj\n")?;

        self.writer.write_all(&buf)?;
        self.xref.push((id, self.offset));
        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Write the xref table and trailer, then flush. Objects must be numbered 1..=n.
    pub fn write_xref_and_trailer(&mut self, root_id: u32) -> io::Result<()> {
        let xref_offset = self.offset;

        self.xref.sort_by_key(|&(id, _)| id);

        let mut buf = Vec::new();
        writeln!(buf, "xref")?;
        writeln!(buf, "0 {}", self.xref.len() + 1)?;
        writeln!(buf, "0000000000 65535 f ")?;
        for (_id, offset) in &self.xref {
            writeln!(buf, "{:010} 00000 n ", offset)?;
        }

        writeln!(buf, "trailer")?;
        writeln!(buf, "<< /Size {} /Root {} 0 R >>", self.xref.len() + 1, root_id)?;
        writeln!(buf, "startxref")?;
        writeln!(buf, "{}", xref_offset)?;
        writeln!(buf, "%%EOF")?;

        self.writer.write_all(&buf)?;
        self.offset += buf.len() as u64;
        self.writer.flush()
    }
}
