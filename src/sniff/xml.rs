//! Structural probe for Cellebrite XML reports.
//!
//! The whole document is streamed through `quick-xml` so that anything a
//! conforming parser would reject (mismatched or unclosed tags, several root
//! elements, bad entities) is rejected here too, even when the `report_type`
//! field has already been seen.

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{self, BufRead, Read};
use thiserror::Error;
use tracing::debug;

/// Element path to the report type field, from the document root.
pub const REPORT_TYPE_PATH: [&[u8]; 4] = [
    b"reports",
    b"report",
    b"general_information",
    b"report_type",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Why the probe could not read the document.
#[derive(Debug, Error)]
pub enum XmlProbeError {
    #[error("I/O error while reading report: {0}")]
    Io(#[from] io::Error),

    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: usize, message: String },
}

/// Parse `reader` to the end and return the report type text, if present.
///
/// The value is the first non-empty text node under any element at
/// `/reports/report/general_information/report_type`, in document order,
/// entity-unescaped and untrimmed. Adjacent text and CDATA sections form one
/// node. `Ok(None)` means the document is well formed but has no such text.
///
/// UTF-8 documents are streamed. A UTF-16 byte order mark or another
/// ASCII-compatible encoding named in the XML declaration makes the document
/// be read whole and transcoded first.
pub fn read_report_type<R: BufRead>(mut reader: R) -> Result<Option<String>, XmlProbeError> {
    let encoding = detect_encoding(reader.fill_buf()?)?;
    if encoding == UTF_8 {
        return scan_document(reader);
    }

    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let (encoding, bom_len) = Encoding::for_bom(&raw).unwrap_or((encoding, 0));
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(&raw[bom_len..])
        .ok_or_else(|| malformed(0, format!("invalid {} byte sequence", encoding.name())))?;
    debug!(encoding = encoding.name(), "Transcoded report to UTF-8");
    scan_document(text.as_bytes())
}

/// Encoding of a document, from its byte order mark or XML declaration.
fn detect_encoding(head: &[u8]) -> Result<&'static Encoding, XmlProbeError> {
    if let Some((encoding, _)) = Encoding::for_bom(head) {
        return Ok(encoding);
    }

    let mut xml = Reader::from_reader(head);
    let mut buf = Vec::new();
    let label = match xml.read_event_into(&mut buf) {
        Ok(Event::Decl(decl)) => match decl.encoding() {
            Some(Ok(label)) => label.into_owned(),
            _ => return Ok(UTF_8),
        },
        // No declaration, or one cut off by the buffer; the full scan decides.
        _ => return Ok(UTF_8),
    };

    match Encoding::for_label(&label) {
        Some(encoding) if encoding.is_ascii_compatible() => Ok(encoding),
        // UTF-16 named without a byte order mark: the bytes read so far are ASCII.
        Some(_) => Ok(UTF_8),
        None => Err(malformed(
            0,
            format!("unsupported encoding {:?}", String::from_utf8_lossy(&label)),
        )),
    }
}

fn scan_document<R: BufRead>(reader: R) -> Result<Option<String>, XmlProbeError> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut root_seen = false;
    let mut report_type: Option<String> = None;
    // Text of the current run of adjacent text/CDATA events at the path.
    let mut run = String::new();

    loop {
        let position = xml.buffer_position();
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|e| probe_error(e, position))?;

        if !run.is_empty() && !matches!(event, Event::Text(_) | Event::CData(_)) {
            report_type = Some(std::mem::take(&mut run));
        }

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if stack.is_empty() && root_seen {
                    return Err(malformed(position, "more than one root element"));
                }
                for attr in e.attributes() {
                    attr.map_err(|err| malformed(position, err.to_string()))?;
                }
                root_seen = true;
                if matches!(event, Event::Start(_)) {
                    stack.push(e.name().as_ref().to_vec());
                }
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(malformed(position, "end tag without matching start tag"));
                }
            }
            Event::Text(ref e) => {
                if stack.is_empty() {
                    let raw: &[u8] = e;
                    if !is_ignorable_outside_root(raw) {
                        return Err(malformed(position, "text outside the root element"));
                    }
                } else {
                    let text = e
                        .unescape()
                        .map_err(|err| malformed(position, err.to_string()))?;
                    if report_type.is_none() && at_report_type(&stack) {
                        run.push_str(&text);
                    }
                }
            }
            Event::CData(e) => {
                if stack.is_empty() {
                    return Err(malformed(position, "CDATA outside the root element"));
                }
                if report_type.is_none() && at_report_type(&stack) {
                    let raw = e.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|err| malformed(position, err.to_string()))?;
                    run.push_str(text);
                }
            }
            Event::Eof => {
                if !root_seen {
                    return Err(malformed(position, "document has no root element"));
                }
                if let Some(open) = stack.last() {
                    return Err(malformed(
                        position,
                        format!("unclosed element <{}>", String::from_utf8_lossy(open)),
                    ));
                }
                break;
            }
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
        buf.clear();
    }

    Ok(report_type)
}

fn at_report_type(stack: &[Vec<u8>]) -> bool {
    stack.len() == REPORT_TYPE_PATH.len()
        && stack
            .iter()
            .zip(REPORT_TYPE_PATH.iter())
            .all(|(name, want)| name.as_slice() == *want)
}

fn is_ignorable_outside_root(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn malformed(position: usize, message: impl Into<String>) -> XmlProbeError {
    XmlProbeError::Malformed {
        position,
        message: message.into(),
    }
}

fn probe_error(err: quick_xml::Error, position: usize) -> XmlProbeError {
    match err {
        quick_xml::Error::Io(io_err) => {
            XmlProbeError::Io(io::Error::new(io_err.kind(), io_err.to_string()))
        }
        other => malformed(position, other.to_string()),
    }
}
