//! Document information dictionary (`/Info`) access.

use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::error::PdfMantraError;

/// Page count plus the `/Info` text fields the tools care about.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DocumentMetadata {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

/// Read page count and `/Info` fields. Missing or unreadable fields are `None`.
pub fn read_metadata(doc: &Document) -> DocumentMetadata {
    let info = info_dict(doc);
    let field = |key: &[u8]| info.and_then(|dict| text_field(doc, dict, key));

    DocumentMetadata {
        page_count: doc.get_pages().len() as u32,
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        keywords: field(b"Keywords"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
    }
}

fn info_dict(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_field(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, otherwise
/// PDFDocEncoding approximated as Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string. Printable ASCII stays a literal string; anything else
/// becomes a UTF-16BE hex string with a BOM.
pub fn encode_text_string(text: &str) -> Object {
    if text.bytes().all(|b| (0x20..0x7F).contains(&b)) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Return the `/Info` dictionary for writing, creating it when absent.
pub fn info_dict_mut(doc: &mut Document) -> crate::error::Result<&mut Dictionary> {
    let existing = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(Some(*id)),
        Ok(Object::Dictionary(_)) => Some(None),
        _ => None,
    };
    let info_ref = match existing {
        Some(info_ref) => info_ref,
        None => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            Some(id)
        }
    };

    match info_ref {
        Some(id) => Ok(doc.get_dictionary_mut(id)?),
        None => doc
            .trailer
            .get_mut(b"Info")
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfMantraError::pdf_write(format!("invalid Info dictionary: {e}"))),
    }
}

/// Set one `/Info` text field.
pub fn set_text_field(doc: &mut Document, key: &str, value: &str) -> crate::error::Result<()> {
    let info = info_dict_mut(doc)?;
    info.set(key, encode_text_string(value));
    Ok(())
}
