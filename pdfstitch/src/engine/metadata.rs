//! Document Info dictionary.
//!
//! The merged document always carries an Info dictionary: the user's
//! metadata, a title (falling back to the output name), the tool as
//! creator and producer, and creation and modification dates.

use std::time::{SystemTime, UNIX_EPOCH};

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::config::Metadata;
use crate::error::Result;

/// Write the Info dictionary of `doc`, replacing any existing one.
///
/// `fallback_title` is used when `metadata` has no title.
pub fn stamp_info(
    doc: &mut Document,
    metadata: &Metadata,
    fallback_title: &str,
) -> Result<ObjectId> {
    let mut info = Dictionary::new();

    let title = metadata.title.as_deref().unwrap_or(fallback_title);
    if !title.is_empty() {
        info.set("Title", text_string(title));
    }
    for (key, value) in [
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
    ] {
        if let Some(value) = value {
            info.set(key, text_string(value));
        }
    }

    info.set("Creator", text_string(crate::NAME));
    info.set(
        "Producer",
        text_string(&format!("{} {}", crate::NAME, crate::VERSION)),
    );

    let now = format_pdf_date(SystemTime::now());
    info.set("CreationDate", text_string(&now));
    info.set("ModDate", text_string(&now));

    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => {
            doc.objects.insert(id, Object::Dictionary(info));
            id
        }
        Err(_) => {
            let id = doc.add_object(info);
            doc.trailer.set("Info", id);
            id
        }
    };

    Ok(info_id)
}

/// Read the user-facing fields of a document's Info dictionary.
pub fn read_info(doc: &Document) -> Metadata {
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .and_then(|info| doc.dereference(info))
        .and_then(|(_, info)| info.as_dict())
        .ok()
    else {
        return Metadata::default();
    };

    let field = |key: &[u8]| match info.get(key) {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };

    Metadata::new(
        field(b"Title"),
        field(b"Author"),
        field(b"Subject"),
        field(b"Keywords"),
    )
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with a BOM otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Format a time as a PDF date string in UTC: `D:YYYYMMDDHHmmSSZ`.
fn format_pdf_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let seconds_of_day = secs % 86_400;

    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        seconds_of_day / 3_600,
        (seconds_of_day % 3_600) / 60,
        seconds_of_day % 60
    )
}

/// Gregorian date for a count of days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
