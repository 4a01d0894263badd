//! Form body parsing module
//!
//! Decodes `application/x-www-form-urlencoded` page forms and the
//! `multipart/form-data` bodies the image upload accepts.

use std::collections::HashMap;

/// A file part extracted from a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name, reduced to its final path component
    pub filename: String,
    pub data: Vec<u8>,
}

/// Parse an `application/x-www-form-urlencoded` body into a field map
///
/// Later occurrences of a field overwrite earlier ones. Pairs that fail
/// percent-decoding are skipped.
pub fn parse_urlencoded(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

/// Decode one urlencoded component (`+` means space, then percent-decoding)
fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

/// Extract the boundary parameter from a `Content-Type` header value
///
/// Returns `None` unless the media type is `multipart/form-data` with a
/// boundary parameter. Quoted boundaries are unquoted.
pub fn multipart_boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    if parts.next()?.trim() != "multipart/form-data" {
        return None;
    }

    parts.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim() != "boundary" {
            return None;
        }
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

/// Parse a `multipart/form-data` body and return the file part named `field`
///
/// Returns `None` when the body has no such part or the part carries no
/// filename (an empty file input submits an empty filename).
pub fn parse_multipart(body: &[u8], boundary: &str, field: &str) -> Option<UploadedFile> {
    let delimiter = format!("--{boundary}");
    for part in split_parts(body, delimiter.as_bytes()) {
        let (headers, data) = split_headers(part)?;

        let Some(disposition) = headers
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("content-disposition:"))
        else {
            continue;
        };

        if disposition_param(disposition, "name").as_deref() != Some(field) {
            continue;
        }

        let filename = disposition_param(disposition, "filename")?;
        // Browsers may send a full client path
        let filename = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .to_string();
        if filename.is_empty() {
            return None;
        }

        return Some(UploadedFile {
            filename,
            data: data.to_vec(),
        });
    }
    None
}

/// Split a multipart body into its parts, excluding the delimiters
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut offsets = Vec::new();
    let mut pos = 0;
    while let Some(idx) = find_subslice(&body[pos..], delimiter) {
        offsets.push(pos + idx);
        pos += idx + delimiter.len();
    }

    for window in offsets.windows(2) {
        let start = window[0] + delimiter.len();
        let part = &body[start..window[1]];
        // The section after the final delimiter starts with "--"
        if part.starts_with(b"--") {
            break;
        }
        parts.push(trim_crlf(part));
    }
    parts
}

/// Split one part into its header block and payload at the blank line
fn split_headers(part: &[u8]) -> Option<(String, &[u8])> {
    let idx = find_subslice(part, b"\r\n\r\n")?;
    let headers = String::from_utf8_lossy(&part[..idx]).into_owned();
    Some((headers, &part[idx + 4..]))
}

/// Extract a parameter from a `Content-Disposition` header line
///
/// Keys are matched exactly, so `filename` never satisfies a lookup for
/// `name`.
fn disposition_param(line: &str, param: &str) -> Option<String> {
    let (_, params) = line.split_once(':')?;
    params.split(';').find_map(|piece| {
        let (key, value) = piece.split_once('=')?;
        if key.trim() != param {
            return None;
        }
        Some(value.trim().trim_matches('"').to_string())
    })
}

/// Locate the first occurrence of `needle` in `haystack`
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Strip the CRLF framing surrounding a part
fn trim_crlf(part: &[u8]) -> &[u8] {
    let part = part.strip_prefix(b"\r\n").unwrap_or(part);
    part.strip_suffix(b"\r\n").unwrap_or(part)
}
