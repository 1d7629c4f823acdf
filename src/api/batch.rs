//! `multipart/mixed` encoding of batched Drive calls.
//!
//! Each mutation becomes one `application/http` part addressed by
//! `Content-ID: <item-N>`; the server answers with one part per item,
//! tagged `<response-item-N>`, each carrying a full HTTP response.

use reqwest::Url;
use serde_json::{Value, json};

use crate::api::error::error_from_response;
use crate::error::{DriveError, Result};
use crate::fs::Mutation;

/// Path prefix of the Drive v3 resources inside batch parts.
const RESOURCE_BASE: &str = "https://www.googleapis.com/drive/v3";

/// One encoded batch request.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    /// Multipart boundary
    pub boundary: String,
    /// Request body
    pub body: String,
}

impl EncodedBatch {
    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }
}

fn random_boundary() -> String {
    format!("batch_{:016x}", rand::random::<u64>())
}

/// Method, path-with-query and JSON body of the call a mutation maps to.
fn request_line(mutation: &Mutation) -> Result<(&'static str, String, Value)> {
    let mut url = Url::parse(RESOURCE_BASE)
        .map_err(|e| DriveError::Custom(format!("Invalid base URL: {}", e)))?;

    let (method, body) = match mutation {
        Mutation::AddParent { file_id, parent_id } => {
            url.path_segments_mut()
                .map_err(|_| DriveError::InvalidResponse)?
                .extend(["files", file_id.as_str()]);
            url.query_pairs_mut()
                .append_pair("addParents", parent_id)
                .append_pair("fields", "id,parents")
                .append_pair("supportsAllDrives", "true");
            ("PATCH", json!({}))
        }
        Mutation::TransferOwnership { file_id, new_owner } => {
            url.path_segments_mut()
                .map_err(|_| DriveError::InvalidResponse)?
                .extend(["files", file_id.as_str(), "permissions"]);
            url.query_pairs_mut()
                .append_pair("transferOwnership", "true")
                .append_pair("supportsAllDrives", "true");
            (
                "POST",
                json!({
                    "type": "user",
                    "role": "owner",
                    "emailAddress": new_owner,
                }),
            )
        }
    };

    let path = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    Ok((method, path, body))
}

/// Encode mutations as a batch request body.
pub fn encode(mutations: &[Mutation]) -> Result<EncodedBatch> {
    encode_with_boundary(mutations, random_boundary())
}

pub(crate) fn encode_with_boundary(mutations: &[Mutation], boundary: String) -> Result<EncodedBatch> {
    let mut body = String::new();

    for (index, mutation) in mutations.iter().enumerate() {
        let (method, path, payload) = request_line(mutation)?;
        let payload = serde_json::to_string(&payload)?;

        body.push_str(&format!("--{}\r\n", boundary));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str(&format!("Content-ID: <item-{}>\r\n\r\n", index + 1));
        body.push_str(&format!("{} {} HTTP/1.1\r\n", method, path));
        body.push_str("Content-Type: application/json; charset=UTF-8\r\n");
        body.push_str(&format!("Content-Length: {}\r\n\r\n", payload.len()));
        body.push_str(&payload);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));

    Ok(EncodedBatch { boundary, body })
}

/// Extract the boundary parameter from a `multipart/mixed` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

/// Split a block into its header lines and the rest, accepting CRLF or LF.
fn split_head(block: &str) -> (&str, &str) {
    if let Some(rest) = block.strip_prefix("\r\n").or_else(|| block.strip_prefix('\n')) {
        return ("", rest);
    }
    if let Some(idx) = block.find("\r\n\r\n") {
        (&block[..idx], &block[idx + 4..])
    } else if let Some(idx) = block.find("\n\n") {
        (&block[..idx], &block[idx + 2..])
    } else {
        (block, "")
    }
}

fn header<'h>(head: &'h str, name: &str) -> Option<&'h str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then_some(value.trim())
    })
}

/// Index encoded in `<response-item-N>`, zero-based.
fn content_index(content_id: &str) -> Option<usize> {
    let id = content_id.trim().trim_start_matches('<').trim_end_matches('>');
    let n: usize = id.rsplit('-').next()?.parse().ok()?;
    n.checked_sub(1)
}

fn decode_part(part: &str) -> (Option<usize>, Result<Value>) {
    let part = part
        .strip_prefix("\r\n")
        .or_else(|| part.strip_prefix('\n'))
        .unwrap_or(part);
    let (outer_head, http) = split_head(part);
    let index = header(outer_head, "Content-ID").and_then(content_index);

    let (inner_head, body) = split_head(http);
    let status = inner_head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok());
    let body = body.trim();

    let result = match status {
        Some(status) if (200..300).contains(&status) => {
            if body.is_empty() {
                Ok(Value::Null)
            } else {
                serde_json::from_str(body).map_err(DriveError::from)
            }
        }
        Some(status) => Err(error_from_response(status, body)),
        None => Err(DriveError::InvalidResponse),
    };
    (index, result)
}

/// Decode a batch response into one result per submitted item.
///
/// Parts are placed by their `Content-ID`; parts without a usable id fill
/// the first free slot in order. Items the server did not answer get
/// [`DriveError::InvalidResponse`].
pub fn decode(boundary: &str, body: &str, expected: usize) -> Vec<Result<Value>> {
    let delimiter = format!("--{}", boundary);
    let mut slots: Vec<Option<Result<Value>>> = (0..expected).map(|_| None).collect();
    let mut unplaced = Vec::new();

    for part in body.split(delimiter.as_str()).skip(1) {
        if part.starts_with("--") {
            break;
        }
        if part.trim().is_empty() {
            continue;
        }
        match decode_part(part) {
            (Some(index), result) if index < expected && slots[index].is_none() => {
                slots[index] = Some(result);
            }
            (_, result) => unplaced.push(result),
        }
    }

    let mut unplaced = unplaced.into_iter();
    slots
        .into_iter()
        .map(|slot| {
            slot.or_else(|| unplaced.next())
                .unwrap_or(Err(DriveError::InvalidResponse))
        })
        .collect()
}
