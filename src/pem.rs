//! PEM armor over DER payloads.
//!
//! The armor format here is the traditional OpenSSL one: a BEGIN line,
//! Base64 of the DER body wrapped at 64 columns, an END line. Parsing
//! tolerates CRLF line endings, trailing whitespace, text surrounding
//! the armored block, and `Key: value` headers after the BEGIN line.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

pub const PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
pub const PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

const LINE_WIDTH: usize = 64;

static BEGIN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-----BEGIN ([A-Z0-9 ]+)-----$").expect("hardcoded regex"));
static END_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-----END ([A-Z0-9 ]+)-----$").expect("hardcoded regex"));

/// Armor `der` under the given label.
#[must_use]
pub fn encode(der: &[u8], label: &str) -> Vec<u8> {
    let body = base64::encode(der);

    let mut out = String::with_capacity(body.len() + 2 * label.len() + 64);
    out.push_str("-----BEGIN ");
    out.push_str(label);
    out.push_str("-----\n");

    // Base64 output is pure ASCII, so slicing at byte offsets is safe
    let mut offset = 0;
    while offset < body.len() {
        let end = (offset + LINE_WIDTH).min(body.len());
        out.push_str(&body[offset..end]);
        out.push('\n');
        offset = end;
    }

    out.push_str("-----END ");
    out.push_str(label);
    out.push_str("-----\n");

    out.into_bytes()
}

/// De-armor a PEM block labelled `expected_label`, returning the DER
/// payload.
///
/// Any BEGIN marker with a different label is rejected, as is an END
/// marker that does not match the BEGIN.
pub fn decode(data: &[u8], expected_label: &str) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| Error::Codec("PEM data is not valid UTF-8".to_owned()))?;

    let mut in_block = false;
    let mut end_seen = false;
    let mut body = String::new();

    for raw_line in text.lines() {
        let line = raw_line.trim_end();

        if !in_block {
            if let Some(captures) = BEGIN_MARKER.captures(line) {
                let label = &captures[1];

                if label != expected_label {
                    return Err(Error::Codec(format!(
                        "expected BEGIN {}, found BEGIN {}",
                        expected_label, label
                    )));
                }

                in_block = true;
            }

            continue;
        }

        if let Some(captures) = END_MARKER.captures(line) {
            if &captures[1] != expected_label {
                return Err(Error::Codec(format!(
                    "BEGIN {} closed by END {}",
                    expected_label, &captures[1]
                )));
            }

            end_seen = true;
            break;
        }

        // RFC 1421 style headers ("Proc-Type: ...") and blank lines
        if line.is_empty() || line.contains(':') {
            continue;
        }

        body.push_str(line.trim());
    }

    if !in_block {
        return Err(Error::Codec(format!(
            "no BEGIN {} marker found",
            expected_label
        )));
    }

    if !end_seen {
        return Err(Error::Codec(format!(
            "no END {} marker found",
            expected_label
        )));
    }

    base64::decode(&body).map_err(|_| Error::Codec("invalid Base64 in PEM body".to_owned()))
}
