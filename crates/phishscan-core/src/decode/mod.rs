//! Lenient message decoding.
//!
//! Turns raw RFC 5322 bytes into a [`Message`] without ever failing:
//! - header/body split at the first blank line (CRLF or bare LF)
//! - folded headers are unfolded, RFC 2047 words in the subject are decoded
//! - `multipart/*` bodies are walked for the first `text/plain` part, falling
//!   back to the first `text/html` part converted to text
//! - Base64 and Quoted-Printable transfer encodings are undone
//! - the declared charset is applied; undecodable bytes become U+FFFD

mod charset;
mod encoding;

pub use charset::decode_charset;
pub use encoding::{decode_base64, decode_header_value, decode_quoted_printable};

use crate::model::{Message, MessageId};

/// Nesting limit for multipart bodies.
const MAX_MULTIPART_DEPTH: usize = 8;

/// Decode a raw message. Never fails.
#[must_use]
pub fn decode_message(id: MessageId, raw: &[u8]) -> Message {
    let (header_block, body) = split_headers_body(raw);
    let headers = Headers::parse(header_block);

    let subject = headers
        .get("subject")
        .map(|s| decode_header_value(s).trim().to_string());

    let body = match find_text(&headers, body, 0) {
        Some(Text::Plain(text)) => text,
        Some(Text::Html(html)) => html_to_text(&html),
        None => String::new(),
    };

    Message { id, subject, body }
}

/// Position of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split a message or part into header block and body.
fn split_headers_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_prefix(b"\r\n").or_else(|| raw.strip_prefix(b"\n")) {
        return (&[], body);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find(raw, b"\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((idx, sep)) => (&raw[..idx], &raw[idx + sep..]),
        None if looks_like_header(raw) => (raw, &[]),
        None => (&[], raw),
    }
}

/// Returns true if the first line has the shape `Name: value`.
fn looks_like_header(raw: &[u8]) -> bool {
    let first_line = raw.split(|&b| b == b'\n').next().unwrap_or_default();
    first_line.iter().position(|&b| b == b':').is_some_and(|colon| {
        colon > 0
            && first_line[..colon]
                .iter()
                .all(|b| b.is_ascii_graphic() && *b != b':')
    })
}

/// Unfolded header fields, names lowercased.
#[derive(Debug, Default)]
struct Headers(Vec<(String, String)>);

impl Headers {
    fn parse(block: &[u8]) -> Self {
        let text = String::from_utf8_lossy(block);
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                fields.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        Self(fields)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parsed `Content-Type` value.
#[derive(Debug)]
struct ContentType {
    mime: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self {
                mime: "text/plain".to_string(),
                params: Vec::new(),
            };
        };

        let mut pieces = split_params(value).into_iter();
        let mime = pieces
            .next()
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "text/plain".to_string());

        let params = pieces
            .filter_map(|p| {
                let (key, val) = p.split_once('=')?;
                Some((
                    key.trim().to_ascii_lowercase(),
                    val.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        Self { mime, params }
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_multipart(&self) -> bool {
        self.mime.starts_with("multipart/")
    }
}

/// Split a header value on `;`, ignoring separators inside quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                pieces.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&value[start..]);
    pieces
}

/// Split a multipart body into its parts.
///
/// A missing closing delimiter keeps the last part up to the end of input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut starts = Vec::new();
    let mut offset = 0;
    while let Some(pos) = find(&body[offset..], delimiter) {
        let start = offset + pos;
        if start == 0 || body[start - 1] == b'\n' {
            starts.push(start);
        }
        offset = start + delimiter.len();
    }

    let mut parts = Vec::new();
    for (n, &start) in starts.iter().enumerate() {
        let after = start + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        let Some(newline) = find(&body[after..], b"\n") else {
            break;
        };
        let content_start = after + newline + 1;
        let end = starts.get(n + 1).copied().unwrap_or(body.len());
        if content_start > end {
            continue;
        }
        let part = &body[content_start..end];
        let part = part
            .strip_suffix(b"\r\n")
            .or_else(|| part.strip_suffix(b"\n"))
            .unwrap_or(part);
        parts.push(part);
    }
    parts
}

/// Text found in a message body.
enum Text {
    Plain(String),
    Html(String),
}

fn is_attachment(headers: &Headers) -> bool {
    headers
        .get("content-disposition")
        .is_some_and(|d| d.trim().to_ascii_lowercase().starts_with("attachment"))
}

fn decode_transfer(body: &[u8], encoding: Option<&str>) -> Vec<u8> {
    let encoding = encoding.unwrap_or("7bit").trim().to_ascii_lowercase();
    match encoding.as_str() {
        "base64" => decode_base64(body).unwrap_or_else(|| body.to_vec()),
        "quoted-printable" => decode_quoted_printable(body),
        _ => body.to_vec(),
    }
}

fn find_text(headers: &Headers, body: &[u8], depth: usize) -> Option<Text> {
    let content_type = ContentType::parse(headers.get("content-type"));

    if content_type.is_multipart() {
        if let Some(boundary) = content_type.param("boundary") {
            if depth >= MAX_MULTIPART_DEPTH {
                return None;
            }
            let mut html = None;
            for part in split_multipart(body, boundary) {
                let (part_headers, part_body) = split_headers_body(part);
                let part_headers = Headers::parse(part_headers);
                match find_text(&part_headers, part_body, depth + 1) {
                    Some(Text::Plain(text)) => return Some(Text::Plain(text)),
                    Some(Text::Html(text)) if html.is_none() => html = Some(text),
                    _ => {}
                }
            }
            return html.map(Text::Html);
        }
        // No boundary: treat the body as plain text rather than drop it.
        return Some(Text::Plain(String::from_utf8_lossy(body).into_owned()));
    }

    if is_attachment(headers) {
        return None;
    }

    let decoded = decode_transfer(body, headers.get("content-transfer-encoding"));
    let text = decode_charset(&decoded, content_type.param("charset").unwrap_or("us-ascii"));

    if content_type.mime == "text/html" {
        Some(Text::Html(text))
    } else if content_type.mime.starts_with("text/") {
        Some(Text::Plain(text))
    } else {
        None
    }
}

fn html_to_text(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "HTML conversion failed, classifying markup");
        html.to_string()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Message {
        decode_message(MessageId::new("1"), raw.as_bytes())
    }

    #[test]
    fn test_simple_message() {
        let msg = decode("Subject: Hello\r\nFrom: a@b.c\r\n\r\nBody text\r\n");
        assert_eq!(msg.subject.as_deref(), Some("Hello"));
        assert_eq!(msg.body, "Body text\r\n");
    }

    #[test]
    fn test_missing_subject() {
        let msg = decode("From: a@b.c\n\nhi");
        assert_eq!(msg.subject, None);
        assert_eq!(msg.body, "hi");
    }

    #[test]
    fn test_folded_encoded_subject() {
        let msg = decode("Subject: =?utf-8?Q?Action?=\r\n =?utf-8?Q?_required?=\r\n\r\nx");
        assert_eq!(msg.subject.as_deref(), Some("Action required"));
    }

    #[test]
    fn test_base64_body_with_charset() {
        let raw = "Content-Type: text/plain; charset=utf-8\r\n\
                   Content-Transfer-Encoding: base64\r\n\
                   \r\n\
                   Q2xpY2sgaGVyZSBub3c=\r\n";
        assert_eq!(decode(raw).body, "Click here now");
    }

    #[test]
    fn test_quoted_printable_latin1_body() {
        let raw = "Content-Type: text/plain; charset=\"iso-8859-1\"\n\
                   Content-Transfer-Encoding: quoted-printable\n\
                   \n\
                   Caf=E9 cr=E8me";
        assert_eq!(decode(raw).body, "Café crème");
    }

    #[test]
    fn test_invalid_utf8_body_is_replaced() {
        let raw = b"Subject: x\r\n\r\nbad \xff\xfe bytes";
        let msg = decode_message(MessageId::new("9"), raw);
        assert_eq!(msg.body, "bad \u{FFFD}\u{FFFD} bytes");
    }

    #[test]
    fn test_multipart_prefers_plain() {
        let raw = "Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
                   \r\n\
                   preamble\r\n\
                   --XYZ\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <p>html version</p>\r\n\
                   --XYZ\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   plain version\r\n\
                   --XYZ--\r\n";
        assert_eq!(decode(raw).body, "plain version");
    }

    #[test]
    fn test_multipart_html_only() {
        let raw = "Content-Type: multipart/mixed; boundary=b1\n\
                   \n\
                   --b1\n\
                   Content-Type: text/html; charset=utf-8\n\
                   \n\
                   <html><body><p>Verify your <b>account</b></p></body></html>\n\
                   --b1--\n";
        let body = decode(raw).body;
        assert!(body.contains("Verify your"));
        assert!(!body.contains("<p>"));
    }

    #[test]
    fn test_nested_multipart_skips_attachment() {
        let raw = "Content-Type: multipart/mixed; boundary=outer\r\n\
                   \r\n\
                   --outer\r\n\
                   Content-Type: text/plain\r\n\
                   Content-Disposition: attachment; filename=notes.txt\r\n\
                   \r\n\
                   attached notes\r\n\
                   --outer\r\n\
                   Content-Type: multipart/alternative; boundary=inner\r\n\
                   \r\n\
                   --inner\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   inner text\r\n\
                   --inner--\r\n\
                   --outer--\r\n";
        assert_eq!(decode(raw).body, "inner text");
    }

    #[test]
    fn test_truncated_multipart_keeps_last_part() {
        let raw = "Content-Type: multipart/mixed; boundary=cut\n\n--cut\n\ncut off mid";
        assert_eq!(decode(raw).body, "cut off mid");
    }

    #[test]
    fn test_multipart_without_boundary_is_text() {
        let raw = "Content-Type: multipart/mixed\n\nraw body";
        assert_eq!(decode(raw).body, "raw body");
    }

    #[test]
    fn test_non_text_single_part_is_empty() {
        let raw = "Content-Type: application/pdf\n\n%PDF-1.4";
        assert_eq!(decode(raw).body, "");
    }

    #[test]
    fn test_headerless_input_is_body() {
        let msg = decode("just some text without headers");
        assert_eq!(msg.subject, None);
        assert_eq!(msg.body, "just some text without headers");
    }

    #[test]
    fn test_headers_only() {
        let msg = decode("Subject: nothing else");
        assert_eq!(msg.subject.as_deref(), Some("nothing else"));
        assert_eq!(msg.body, "");
    }

    #[test]
    fn test_leading_blank_line_means_no_headers() {
        let msg = decode("\r\nSubject: not a header");
        assert_eq!(msg.subject, None);
        assert_eq!(msg.body, "Subject: not a header");
    }

    #[test]
    fn test_split_params_respects_quotes() {
        assert_eq!(
            split_params("multipart/mixed; boundary=\"a;b\"; charset=x"),
            ["multipart/mixed", " boundary=\"a;b\"", " charset=x"]
        );
    }

    proptest::proptest! {
        #[test]
        fn test_arbitrary_bytes_never_panic(raw in proptest::collection::vec(proptest::num::u8::ANY, 0..512)) {
            let msg = decode_message(MessageId::new("p"), &raw);
            proptest::prop_assert_eq!(msg.id.as_str(), "p");
        }

        #[test]
        fn test_arbitrary_multipart_never_panics(
            boundary in "[a-z0-9]{1,8}",
            parts in proptest::collection::vec(".{0,64}", 0..4),
        ) {
            let mut raw = format!("Content-Type: multipart/mixed; boundary={boundary}\r\n\r\n");
            for part in &parts {
                raw.push_str(&format!("--{boundary}\r\n{part}\r\n"));
            }
            let _ = decode_message(MessageId::new("p"), raw.as_bytes());
        }
    }
}
