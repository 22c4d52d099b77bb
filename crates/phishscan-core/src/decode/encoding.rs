//! Transfer encodings and RFC 2047 encoded words.
//!
//! All decoders here are lenient: malformed input is passed through rather
//! than rejected.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine as _, alphabet};

use super::charset::decode_charset;

/// Base64 engine that accepts missing padding and trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode Base64, ignoring whitespace. Returns `None` if the data is not Base64.
#[must_use]
pub fn decode_base64(input: &[u8]) -> Option<Vec<u8>> {
    let cleaned: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(cleaned).ok()
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode an `=XX` escape at `input[i]`, if there is a valid one.
fn escape_at(input: &[u8], i: usize) -> Option<u8> {
    let high = hex_value(*input.get(i + 1)?)?;
    let low = hex_value(*input.get(i + 2)?)?;
    Some((high << 4) | low)
}

/// Decode Quoted-Printable (RFC 2045).
///
/// Soft line breaks are removed. A stray `=` is kept as is.
#[must_use]
pub fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != b'=' {
            out.push(byte);
            i += 1;
            continue;
        }

        match (input.get(i + 1), input.get(i + 2)) {
            (Some(b'\n'), _) => i += 2,
            (Some(b'\r'), Some(b'\n')) => i += 3,
            _ => {
                if let Some(decoded) = escape_at(input, i) {
                    out.push(decoded);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
        }
    }

    out
}

/// Decode the Q encoding used inside RFC 2047 words.
fn decode_q(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                if let Some(decoded) = escape_at(input, i) {
                    out.push(decoded);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

/// Decode one encoded word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let text = &rest[..end];

    if charset.is_empty() || charset.contains(char::is_whitespace) || text.contains(' ') {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(text.as_bytes())?,
        "Q" | "q" => decode_q(text.as_bytes()),
        _ => return None,
    };

    // RFC 2231 allows a language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);
    let consumed = s.len() - rest.len() + end + 2;
    Some((decode_charset(&bytes, charset), consumed))
}

/// Decode every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped; anything that
/// does not parse as an encoded word is kept verbatim.
#[must_use]
pub fn decode_header_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_word(candidate) {
            if !(after_word && before.trim().is_empty()) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_ignores_whitespace_and_padding() {
        assert_eq!(decode_base64(b"SGVs\r\nbG8=").unwrap(), b"Hello");
        assert_eq!(decode_base64(b"SGVsbG8").unwrap(), b"Hello");
        assert!(decode_base64(b"not base64!").is_none());
    }

    #[test]
    fn test_quoted_printable() {
        assert_eq!(decode_quoted_printable(b"caf=C3=A9"), "café".as_bytes());
        assert_eq!(decode_quoted_printable(b"soft=\r\nbreak"), b"softbreak");
        assert_eq!(decode_quoted_printable(b"soft=\nbreak"), b"softbreak");
    }

    #[test]
    fn test_quoted_printable_keeps_stray_equals() {
        assert_eq!(decode_quoted_printable(b"a=zz b="), b"a=zz b=");
        assert_eq!(decode_quoted_printable(b"1+1=2"), b"1+1=2");
    }

    #[test]
    fn test_encoded_word_base64() {
        assert_eq!(decode_header_value("=?UTF-8?B?VXJnZW50?="), "Urgent");
    }

    #[test]
    fn test_encoded_word_q() {
        assert_eq!(
            decode_header_value("=?iso-8859-1?Q?caf=E9_ouvert?="),
            "café ouvert"
        );
    }

    #[test]
    fn test_adjacent_words_join() {
        assert_eq!(
            decode_header_value("=?utf-8?Q?Click?= =?utf-8?Q?_here?="),
            "Click here"
        );
    }

    #[test]
    fn test_mixed_plain_and_encoded() {
        assert_eq!(
            decode_header_value("Re: =?utf-8?B?w6l0w6k=?= plans"),
            "Re: été plans"
        );
    }

    #[test]
    fn test_malformed_word_kept() {
        assert_eq!(decode_header_value("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_header_value("price =? tbd"), "price =? tbd");
        assert_eq!(decode_header_value("=?utf-8?Q?unterminated"), "=?utf-8?Q?unterminated");
    }
}
