//! Charset conversion that never fails.

use mail_parser::decoders::charsets::map::charset_decoder;

/// Decode bytes in the named charset.
///
/// Labels `mail-parser` knows (the ISO-8859 and Windows code pages, KOI8,
/// the CJK multibyte sets, ...) go through its decoders. UTF-8, ASCII and
/// unknown labels decode as lossy UTF-8. Invalid sequences become U+FFFD.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    let label = charset.trim().trim_matches('"').to_ascii_lowercase();
    match label.as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" | "" => String::from_utf8_lossy(bytes).into_owned(),
        _ => match charset_decoder(label.as_bytes()) {
            Some(decode) => decode(bytes),
            None => {
                tracing::debug!(charset = %label, "unknown charset, decoding as UTF-8");
                String::from_utf8_lossy(bytes).into_owned()
            }
        },
    }
}
