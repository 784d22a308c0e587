//! Decoding of inline file contents (RFC 2397 data URLs)
//!
//! Only the payload matters on the node; the media type is ignored.
//! `data:,hello%20world` and `data:text/plain;base64,aGVsbG8=` are both
//! accepted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use std::io::Read;

use crate::error::{Error, Result};

const SCHEME: &str = "data:";
const BASE64_SUFFIX: &str = ";base64";

/// Decode a data URL into raw bytes
pub fn decode(source: &str) -> Result<Vec<u8>> {
    let rest = source
        .get(..SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
        .map(|_| &source[SCHEME.len()..])
        .ok_or_else(|| Error::DataUrl(format!("missing {SCHEME} scheme")))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::DataUrl("missing ',' separator".to_string()))?;

    let unescaped = percent_decode(payload)?;

    if header.to_ascii_lowercase().ends_with(BASE64_SUFFIX) {
        STANDARD
            .decode(&unescaped)
            .map_err(|e| Error::DataUrl(format!("invalid base64 payload: {e}")))
    } else {
        Ok(unescaped)
    }
}

/// Gunzip decoded contents
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encode bytes as a base64 data URL
pub fn encode(data: &[u8]) -> String {
    format!("{SCHEME}{BASE64_SUFFIX},{}", STANDARD.encode(data))
}

fn percent_decode(input: &str) -> Result<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::DataUrl(format!("bad percent escape at offset {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_decode_plain() {
        assert_eq!(decode("data:,hello%20world").unwrap(), b"hello world");
        assert_eq!(decode("data:,").unwrap(), b"");
    }

    #[test]
    fn test_decode_base64() {
        assert_eq!(
            decode("data:text/plain;charset=utf-8;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode("DATA:;BASE64,aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("hello").is_err());
        assert!(decode("data:no-separator").is_err());
        assert!(decode("data:,%zz").is_err());
        assert!(decode("data:,%4").is_err());
        assert!(decode("data:;base64,!!!").is_err());
    }

    #[test]
    fn test_encode_decodes_back() {
        let url = encode(b"line one\nline two\n");
        assert!(url.starts_with("data:;base64,"));
        assert_eq!(decode(&url).unwrap(), b"line one\nline two\n");
    }

    #[test]
    fn test_gunzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed payload").unwrap();
        let gz = encoder.finish().unwrap();

        assert_eq!(gunzip(&gz).unwrap(), b"compressed payload");
        assert!(gunzip(b"not gzip").is_err());
    }
}
