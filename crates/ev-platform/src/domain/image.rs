//! Event image encoding
//!
//! Images are stored as raw bytes and travel over the API as base64,
//! returned as `data:<mime>;base64,...` URLs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{PlatformError, Result};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Detect the MIME type of a supported image payload.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        return Some("image/png");
    }
    if bytes.starts_with(JPEG_MAGIC) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if looks_like_svg(bytes) {
        return Some("image/svg+xml");
    }
    None
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    // The cut may land inside a multi-byte character; keep the valid prefix.
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default(),
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Decode a base64 payload or data URL into image bytes.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let payload = match input.trim().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| PlatformError::validation("image data URL must be base64 encoded"))?,
        None => input.trim(),
    };

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| PlatformError::validation(format!("image is not valid base64: {}", e)))?;

    if sniff_mime(&bytes).is_none() {
        return Err(PlatformError::validation("image must be PNG, JPEG, GIF or SVG"));
    }
    Ok(bytes)
}

/// Encode stored bytes as a data URL.
pub fn to_data_url(bytes: &[u8]) -> String {
    let mime = sniff_mime(bytes).unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sniff() {
        assert_eq!(sniff_mime(PNG), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(
            sniff_mime(b"  <svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            Some("image/svg+xml")
        );
        assert_eq!(sniff_mime(b"<?xml version=\"1.0\"?><svg/>"), Some("image/svg+xml"));
        assert_eq!(sniff_mime(b"hello"), None);
    }

    #[test]
    fn test_svg_with_multibyte_char_across_sniff_window() {
        let mut svg = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\"><title>");
        while svg.len() < 511 {
            svg.push('a');
        }
        svg.push('\u{e9}');
        svg.push_str("</title></svg>");
        assert!(!svg.is_char_boundary(512));

        assert_eq!(sniff_mime(svg.as_bytes()), Some("image/svg+xml"));
        assert!(decode(&BASE64.encode(svg.as_bytes())).is_ok());
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        let encoded = BASE64.encode(PNG);
        assert_eq!(decode(&encoded).unwrap(), PNG);

        let url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode(&url).unwrap(), PNG);
        assert_eq!(to_data_url(PNG), url);
    }

    #[test]
    fn test_decode_rejects_unknown_payloads() {
        assert!(decode("not base64!").is_err());
        assert!(decode(&BASE64.encode(b"plain text")).is_err());
        assert!(decode("data:image/png,rawdata").is_err());
    }
}
