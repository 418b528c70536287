//! Content type sniffing and canonical extensions

/// Fallback for content that matches no signature
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Fixed-offset magic byte signatures: (offset, bytes, mime type)
const SIGNATURES: &[(usize, &[u8], &str)] = &[
    (0, &[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (0, b"\x89PNG\r\n\x1a\n", "image/png"),
    (0, b"GIF87a", "image/gif"),
    (0, b"GIF89a", "image/gif"),
    (8, b"WEBP", "image/webp"),
    (0, &[0x49, 0x49, 0x2A, 0x00], "image/tiff"),
    (0, &[0x4D, 0x4D, 0x00, 0x2A], "image/tiff"),
    (0, &[0x00, 0x00, 0x01, 0x00], "image/x-icon"),
    (0, b"%PDF-", "application/pdf"),
    (0, &[0x50, 0x4B, 0x03, 0x04], "application/zip"),
    (0, &[0x1F, 0x8B], "application/gzip"),
    (0, b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (0, b"Rar!\x1a\x07", "application/vnd.rar"),
    (0, b"ID3", "audio/mpeg"),
    (0, &[0xFF, 0xFB], "audio/mpeg"),
    (0, b"fLaC", "audio/flac"),
    (0, b"OggS", "audio/ogg"),
    (8, b"WAVE", "audio/wav"),
    (0, &[0x1A, 0x45, 0xDF, 0xA3], "video/webm"),
    (8, b"AVI ", "video/x-msvideo"),
    (0, b"\0asm", "application/wasm"),
];

/// ISO base media (`ftyp` box) brands
const FTYP_BRANDS: &[(&[u8; 4], &str)] = &[
    (b"avif", "image/avif"),
    (b"heic", "image/heic"),
    (b"mif1", "image/heif"),
    (b"qt  ", "video/quicktime"),
    (b"M4A ", "audio/mp4"),
    (b"isom", "video/mp4"),
    (b"mp41", "video/mp4"),
    (b"mp42", "video/mp4"),
];

/// Detect a content type from the leading bytes of an upload.
///
/// Binary signatures win; otherwise valid UTF-8 without NUL bytes is
/// `text/plain`, and anything else is `application/octet-stream`.
pub fn detect(data: &[u8]) -> &'static str {
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if let Some((_, mime)) = FTYP_BRANDS.iter().find(|(b, _)| b.as_slice() == brand) {
            return *mime;
        }
    }

    if is_bmp(data) {
        return "image/bmp";
    }

    for (offset, magic, mime) in SIGNATURES {
        if data.len() >= offset + magic.len() && data[*offset..].starts_with(magic) {
            // RIFF containers carry the format at offset 8
            if *offset == 8 && !data.starts_with(b"RIFF") {
                continue;
            }
            return *mime;
        }
    }

    if looks_like_text(data) {
        return "text/plain";
    }
    OCTET_STREAM
}

/// `BM` alone is too common in text; the file header's reserved
/// fields at bytes 6..10 are always zero.
fn is_bmp(data: &[u8]) -> bool {
    data.len() >= 14 && data.starts_with(b"BM") && data[6..10] == [0, 0, 0, 0]
}

/// The sniff window may cut a multi-byte character, so an incomplete
/// trailing sequence still counts as text.
fn looks_like_text(data: &[u8]) -> bool {
    if data.is_empty() || data.contains(&0) {
        return false;
    }
    match std::str::from_utf8(data) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && data.len() - e.valid_up_to() < 4,
    }
}

/// Canonical file extension (without dot) for a content type
pub fn extension_for(mime: &str) -> &'static str {
    let preferred = match mime {
        OCTET_STREAM => Some("bin"),
        "image/jpeg" => Some("jpg"),
        "image/tiff" => Some("tiff"),
        "image/x-icon" => Some("ico"),
        "text/plain" => Some("txt"),
        "audio/mpeg" => Some("mp3"),
        "audio/mp4" => Some("m4a"),
        "audio/ogg" => Some("ogg"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "application/gzip" => Some("gz"),
        _ => None,
    };
    preferred
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied())
        })
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_images() {
        assert_eq!(detect(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), "image/jpeg");
        assert_eq!(detect(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(detect(b"GIF89a\x01\0\x01\0"), "image/gif");
        assert_eq!(detect(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_detect_bmp_needs_reserved_zeros() {
        let header = b"BM\x36\x00\x0c\x00\x00\x00\x00\x00\x36\x00\x00\x00";
        assert_eq!(detect(header), "image/bmp");
        assert_eq!(detect(b"BMW service notes\nchange oil\n"), "text/plain");
        assert_eq!(detect(b"BM\0\0"), OCTET_STREAM);
    }

    #[test]
    fn test_detect_riff_requires_header() {
        assert_eq!(detect(b"RIFF\x24\0\0\0WAVEfmt "), "audio/wav");
        // "WEBP" at offset 8 without RIFF is just text
        assert_eq!(detect(b"xxxxxxxxWEBP"), "text/plain");
    }

    #[test]
    fn test_detect_ftyp() {
        assert_eq!(detect(b"\0\0\0\x20ftypisom\0\0\x02\0"), "video/mp4");
        assert_eq!(detect(b"\0\0\0\x1cftypavif\0\0\0\0"), "image/avif");
    }

    #[test]
    fn test_detect_documents() {
        assert_eq!(detect(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(detect(b"PK\x03\x04\x14\0"), "application/zip");
    }

    #[test]
    fn test_detect_text_and_fallback() {
        assert_eq!(detect(b"hello world"), "text/plain");
        assert_eq!(detect("héllo".as_bytes()), "text/plain");
        // truncated two-byte sequence at the end of the window
        assert_eq!(detect(&[b'a', b'b', 0xC3]), "text/plain");
        assert_eq!(detect(&[0x00, 0x01, 0x02, 0x03]), OCTET_STREAM);
        assert_eq!(detect(&[0xFE, 0xFE, 0xFE]), OCTET_STREAM);
        assert_eq!(detect(&[]), OCTET_STREAM);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/pdf"), "pdf");
        assert_eq!(extension_for("text/plain"), "txt");
        assert_eq!(extension_for(OCTET_STREAM), "bin");
        assert_eq!(extension_for("application/x-made-up"), "bin");
    }
}
