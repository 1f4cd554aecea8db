#[derive(Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Unknown,
}

/// Detect an image format from the first bytes of a payload.
pub fn detect_image(header: &[u8]) -> ImageFormat {
    // JPEG: SOI marker FF D8 followed by another marker byte
    if header.len() >= 3 && header[0..3] == [0xFF, 0xD8, 0xFF] {
        return ImageFormat::Jpeg;
    }

    // PNG: 8-byte signature
    if header.len() >= 8 && header[0..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return ImageFormat::Png;
    }

    ImageFormat::Unknown
}
