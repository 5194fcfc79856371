/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// 对象 id 前缀
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Image => "images",
        }
    }
}

/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// `extension` 不含点号，大小写不敏感。未知扩展名一律拒绝。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        // 图片格式
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        "webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",

        // 视频格式：ISO BMFF 在偏移 4 处为 "ftyp"
        "mp4" | "m4v" | "mov" => data.len() >= 8 && &data[4..8] == b"ftyp",
        // Matroska / WebM 使用 EBML 头
        "webm" | "mkv" => data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]),

        _ => false,
    }
}

/// 推断内容类型，用于媒体下载响应
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, "png"));
        assert!(validate_magic_bytes(&png_header, "PNG"));
        assert!(!validate_magic_bytes(&png_header, "jpg"));
    }

    #[test]
    fn test_mp4_magic() {
        let mp4_header = [0x00, 0x00, 0x00, 0x20, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];
        assert!(validate_magic_bytes(&mp4_header, "mp4"));
        assert!(validate_magic_bytes(&mp4_header, "mov"));
        assert!(!validate_magic_bytes(&mp4_header, "webm"));
    }

    #[test]
    fn test_webm_magic() {
        let webm_header = [0x1A, 0x45, 0xDF, 0xA3, 0x9F];
        assert!(validate_magic_bytes(&webm_header, "webm"));
        assert!(!validate_magic_bytes(&webm_header, "mp4"));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(!validate_magic_bytes(&[], "png"));
        assert!(!validate_magic_bytes(&[0x00, 0x01], "exe"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("MP4"), "video/mp4");
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }
}
