//! MIME type detection utilities.
//!
//! Uploads are identified by their declared MIME type or, failing that, by
//! the file name's extension.

use std::path::Path;

pub const SVG: &str = "image/svg+xml";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess MIME type from file extension.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext.map(str::to_ascii_lowercase).as_deref() {
        Some("svg") => SVG,
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("eps" | "ps") => "application/postscript",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        _ => OCTET_STREAM,
    }
}

/// Whether an upload is SVG: the declared MIME type (parameters ignored)
/// is `image/svg+xml`, or the file name ends in `.svg`.
pub fn is_svg(mime: &str, file_name: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(SVG) || from_path(Path::new(file_name)) == SVG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(&PathBuf::from("logo.svg")), SVG);
        assert_eq!(from_path(&PathBuf::from("LOGO.SVG")), SVG);
        assert_eq!(from_path(&PathBuf::from("photo.jpeg")), "image/jpeg");
        assert_eq!(from_path(&PathBuf::from("unknown.xyz")), OCTET_STREAM);
    }

    #[test]
    fn test_is_svg() {
        assert!(is_svg("image/svg+xml", "upload"));
        assert!(is_svg("image/svg+xml; charset=utf-8", "upload"));
        assert!(is_svg("application/octet-stream", "logo.svg"));
        assert!(is_svg("", "logo.svg"));
        assert!(!is_svg("image/png", "logo.png"));
        assert!(!is_svg("", ""));
    }
}
