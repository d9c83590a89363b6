//! Zip packaging of finished artifacts.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use super::OutputArtifact;

/// Pack artifacts into one archive.
///
/// Each format that has artifacts gets a directory entry before its first
/// file. A path already taken gets `-2`, `-3`, ... before the extension.
pub fn archive(artifacts: &[OutputArtifact]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut folders = HashSet::new();
    let mut taken = HashSet::new();

    for artifact in artifacts {
        let folder = artifact.folder.folder();
        if folders.insert(folder) {
            zip.add_directory(format!("{folder}/"), options)
                .with_context(|| format!("Failed to add directory {folder}/"))?;
        }

        let path = unique_path(&mut taken, folder, &artifact.filename);
        zip.start_file(path.as_str(), options)
            .with_context(|| format!("Failed to add {path}"))?;
        zip.write_all(&artifact.data)
            .with_context(|| format!("Failed to write {path}"))?;
    }

    let cursor = zip.finish().context("Failed to finish archive")?;
    Ok(cursor.into_inner())
}

fn unique_path(taken: &mut HashSet<String>, folder: &str, filename: &str) -> String {
    let path = format!("{folder}/{filename}");
    if taken.insert(path.clone()) {
        return path;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };
    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{folder}/{stem}-{n}.{ext}"),
            None => format!("{folder}/{stem}-{n}"),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;
    use crate::package::FormatTag;

    fn artifact(folder: FormatTag, filename: &str, data: &[u8]) -> OutputArtifact {
        OutputArtifact {
            folder,
            filename: filename.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_layout() {
        let bytes = archive(&[
            artifact(FormatTag::Svg, "Brand_Black.svg", b"<svg/>"),
            artifact(FormatTag::Png, "Brand_Black_72dpi.png", b"png"),
            artifact(FormatTag::Svg, "Brand_White.svg", b"<svg/>"),
        ])
        .unwrap();

        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = zip.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 5);
        for expected in [
            "SVG/",
            "PNG/",
            "SVG/Brand_Black.svg",
            "SVG/Brand_White.svg",
            "PNG/Brand_Black_72dpi.png",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }

        let mut file = zip.by_name("PNG/Brand_Black_72dpi.png").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"png");
    }

    #[test]
    fn test_duplicate_paths_get_suffix() {
        let bytes = archive(&[
            artifact(FormatTag::Eps, "Brand_x.eps", b"1"),
            artifact(FormatTag::Eps, "Brand_x.eps", b"2"),
            artifact(FormatTag::Eps, "Brand_x.eps", b"3"),
        ])
        .unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: HashSet<_> = zip.file_names().collect();
        assert!(names.contains("EPS/Brand_x.eps"));
        assert!(names.contains("EPS/Brand_x-2.eps"));
        assert!(names.contains("EPS/Brand_x-3.eps"));
    }

    #[test]
    fn test_empty_archive() {
        let bytes = archive(&[]).unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }
}
