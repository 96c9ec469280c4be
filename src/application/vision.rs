//! Loading local images as attachments for vision-capable models.

use std::path::Path;

use crate::domain::types::{ImageAttachment, normalize_ext};

/// MIME type for the image formats models accept, by normalized extension.
pub fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = normalize_ext(path.extension()?.to_str()?);
    match ext.as_str() {
        "jpg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

pub fn is_image(path: &Path) -> bool {
    mime_type(path).is_some()
}

/// Read up to `limit` of `paths` that are images. Unreadable files are skipped.
pub fn load_images<'a>(paths: impl IntoIterator<Item = &'a Path>, limit: usize) -> Vec<ImageAttachment> {
    paths
        .into_iter()
        .filter_map(|path| Some((path, mime_type(path)?)))
        .take(limit)
        .filter_map(|(path, mime_type)| match std::fs::read(path) {
            Ok(data) => Some(ImageAttachment {
                file_name: crate::domain::paths::display_name(path),
                mime_type,
                data,
            }),
            Err(e) => {
                tracing::warn!("Could not read image {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type(Path::new("a.JPEG")), Some("image/jpeg"));
        assert_eq!(mime_type(Path::new("a.png")), Some("image/png"));
        assert_eq!(mime_type(Path::new("a.heic")), None);
        assert_eq!(mime_type(Path::new("README")), None);
    }

    #[test]
    fn test_load_respects_limit_and_skips_non_images() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["notes.txt", "a.jpg", "b.png", "c.gif"] {
            let path = dir.path().join(name);
            std::fs::write(&path, name).unwrap();
            paths.push(path);
        }

        let images = load_images(paths.iter().map(|p| p.as_path()), 2);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].file_name, "a.jpg");
        assert_eq!(images[0].mime_type, "image/jpeg");
        assert_eq!(images[1].data, b"b.png");
    }
}
