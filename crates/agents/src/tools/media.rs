//! Simulated media download and metadata extraction.

use crate::registry::FnCapability;
use crate::tools::names;
use chrono::{Duration, Utc};
use lantern_common::LanternError;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct DownloadArgs {
    url: String,
}

#[derive(Deserialize)]
struct MetadataArgs {
    file_path: String,
}

fn sanitized_extension(url: &str) -> String {
    let last_segment = url.rsplit('/').next().unwrap_or("");
    let extension = match last_segment.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "jpg",
    };
    let cleaned: String = extension.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if cleaned.is_empty() { "jpg".to_string() } else { cleaned }
}

/// Simulated media download: writes a placeholder file under `media_dir`
/// with a unique name and returns its path. A real deployment registers an
/// HTTP fetcher under the same name.
pub fn download_media_capability(media_dir: PathBuf) -> FnCapability {
    FnCapability::from_async(names::DOWNLOAD_MEDIA, move |args| {
        let media_dir = media_dir.clone();
        async move {
            let args: DownloadArgs = serde_json::from_value(args)
                .map_err(|e| LanternError::Capability(format!("Invalid download arguments: {e}")))?;

            let extension = sanitized_extension(&args.url);
            let filename = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);
            let file_path = media_dir.join(filename);

            tokio::fs::create_dir_all(&media_dir).await?;
            tokio::fs::write(&file_path, format!("Placeholder media content from {}", args.url))
                .await?;

            Ok(json!(file_path.to_string_lossy()))
        }
    })
}

/// Simulated metadata extraction keyed on the file extension.
pub fn extract_metadata_capability() -> FnCapability {
    FnCapability::from_async(names::EXTRACT_METADATA, |args| async move {
        let args: MetadataArgs = serde_json::from_value(args)
            .map_err(|e| LanternError::Capability(format!("Invalid metadata arguments: {e}")))?;

        let path = Path::new(&args.file_path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut metadata = json!({
            "filename": filename,
            "file_type": extension,
            "extracted_date": Utc::now().to_rfc3339(),
        });

        let extra = match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" => json!({
                "dimensions": "1920x1080",
                "color_space": "RGB",
                "has_geotag": false,
                "creation_date": (Utc::now() - Duration::days(5)).to_rfc3339(),
            }),
            "mp4" | "mov" | "avi" => json!({
                "dimensions": "1920x1080",
                "duration": "00:01:23",
                "fps": 30,
                "has_audio": true,
                "creation_date": (Utc::now() - Duration::days(3)).to_rfc3339(),
            }),
            _ => json!({}),
        };

        if let (Some(base), Some(extra)) = (metadata.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }

        Ok(metadata)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Capability;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension("https://x.com/media/1.jpg"), "jpg");
        assert_eq!(sanitized_extension("https://x.com/media/1.jpg?s=4"), "jpgs4");
        assert_eq!(sanitized_extension("https://x.com/media/clip"), "jpg");
    }

    #[tokio::test]
    async fn download_writes_file_and_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let capability = download_media_capability(dir.path().to_path_buf());

        let value = capability
            .invoke(json!({"url": "https://twitter.com/media/0.jpg"}))
            .await
            .unwrap();
        let path = value.as_str().unwrap().to_string();

        assert!(path.ends_with(".jpg"));
        assert!(std::path::Path::new(&path).exists());
    }

    #[tokio::test]
    async fn metadata_varies_by_extension() {
        let capability = extract_metadata_capability();

        let image = capability
            .invoke(json!({"file_path": "/tmp/a.jpg"}))
            .await
            .unwrap();
        assert_eq!(image["file_type"], "jpg");
        assert_eq!(image["dimensions"], "1920x1080");

        let video = capability
            .invoke(json!({"file_path": "/tmp/b.mp4"}))
            .await
            .unwrap();
        assert_eq!(video["has_audio"], true);

        let other = capability
            .invoke(json!({"file_path": "/tmp/c.bin"}))
            .await
            .unwrap();
        assert!(other.get("dimensions").is_none());
    }
}
