// tierthumb/src/utils/mod.rs
use crate::core::{Result, ThumbnailError, Tier};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "m4v", "mov", "mkv", "webm", "avi", "3gp"];

fn source_file_name(source: &Path) -> Result<&OsStr> {
    source.file_name().ok_or_else(|| {
        ThumbnailError::InvalidParameter(format!("Invalid file name: {}", source.display()))
    })
}

fn tiered(tier: Tier, file_name: &OsStr) -> PathBuf {
    let mut name = OsString::from(tier.label());
    name.push("_");
    name.push(file_name);
    PathBuf::from(name)
}

/// `photo.JPG` becomes `big_photo.JPG`. The original name is kept verbatim.
pub fn image_thumbnail_name(source: &Path, tier: Tier) -> Result<PathBuf> {
    Ok(tiered(tier, source_file_name(source)?))
}

/// `clip.mp4` becomes `small_clip.jpg`; a name without extension gets `.jpg`
/// appended. A bare `.mp4` counts as an extension, giving `small_.jpg`.
pub fn video_thumbnail_name(source: &Path, tier: Tier) -> Result<PathBuf> {
    let file_name = source_file_name(source)?;
    let renamed = match file_name.to_str().and_then(|name| name.rsplit_once('.')) {
        Some((stem, _)) => OsString::from(format!("{}.jpg", stem)),
        None => Path::new(file_name).with_extension("jpg").into_os_string(),
    };
    Ok(tiered(tier, &renamed))
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

/// Lowercased text after the last dot of the file name. Unlike
/// `Path::extension`, dot-files such as `.jpg` have one.
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_supported_image(path: &Path) -> bool {
    get_file_extension(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_supported_video(path: &Path) -> bool {
    get_file_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn image_format_to_string(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG",
        image::ImageFormat::Png => "PNG",
        image::ImageFormat::Gif => "GIF",
        image::ImageFormat::WebP => "WebP",
        image::ImageFormat::Tiff => "TIFF",
        image::ImageFormat::Bmp => "BMP",
        _ => "Unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_names_keep_original_file_name() {
        let name = image_thumbnail_name(Path::new("/sdcard/DCIM/photo.JPG"), Tier::Big).unwrap();
        assert_eq!(name, PathBuf::from("big_photo.JPG"));

        let name = image_thumbnail_name(Path::new("icon.png"), Tier::Small).unwrap();
        assert_eq!(name, PathBuf::from("small_icon.png"));
    }

    #[test]
    fn video_names_switch_to_jpg() {
        assert_eq!(
            video_thumbnail_name(Path::new("movies/clip.mp4"), Tier::Big).unwrap(),
            PathBuf::from("big_clip.jpg")
        );
        assert_eq!(
            video_thumbnail_name(Path::new("mp4.mp4"), Tier::Small).unwrap(),
            PathBuf::from("small_mp4.jpg")
        );
        assert_eq!(
            video_thumbnail_name(Path::new("recording"), Tier::Small).unwrap(),
            PathBuf::from("small_recording.jpg")
        );
        assert_eq!(
            video_thumbnail_name(Path::new("camera/.mp4"), Tier::Big).unwrap(),
            PathBuf::from("big_.jpg")
        );
    }

    #[test]
    fn rejects_paths_without_file_name() {
        assert!(matches!(
            image_thumbnail_name(Path::new("/"), Tier::Big),
            Err(ThumbnailError::InvalidParameter(_))
        ));
    }

    #[test]
    fn classifies_extensions() {
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(!is_supported_image(Path::new("a.mp4")));
        assert!(is_supported_video(Path::new("a.MOV")));
        assert!(!is_supported_video(Path::new("a")));
    }

    #[test]
    fn dot_files_have_an_extension() {
        assert_eq!(get_file_extension(Path::new("dir/.jpg")), Some("jpg".to_string()));
        assert_eq!(get_file_extension(Path::new(".Hidden.PNG")), Some("png".to_string()));
        assert_eq!(get_file_extension(Path::new("archive.")), None);
        assert_eq!(get_file_extension(Path::new("README")), None);
        assert!(is_supported_image(Path::new(".jpeg")));
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
    }
}
