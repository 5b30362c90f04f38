//! Application icon preparation
//!
//! The packager embeds a Windows `.ico` file. PNG and JPEG icons are
//! converted into a multi-resolution ICO inside the workspace; ICO files are
//! checked and copied as they are.

use crate::error::{PackError, PackResult};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Standard ICO sizes for multi-resolution icons
const ICO_SIZES: &[u32] = &[16, 32, 48, 64, 128, 256];

/// File name of the prepared icon inside the workspace
pub const ICON_FILE: &str = "app_icon.ico";

/// Supported icon formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Png,
    Jpeg,
    Ico,
}

impl IconFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "ico" => Some(Self::Ico),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(Self::Ico);
        }
        None
    }
}

/// Read an icon file and return it as ICO bytes
pub fn load_ico(path: &Path) -> PackResult<Vec<u8>> {
    let data = fs::read(path).map_err(|e| {
        PackError::Icon(format!("Failed to read icon file {}: {}", path.display(), e))
    })?;

    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(IconFormat::from_extension)
        .or_else(|| IconFormat::from_bytes(&data))
        .ok_or_else(|| {
            PackError::Icon(format!(
                "Unknown icon format for {}: supported formats are PNG, JPG, ICO",
                path.display()
            ))
        })?;

    to_ico(&data, format)
}

/// Convert icon data in `format` to ICO bytes
pub fn to_ico(data: &[u8], format: IconFormat) -> PackResult<Vec<u8>> {
    match format {
        IconFormat::Ico => {
            let icon_dir = ico::IconDir::read(Cursor::new(data))
                .map_err(|e| PackError::Icon(format!("Failed to read ICO: {}", e)))?;
            if icon_dir.entries().is_empty() {
                return Err(PackError::Icon("ICO file has no entries".to_string()));
            }
            Ok(data.to_vec())
        }
        IconFormat::Png | IconFormat::Jpeg => {
            let img_format = if format == IconFormat::Png {
                ImageFormat::Png
            } else {
                ImageFormat::Jpeg
            };
            let img = image::load_from_memory_with_format(data, img_format)
                .map_err(|e| PackError::Icon(format!("Failed to load image: {}", e)))?;
            create_multi_resolution_ico(&img)
        }
    }
}

/// Create multi-resolution ICO from image
fn create_multi_resolution_ico(img: &DynamicImage) -> PackResult<Vec<u8>> {
    let mut icon_dir = ico::IconDir::new(ico::ResourceType::Icon);

    for &size in ICO_SIZES {
        let rgba = img
            .resize_exact(size, size, image::imageops::FilterType::Lanczos3)
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let ico_image = ico::IconImage::from_rgba_data(width, height, rgba.into_raw());

        icon_dir.add_entry(ico::IconDirEntry::encode(&ico_image).map_err(|e| {
            PackError::Icon(format!("Failed to encode ICO entry for size {}: {}", size, e))
        })?);
    }

    let mut buffer = Vec::new();
    icon_dir
        .write(&mut buffer)
        .map_err(|e| PackError::Icon(format!("Failed to write ICO: {}", e)))?;

    tracing::debug!(
        "Created multi-resolution ICO with sizes: {:?} ({} bytes)",
        ICO_SIZES,
        buffer.len()
    );

    Ok(buffer)
}

/// Write the icon at `source` into the workspace as `app_icon.ico`
pub fn prepare_icon(source: &Path, workspace_root: &Path) -> PackResult<PathBuf> {
    let ico_data = load_ico(source)?;
    let dest = workspace_root.join(ICON_FILE);
    fs::write(&dest, &ico_data).map_err(|e| {
        PackError::Icon(format!("Failed to write ICO to {}: {}", dest.display(), e))
    })?;
    tracing::info!("Using icon: {}", source.display());
    Ok(dest)
}
