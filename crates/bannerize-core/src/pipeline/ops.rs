//! Stage bodies: proportional scaling, Gaussian blur, and the
//! three-band crop batches.
//!
//! Transform stages are pure `(name, image) -> (name, image)` functions;
//! the crop batches are the only place side effects (saving files) happen.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::PathBuf;

use crate::config::BannerConfig;
use crate::error::PipelineResult;
use crate::types::SavedCrop;

use super::codec::Codec;

/// Shared, read-only context passed to every stage execution.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Banner geometry settings
    pub banner: BannerConfig,
    /// Directory crops are written to
    pub output_dir: PathBuf,
    /// Decode/encode collaborator
    pub codec: Codec,
}

/// Scale the image along its x-axis to `banner.scale_width` pixels,
/// height rounded proportionally.
pub fn scale_x(
    cx: &StageContext,
    name: String,
    image: DynamicImage,
) -> PipelineResult<(String, DynamicImage)> {
    let (w, h) = image.dimensions();
    let target = cx.banner.scale_width;
    let scaled_h = scale_other_axis(h, w, target);
    Ok((
        name,
        image.resize_exact(target, scaled_h, FilterType::CatmullRom),
    ))
}

/// Scale the image along its y-axis to `banner.scale_height` pixels,
/// width rounded proportionally.
pub fn scale_y(
    cx: &StageContext,
    name: String,
    image: DynamicImage,
) -> PipelineResult<(String, DynamicImage)> {
    let (w, h) = image.dimensions();
    let target = cx.banner.scale_height;
    let scaled_w = scale_other_axis(w, h, target);
    Ok((
        name,
        image.resize_exact(scaled_w, target, FilterType::CatmullRom),
    ))
}

/// Apply a Gaussian blur with `banner.blur_sigma`.
pub fn blur(
    cx: &StageContext,
    name: String,
    image: DynamicImage,
) -> PipelineResult<(String, DynamicImage)> {
    if cx.banner.blur_sigma == 0.0 {
        return Ok((name, image));
    }
    let blurred = image.blur(cx.banner.blur_sigma);
    Ok((name, blurred))
}

/// Crop and save the three horizontal bands (top, vmiddle, bottom),
/// each full width and `banner.crop_size` high.
///
/// The payload is left untouched so the pipeline can continue past this
/// stage in `both` mode.
pub fn crop_batch_x(
    cx: &StageContext,
    name: &str,
    ext: &str,
    image: &DynamicImage,
) -> PipelineResult<Vec<SavedCrop>> {
    let (w, h) = image.dimensions();
    let band = cx.banner.crop_size.min(h);
    let bands = [
        ("top", 0),
        ("vmiddle", (h - band) / 2),
        ("bottom", h - band),
    ];

    let mut crops = Vec::with_capacity(bands.len());
    for (suffix, y0) in bands {
        let crop = image.crop_imm(0, y0, w, band);
        crops.push(save_crop(cx, name, suffix, ext, &crop)?);
    }
    Ok(crops)
}

/// Crop and save the three vertical bands (left, hmiddle, right),
/// each full height and `banner.crop_size` wide.
pub fn crop_batch_y(
    cx: &StageContext,
    name: &str,
    ext: &str,
    image: &DynamicImage,
) -> PipelineResult<Vec<SavedCrop>> {
    let (w, h) = image.dimensions();
    let band = cx.banner.crop_size.min(w);
    let bands = [
        ("left", 0),
        ("hmiddle", (w - band) / 2),
        ("right", w - band),
    ];

    let mut crops = Vec::with_capacity(bands.len());
    for (suffix, x0) in bands {
        let crop = image.crop_imm(x0, 0, band, h);
        crops.push(save_crop(cx, name, suffix, ext, &crop)?);
    }
    Ok(crops)
}

/// Proportionally rescale `other` when `axis` is resized to `target`.
/// Clamped to at least 1px so degenerate aspect ratios stay encodable.
fn scale_other_axis(other: u32, axis: u32, target: u32) -> u32 {
    if axis == 0 {
        return 1;
    }
    let scaled = (f64::from(other) * f64::from(target) / f64::from(axis)).round() as u32;
    scaled.max(1)
}

fn save_crop(
    cx: &StageContext,
    name: &str,
    suffix: &str,
    ext: &str,
    crop: &DynamicImage,
) -> PipelineResult<SavedCrop> {
    let path = cx.output_dir.join(format!("{name}-{suffix}.{ext}"));
    cx.codec.save(crop, &path)?;
    let (width, height) = crop.dimensions();
    tracing::debug!("Saved {}x{} crop to {:?}", width, height, path);
    Ok(SavedCrop {
        source: name.to_string(),
        path,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;

    fn context(dir: &std::path::Path) -> StageContext {
        StageContext {
            banner: BannerConfig::default(),
            output_dir: dir.to_path_buf(),
            codec: Codec::new(LimitsConfig::default()),
        }
    }

    #[test]
    fn test_scale_x_preserves_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(3000, 2000);
        let (_, scaled) = scale_x(&cx, "photo".into(), img).unwrap();
        assert_eq!(scaled.dimensions(), (1500, 1000));
    }

    #[test]
    fn test_scale_y_preserves_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(3000, 2000);
        let (_, scaled) = scale_y(&cx, "photo".into(), img).unwrap();
        assert_eq!(scaled.dimensions(), (1500, 1000));
    }

    #[test]
    fn test_scale_rounds_to_nearest() {
        // 997 * 1500 / 2999 = 498.66 -> 499
        assert_eq!(scale_other_axis(997, 2999, 1500), 499);
        assert_eq!(scale_other_axis(0, 100, 1500), 1);
    }

    #[test]
    fn test_blur_keeps_dimensions_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(64, 32);
        let (name, blurred) = blur(&cx, "photo".into(), img).unwrap();
        assert_eq!(name, "photo");
        assert_eq!(blurred.dimensions(), (64, 32));
    }

    #[test]
    fn test_crop_batch_x_writes_three_bands() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(1500, 1000);

        let crops = crop_batch_x(&cx, "photo", "png", &img).unwrap();
        assert_eq!(crops.len(), 3);
        for crop in &crops {
            assert_eq!((crop.width, crop.height), (1500, 300));
            assert!(crop.path.exists());
        }

        let mut names: Vec<_> = crops
            .iter()
            .filter_map(|c| c.path.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["photo-bottom.png", "photo-top.png", "photo-vmiddle.png"]
        );
    }

    #[test]
    fn test_crop_batch_y_writes_three_bands() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(1500, 1000);

        let crops = crop_batch_y(&cx, "photo", "png", &img).unwrap();
        assert_eq!(crops.len(), 3);
        for crop in &crops {
            assert_eq!((crop.width, crop.height), (300, 1000));
        }
    }

    #[test]
    fn test_crop_clamps_to_available_height() {
        // 200px tall image with a 300px band: bands clamp to full height
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        let img = DynamicImage::new_rgb8(800, 200);

        let crops = crop_batch_x(&cx, "short", "png", &img).unwrap();
        assert_eq!(crops.len(), 3);
        for crop in &crops {
            assert_eq!((crop.width, crop.height), (800, 200));
        }
    }

    #[test]
    fn test_middle_band_is_centered() {
        let dir = tempfile::tempdir().unwrap();
        let cx = context(dir.path());
        // 1000 high, 300 band: vmiddle starts at 350
        let img = DynamicImage::new_rgb8(100, 1000);
        let crops = crop_batch_x(&cx, "mid", "png", &img).unwrap();
        let vmiddle = crops
            .iter()
            .find(|c| c.path.to_string_lossy().contains("vmiddle"))
            .unwrap();
        assert_eq!(vmiddle.height, 300);
    }
}
