//! Image preprocessing for the landscape classifier.
//!
//! The network was trained on ImageNet-style inputs:
//! - Shorter side resized to `resize` (256), aspect ratio kept
//! - Center crop to `image_size × image_size` (224)
//! - RGB scaled to [0, 1], then normalized per channel with ImageNet stats
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array4};

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// ImageNet normalization mean (per-channel RGB).
const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet normalization std (per-channel RGB).
const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Dimensions after scaling the shorter side to `target`.
pub fn resized_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width <= height {
        let h = (height as u64 * target as u64 / width.max(1) as u64) as u32;
        (target, h.max(target))
    } else {
        let w = (width as u64 * target as u64 / height.max(1) as u64) as u32;
        (w.max(target), target)
    }
}

/// Top-left corner of a centered `crop × crop` window.
pub fn center_crop_origin(width: u32, height: u32, crop: u32) -> (u32, u32) {
    (
        width.saturating_sub(crop) / 2,
        height.saturating_sub(crop) / 2,
    )
}

/// Preprocess one image into a `[1, 3, image_size, image_size]` tensor.
pub fn preprocess(image: &DynamicImage, resize: u32, image_size: u32) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let (rw, rh) = resized_dimensions(w, h, resize);
    let resized = image.resize_exact(rw, rh, FilterType::Triangle);
    let (x, y) = center_crop_origin(rw, rh, image_size);
    let rgb = resized.crop_imm(x, y, image_size, image_size).to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    // Walk the raw RGB bytes once; NCHW offset = c * size * size + y * size + x.
    let raw = rgb.as_raw();
    let plane = size * size;
    if let Some(data) = tensor.as_slice_mut() {
        for (i, pixel) in raw.chunks_exact(CHANNELS).enumerate() {
            for (c, &val) in pixel.iter().enumerate() {
                data[c * plane + i] = (val as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
            }
        }
    }

    tensor
}

/// Stack single-image tensors into one `[N, 3, H, W]` batch.
///
/// All inputs must share the same shape; `None` if they don't or if the
/// batch is empty.
pub fn stack(tensors: &[Array4<f32>]) -> Option<Array4<f32>> {
    let first = tensors.first()?;
    let (_, c, h, w) = first.dim();
    if tensors.iter().any(|t| t.dim() != (1, c, h, w)) {
        return None;
    }

    let mut batch = Array4::<f32>::zeros((tensors.len(), c, h, w));
    for (i, t) in tensors.iter().enumerate() {
        batch.slice_mut(s![i..i + 1, .., .., ..]).assign(t);
    }
    Some(batch)
}
