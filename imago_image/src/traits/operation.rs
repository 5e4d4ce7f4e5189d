//! Pixel operations used by the transformation pipeline.
//!
//! All operations expect one of the 8-bit layouts produced by
//! [`normalize`](crate::decoder::normalize): `L8`, `La8`, `Rgb8` or `Rgba8`.

use crate::ResampleFilter;
use anyhow::{Context, Result};
use fast_image_resize::{ResizeOptions, Resizer};
use image::{DynamicImage, LumaA, Rgba, RgbaImage, imageops};
use imageproc::{
	geometric_transformations::{Interpolation, rotate_about_center},
	map::map_pixels,
};
use imago_core::{Quality, Rotation};

const BITONAL_THRESHOLD: u8 = 128;

pub trait DynamicImageTraitOperation {
	/// Resamples the source rectangle `(x, y, w, h)` into an image of `width_dst × height_dst`.
	///
	/// The rectangle may have fractional coordinates.
	fn get_extract(
		&self,
		x: f64,
		y: f64,
		w: f64,
		h: f64,
		width_dst: u32,
		height_dst: u32,
		filter: ResampleFilter,
	) -> Result<DynamicImage>;

	/// Mirrors horizontally (if requested) and then rotates clockwise.
	///
	/// Multiples of 90° are exact. Other angles produce an `Rgba8` image whose canvas is enlarged to
	/// the bounding box of the rotated image, with transparent corners.
	fn into_rotated(self, rotation: &Rotation) -> DynamicImage;

	/// Applies an IIIF quality. `default` and `color` keep the pixels as they are.
	fn into_quality(self, quality: Quality) -> DynamicImage;

	/// Drops the alpha channel, if any.
	fn into_no_alpha(self) -> DynamicImage;
}

impl DynamicImageTraitOperation for DynamicImage {
	fn get_extract(
		&self,
		x: f64,
		y: f64,
		w: f64,
		h: f64,
		width_dst: u32,
		height_dst: u32,
		filter: ResampleFilter,
	) -> Result<DynamicImage> {
		let mut dst_image = DynamicImage::new(width_dst, height_dst, self.color());
		Resizer::new()
			.resize(
				self,
				&mut dst_image,
				&ResizeOptions::default().resize_alg(filter.into()).crop(x, y, w, h),
			)
			.with_context(|| {
				format!(
					"resampling ({x:.2},{y:.2},{w:.2},{h:.2}) of {}x{} into {width_dst}x{height_dst}",
					self.width(),
					self.height()
				)
			})?;
		Ok(dst_image)
	}

	fn into_rotated(self, rotation: &Rotation) -> DynamicImage {
		let image = if rotation.mirror { self.fliph() } else { self };

		match rotation.quarter_turns() {
			Some(0) => image,
			Some(1) => image.rotate90(),
			Some(2) => image.rotate180(),
			Some(_) => image.rotate270(),
			None => DynamicImage::ImageRgba8(rotate_arbitrary(&image.into_rgba8(), rotation)),
		}
	}

	fn into_quality(self, quality: Quality) -> DynamicImage {
		match quality {
			Quality::Default | Quality::Color => self,
			Quality::Gray => {
				if self.color().has_alpha() {
					DynamicImage::ImageLumaA8(self.into_luma_alpha8())
				} else {
					DynamicImage::ImageLuma8(self.into_luma8())
				}
			}
			Quality::Bitonal => {
				let threshold = |v: u8| if v >= BITONAL_THRESHOLD { 255 } else { 0 };
				if self.color().has_alpha() {
					let image = self.into_luma_alpha8();
					DynamicImage::ImageLumaA8(map_pixels(&image, |p| LumaA([threshold(p[0]), p[1]])))
				} else {
					let mut image = self.into_luma8();
					for p in image.pixels_mut() {
						p[0] = threshold(p[0]);
					}
					DynamicImage::ImageLuma8(image)
				}
			}
		}
	}

	fn into_no_alpha(self) -> DynamicImage {
		match self {
			DynamicImage::ImageRgba8(_) => DynamicImage::ImageRgb8(self.into_rgb8()),
			DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLuma8(self.into_luma8()),
			_ => self,
		}
	}
}

fn rotate_arbitrary(image: &RgbaImage, rotation: &Rotation) -> RgbaImage {
	let (rotated_w, rotated_h) = rotation.bounds(image.width(), image.height());
	let (rotated_w, rotated_h) = (rotated_w as u32, rotated_h as u32);

	let canvas_w = rotated_w.max(image.width());
	let canvas_h = rotated_h.max(image.height());
	let mut canvas = RgbaImage::new(canvas_w, canvas_h);
	imageops::overlay(
		&mut canvas,
		image,
		i64::from((canvas_w - image.width()) / 2),
		i64::from((canvas_h - image.height()) / 2),
	);

	let theta = rotation.degrees.to_radians() as f32;
	let rotated = rotate_about_center(&canvas, theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]));
	imageops::crop_imm(
		&rotated,
		(canvas_w - rotated_w) / 2,
		(canvas_h - rotated_h) / 2,
		rotated_w,
		rotated_h,
	)
	.to_image()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::traits::DynamicImageTraitTest;
	use image::{ColorType, GenericImageView};
	use rstest::rstest;

	#[rstest]
	#[case::nearest(ResampleFilter::Nearest)]
	#[case::bilinear(ResampleFilter::Bilinear)]
	#[case::catmull_rom(ResampleFilter::CatmullRom)]
	#[case::lanczos3(ResampleFilter::Lanczos3)]
	fn extract_has_requested_size(#[case] filter: ResampleFilter) {
		let image = DynamicImage::new_test_rgb(200, 100);
		let result = image.get_extract(10.0, 20.0, 100.0, 50.0, 40, 20, filter).unwrap();
		assert_eq!(result.dimensions(), (40, 20));
		assert_eq!(result.color(), ColorType::Rgb8);
	}

	#[test]
	fn extract_without_scaling_copies_pixels() {
		let image = DynamicImage::new_test_rgb(50, 50);
		let result = image.get_extract(5.0, 6.0, 10.0, 10.0, 10, 10, ResampleFilter::Nearest).unwrap();
		assert_eq!(result.get_pixel(0, 0), image.get_pixel(5, 6));
		assert_eq!(result.get_pixel(9, 9), image.get_pixel(14, 15));
	}

	#[rstest]
	#[case("0", (30, 20), (0, 0), (0, 0))]
	#[case("90", (20, 30), (0, 0), (0, 19))]
	#[case("180", (30, 20), (0, 0), (29, 19))]
	#[case("270", (20, 30), (0, 0), (29, 0))]
	#[case("!0", (30, 20), (0, 0), (29, 0))]
	#[case("!90", (20, 30), (0, 0), (29, 19))]
	fn quarter_turns_are_exact(
		#[case] rotation: &str,
		#[case] size: (u32, u32),
		#[case] dst: (u32, u32),
		#[case] src: (u32, u32),
	) {
		let image = DynamicImage::new_test_rgb(30, 20);
		let rotated = image.clone().into_rotated(&Rotation::parse(rotation).unwrap());
		assert_eq!(rotated.dimensions(), size);
		assert_eq!(rotated.get_pixel(dst.0, dst.1), image.get_pixel(src.0, src.1));
	}

	#[test]
	fn arbitrary_rotation_expands_the_canvas() {
		let image = DynamicImage::new_test_rgb(100, 50);
		let rotated = image.into_rotated(&Rotation::parse("45").unwrap());
		assert_eq!(rotated.color(), ColorType::Rgba8);
		// 100·cos45 + 50·sin45 ≈ 106.07
		assert_eq!(rotated.dimensions(), (106, 106));
		assert_eq!(rotated.get_pixel(0, 0)[3], 0);
		assert_eq!(rotated.get_pixel(53, 53)[3], 255);
	}

	#[test]
	fn gray_and_bitonal() {
		let image = DynamicImage::new_test_rgb(256, 4);

		let gray = image.clone().into_quality(Quality::Gray);
		assert_eq!(gray.color(), ColorType::L8);

		let bitonal = image.clone().into_quality(Quality::Bitonal);
		assert_eq!(bitonal.color(), ColorType::L8);
		assert!(bitonal.as_bytes().iter().all(|&v| v == 0 || v == 255));

		let rgba = DynamicImage::new_test_rgba(8, 8).into_quality(Quality::Bitonal);
		assert_eq!(rgba.color(), ColorType::La8);

		assert_eq!(image.clone().into_quality(Quality::Color), image);
		assert_eq!(image.clone().into_quality(Quality::Default), image);
	}

	#[test]
	fn no_alpha() {
		assert_eq!(DynamicImage::new_test_rgba(2, 2).into_no_alpha().color(), ColorType::Rgb8);
		assert_eq!(DynamicImage::new_test_grey(2, 2).into_no_alpha().color(), ColorType::L8);
	}
}
