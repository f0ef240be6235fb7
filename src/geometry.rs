// 该文件是 Heshu （鹤数） 项目的一部分。
// src/geometry.rs - 像素坐标与归一化坐标变换
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeometryError {
  #[error("参考尺寸必须为正数: {width}x{height}")]
  EmptyReference { width: u32, height: u32 },
}

/// 归一化所依据的参考图像尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSize {
  width: u32,
  height: u32,
}

impl ReferenceSize {
  pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
    if width == 0 || height == 0 {
      return Err(GeometryError::EmptyReference { width, height });
    }
    Ok(Self { width, height })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }
}

/// 像素边界框，左上角为原点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelBox {
  pub x_min: f64,
  pub y_min: f64,
  pub width: f64,
  pub height: f64,
}

/// 以中心点表示的归一化边界框
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedBox {
  pub x_center: f64,
  pub y_center: f64,
  pub width: f64,
  pub height: f64,
}

impl PixelBox {
  pub fn new(x_min: f64, y_min: f64, width: f64, height: f64) -> Self {
    Self {
      x_min,
      y_min,
      width,
      height,
    }
  }

  pub fn from_corners(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
    Self::new(x_min, y_min, x_max - x_min, y_max - y_min)
  }

  pub fn x_max(&self) -> f64 {
    self.x_min + self.width
  }

  pub fn y_max(&self) -> f64 {
    self.y_min + self.height
  }

  pub fn area(&self) -> f64 {
    self.width.max(0.0) * self.height.max(0.0)
  }

  /// 平移边界框，用于把切片坐标映射回整图坐标
  pub fn translate(&self, dx: f64, dy: f64) -> Self {
    Self::new(self.x_min + dx, self.y_min + dy, self.width, self.height)
  }

  pub fn intersection_area(&self, other: &PixelBox) -> f64 {
    let w = self.x_max().min(other.x_max()) - self.x_min.max(other.x_min);
    let h = self.y_max().min(other.y_max()) - self.y_min.max(other.y_min);
    w.max(0.0) * h.max(0.0)
  }

  pub fn to_normalized(&self, reference: ReferenceSize) -> NormalizedBox {
    to_normalized(self, reference)
  }
}

impl NormalizedBox {
  pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
    Self {
      x_center,
      y_center,
      width,
      height,
    }
  }

  pub fn to_pixel(&self, reference: ReferenceSize) -> PixelBox {
    to_pixel(self, reference)
  }
}

/// 像素框转归一化中心框，不做 [0,1] 裁剪
pub fn to_normalized(bbox: &PixelBox, reference: ReferenceSize) -> NormalizedBox {
  let iw = reference.width as f64;
  let ih = reference.height as f64;
  NormalizedBox {
    x_center: (bbox.x_min + bbox.width / 2.0) / iw,
    y_center: (bbox.y_min + bbox.height / 2.0) / ih,
    width: bbox.width / iw,
    height: bbox.height / ih,
  }
}

/// `to_normalized` 的逆变换
pub fn to_pixel(bbox: &NormalizedBox, reference: ReferenceSize) -> PixelBox {
  let iw = reference.width as f64;
  let ih = reference.height as f64;
  let width = bbox.width * iw;
  let height = bbox.height * ih;
  PixelBox {
    x_min: bbox.x_center * iw - width / 2.0,
    y_min: bbox.y_center * ih - height / 2.0,
    width,
    height,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPS: f64 = 1e-9;

  fn assert_pixel_eq(a: &PixelBox, b: &PixelBox) {
    assert!((a.x_min - b.x_min).abs() < EPS, "{a:?} != {b:?}");
    assert!((a.y_min - b.y_min).abs() < EPS, "{a:?} != {b:?}");
    assert!((a.width - b.width).abs() < EPS, "{a:?} != {b:?}");
    assert!((a.height - b.height).abs() < EPS, "{a:?} != {b:?}");
  }

  #[test]
  fn normalizes_small_box() {
    let reference = ReferenceSize::new(100, 100).unwrap();
    let n = PixelBox::new(10.0, 10.0, 20.0, 20.0).to_normalized(reference);
    assert!((n.x_center - 0.2).abs() < EPS);
    assert!((n.y_center - 0.2).abs() < EPS);
    assert!((n.width - 0.2).abs() < EPS);
    assert!((n.height - 0.2).abs() < EPS);
  }

  #[test]
  fn denormalizes_ground_truth_box() {
    let reference = ReferenceSize::new(200, 200).unwrap();
    let p = NormalizedBox::new(0.5, 0.5, 0.1, 0.1).to_pixel(reference);
    assert_pixel_eq(&p, &PixelBox::new(90.0, 90.0, 20.0, 20.0));
  }

  #[test]
  fn round_trip_on_non_square_references() {
    let boxes = [
      PixelBox::new(0.0, 0.0, 0.0, 0.0),
      PixelBox::new(3.5, 7.25, 11.0, 0.0),
      PixelBox::new(700.0, 12.0, 90.5, 33.3),
      PixelBox::new(-5.0, -2.0, 40.0, 40.0),
    ];
    for (w, h) in [(1, 1), (736, 736), (1920, 1080), (37, 4001)] {
      let reference = ReferenceSize::new(w, h).unwrap();
      for b in &boxes {
        let back = to_pixel(&to_normalized(b, reference), reference);
        assert_pixel_eq(&back, b);
      }
    }
  }

  #[test]
  fn does_not_clamp_past_the_border() {
    let reference = ReferenceSize::new(100, 50).unwrap();
    let n = PixelBox::new(90.0, 40.0, 40.0, 40.0).to_normalized(reference);
    assert!(n.x_center > 1.0);
    assert!(n.height > 0.5);
  }

  #[test]
  fn rejects_empty_reference() {
    assert_eq!(
      ReferenceSize::new(0, 10),
      Err(GeometryError::EmptyReference {
        width: 0,
        height: 10
      })
    );
  }

  #[test]
  fn intersection_of_disjoint_boxes_is_zero() {
    let a = PixelBox::new(0.0, 0.0, 10.0, 10.0);
    let b = PixelBox::new(20.0, 20.0, 5.0, 5.0);
    assert_eq!(a.intersection_area(&b), 0.0);
    let c = PixelBox::from_corners(5.0, 5.0, 15.0, 15.0);
    assert!((a.intersection_area(&c) - 25.0).abs() < EPS);
  }
}
