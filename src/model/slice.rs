// 该文件是 Heshu （鹤数） 项目的一部分。
// src/model/slice.rs - 切片规划
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

pub const DEFAULT_OVERLAP_RATIO: f32 = 0.2;

#[derive(Error, Debug, PartialEq)]
pub enum SliceError {
  #[error("切片尺寸必须为正数: {height}x{width}")]
  EmptySlice { height: u32, width: u32 },
  #[error("重叠比例必须位于 [0, 1) 区间: {0}")]
  InvalidOverlap(f32),
  #[error("图像尺寸为空: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
}

/// 切片推理参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceParams {
  pub slice_height: u32,
  pub slice_width: u32,
  pub overlap_height_ratio: f32,
  pub overlap_width_ratio: f32,
}

impl SliceParams {
  pub fn new(slice_height: u32, slice_width: u32) -> Self {
    Self {
      slice_height,
      slice_width,
      overlap_height_ratio: DEFAULT_OVERLAP_RATIO,
      overlap_width_ratio: DEFAULT_OVERLAP_RATIO,
    }
  }

  pub fn with_overlap(mut self, overlap_height_ratio: f32, overlap_width_ratio: f32) -> Self {
    self.overlap_height_ratio = overlap_height_ratio;
    self.overlap_width_ratio = overlap_width_ratio;
    self
  }

  pub fn validate(&self) -> Result<(), SliceError> {
    if self.slice_height == 0 || self.slice_width == 0 {
      return Err(SliceError::EmptySlice {
        height: self.slice_height,
        width: self.slice_width,
      });
    }
    for ratio in [self.overlap_height_ratio, self.overlap_width_ratio] {
      if !(0.0..1.0).contains(&ratio) {
        return Err(SliceError::InvalidOverlap(ratio));
      }
    }
    Ok(())
  }
}

/// 整图中的一个切片区域，`[x_min, x_max) x [y_min, y_max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRegion {
  pub x_min: u32,
  pub y_min: u32,
  pub x_max: u32,
  pub y_max: u32,
}

impl SliceRegion {
  pub fn width(&self) -> u32 {
    self.x_max - self.x_min
  }

  pub fn height(&self) -> u32 {
    self.y_max - self.y_min
  }
}

/// 生成覆盖整幅图像的重叠切片，越过右/下边界的切片向内平移
pub fn plan_slices(
  image_width: u32,
  image_height: u32,
  params: &SliceParams,
) -> Result<Vec<SliceRegion>, SliceError> {
  params.validate()?;
  if image_width == 0 || image_height == 0 {
    return Err(SliceError::EmptyImage {
      width: image_width,
      height: image_height,
    });
  }

  let (slice_w, slice_h) = (params.slice_width, params.slice_height);
  let x_overlap = (params.overlap_width_ratio * slice_w as f32) as u32;
  let y_overlap = (params.overlap_height_ratio * slice_h as f32) as u32;

  let mut regions = Vec::new();
  let mut y_min = 0u32;
  let mut y_max = 0u32;
  while y_max < image_height {
    let mut x_min = 0u32;
    let mut x_max = 0u32;
    y_max = y_min + slice_h;
    while x_max < image_width {
      x_max = x_min + slice_w;
      if y_max > image_height || x_max > image_width {
        let x_end = image_width.min(x_max);
        let y_end = image_height.min(y_max);
        regions.push(SliceRegion {
          x_min: x_end.saturating_sub(slice_w),
          y_min: y_end.saturating_sub(slice_h),
          x_max: x_end,
          y_max: y_end,
        });
      } else {
        regions.push(SliceRegion {
          x_min,
          y_min,
          x_max,
          y_max,
        });
      }
      x_min = x_max - x_overlap;
    }
    y_min = y_max - y_overlap;
  }

  Ok(regions)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn covers_square_image_with_overlap() {
    let regions = plan_slices(100, 100, &SliceParams::new(50, 50)).unwrap();
    assert_eq!(regions.len(), 9);
    assert_eq!(
      regions[0],
      SliceRegion {
        x_min: 0,
        y_min: 0,
        x_max: 50,
        y_max: 50
      }
    );
    assert_eq!(
      regions[1],
      SliceRegion {
        x_min: 40,
        y_min: 0,
        x_max: 90,
        y_max: 50
      }
    );
    assert_eq!(
      regions[8],
      SliceRegion {
        x_min: 50,
        y_min: 50,
        x_max: 100,
        y_max: 100
      }
    );
    for r in &regions {
      assert_eq!((r.width(), r.height()), (50, 50));
      assert!(r.x_max <= 100 && r.y_max <= 100);
    }
  }

  #[test]
  fn every_pixel_is_covered() {
    let (w, h) = (137, 61);
    let params = SliceParams::new(32, 48).with_overlap(0.25, 0.1);
    let regions = plan_slices(w, h, &params).unwrap();
    for y in 0..h {
      for x in 0..w {
        assert!(
          regions
            .iter()
            .any(|r| (r.x_min..r.x_max).contains(&x) && (r.y_min..r.y_max).contains(&y)),
          "pixel ({x}, {y}) not covered"
        );
      }
    }
  }

  #[test]
  fn small_image_yields_single_clipped_slice() {
    let regions = plan_slices(30, 20, &SliceParams::new(50, 50)).unwrap();
    assert_eq!(
      regions,
      vec![SliceRegion {
        x_min: 0,
        y_min: 0,
        x_max: 30,
        y_max: 20
      }]
    );
  }

  #[test]
  fn rejects_invalid_parameters() {
    assert_eq!(
      plan_slices(10, 10, &SliceParams::new(0, 10)),
      Err(SliceError::EmptySlice {
        height: 0,
        width: 10
      })
    );
    assert_eq!(
      plan_slices(10, 10, &SliceParams::new(5, 5).with_overlap(1.0, 0.2)),
      Err(SliceError::InvalidOverlap(1.0))
    );
    assert_eq!(
      plan_slices(0, 10, &SliceParams::new(5, 5)),
      Err(SliceError::EmptyImage {
        width: 0,
        height: 10
      })
    );
  }
}
