// 该文件是 Heshu （鹤数） 项目的一部分。
// src/output/draw.rs - 边界框与计数文字绘制
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

use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};

use crate::{
  category::{CategoryMap, ColoredBox},
  count::CountVector,
  output::OutputError,
};

// 文本渲染常量
const COUNT_FONT_SIZE: f32 = 15.0;
const COUNT_LINE_SPACING: i32 = 20;
const COUNT_COLOR: [u8; 3] = [255, 255, 0]; // 黄色
const BOX_LINE_WIDTH: u32 = 1;

static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf"); // default font

pub struct Draw {
  font: FontArc,
  font_scale: PxScale,
  line_spacing: i32,
  text_color: Rgb<u8>,
  line_width: u32,
}

impl Draw {
  /// 使用内置字体
  pub fn new() -> Result<Self, OutputError> {
    let font = FontArc::try_from_slice(EMBEDDED_FONT)
      .map_err(|_| OutputError::InvalidFont(PathBuf::from("assets/DejaVuSans.ttf")))?;
    Ok(Self::with_font_arc(font))
  }

  fn with_font_arc(font: FontArc) -> Self {
    Self {
      font,
      font_scale: PxScale::from(COUNT_FONT_SIZE),
      line_spacing: COUNT_LINE_SPACING,
      text_color: Rgb(COUNT_COLOR),
      line_width: BOX_LINE_WIDTH,
    }
  }

  pub fn load_font(path: &Path) -> Result<FontArc, OutputError> {
    let data = std::fs::read(path).map_err(|source| OutputError::FontIo {
      path: path.to_path_buf(),
      source,
    })?;
    FontArc::try_from_vec(data).map_err(|_| OutputError::InvalidFont(path.to_path_buf()))
  }

  /// 替换内置字体
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = font;
    self
  }

  pub fn with_line_width(mut self, line_width: u32) -> Self {
    self.line_width = line_width.max(1);
    self
  }

  /// 绘制空心矩形，线宽向框内加粗，不做边界裁剪以外的修正
  pub fn draw_boxes(&self, image: &mut RgbImage, boxes: &[ColoredBox]) {
    for ColoredBox { bbox, color } in boxes {
      let x = bbox.x_min.round() as i32;
      let y = bbox.y_min.round() as i32;
      let w = bbox.width.round().max(1.0) as u32;
      let h = bbox.height.round().max(1.0) as u32;

      for t in 0..self.line_width {
        if 2 * t >= w || 2 * t >= h {
          break;
        }
        let rect = Rect::at(x + t as i32, y + t as i32).of_size(w - 2 * t, h - 2 * t);
        draw_hollow_rect_mut(image, rect, *color);
      }
    }
  }

  /// 在左上角逐行写出 `<prefix> <label>:<count>`，顺序与类别表一致
  pub fn draw_counts(
    &self,
    image: &mut RgbImage,
    prefix: &str,
    counts: &CountVector,
    categories: &CategoryMap,
  ) {
    for (row, category) in categories.iter().enumerate() {
      let text = format!("{} {}:{}", prefix, category.label, counts.get(category.id));
      draw_text_mut(
        image,
        self.text_color,
        0,
        row as i32 * self.line_spacing,
        self.font_scale,
        &self.font,
        &text,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::PixelBox;

  const RED: Rgb<u8> = Rgb([255, 0, 0]);
  const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

  #[test]
  fn draws_one_pixel_outline() {
    let mut image = RgbImage::new(200, 200);
    let boxes = [ColoredBox {
      bbox: PixelBox::new(90.0, 90.0, 20.0, 20.0),
      color: RED,
    }];
    Draw::new().unwrap().draw_boxes(&mut image, &boxes);

    assert_eq!(*image.get_pixel(90, 90), RED);
    assert_eq!(*image.get_pixel(100, 90), RED);
    assert_eq!(*image.get_pixel(90, 100), RED);
    assert_eq!(*image.get_pixel(109, 109), RED);
    assert_eq!(*image.get_pixel(100, 100), BLACK);
    assert_eq!(*image.get_pixel(91, 91), BLACK);
  }

  #[test]
  fn thicker_lines_grow_inward() {
    let mut image = RgbImage::new(50, 50);
    let boxes = [ColoredBox {
      bbox: PixelBox::new(10.0, 10.0, 20.0, 20.0),
      color: RED,
    }];
    Draw::new().unwrap()
      .with_line_width(2)
      .draw_boxes(&mut image, &boxes);
    assert_eq!(*image.get_pixel(11, 11), RED);
    assert_eq!(*image.get_pixel(12, 12), BLACK);
  }

  #[test]
  fn boxes_past_the_border_are_clipped() {
    let mut image = RgbImage::new(20, 20);
    let boxes = [ColoredBox {
      bbox: PixelBox::new(-5.0, 15.0, 40.0, 40.0),
      color: RED,
    }];
    Draw::new().unwrap().draw_boxes(&mut image, &boxes);
    assert_eq!(*image.get_pixel(10, 15), RED);
  }

  fn is_yellow(p: &Rgb<u8>) -> bool {
    p[0] > 96 && p[1] > 96 && p[2] == 0
  }

  fn yellow_rows(image: &RgbImage) -> Vec<u32> {
    let mut rows: Vec<u32> = image
      .enumerate_pixels()
      .filter(|(_, _, p)| is_yellow(p))
      .map(|(_, y, _)| y)
      .collect();
    rows.dedup();
    rows
  }

  #[test]
  fn counts_are_written_one_line_per_category() {
    let mut image = RgbImage::new(200, 80);
    let map = CategoryMap::default();
    let counts = CountVector::tally(&map, [1, 1, 0]).unwrap();
    Draw::new()
      .unwrap()
      .draw_counts(&mut image, "GT", &counts, &map);

    let rows = yellow_rows(&image);
    assert!(rows.iter().any(|&y| y < 20));
    assert!(rows.iter().any(|&y| (20..40).contains(&y)));
    assert!(rows.iter().all(|&y| y < 40));
    assert!(
      image
        .pixels()
        .all(|p| *p == BLACK || p[2] == 0)
    );
  }

  #[test]
  fn longer_prefix_draws_wider_text() {
    let map = CategoryMap::default();
    let counts = CountVector::zeros(&map);
    let draw = Draw::new().unwrap();

    let width_of = |prefix: &str| {
      let mut image = RgbImage::new(300, 40);
      draw.draw_counts(&mut image, prefix, &counts, &map);
      image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != BLACK)
        .map(|(x, _, _)| x)
        .max()
        .unwrap_or(0)
    };
    assert!(width_of("Pred") > width_of("GT"));
  }

  #[test]
  fn missing_font_is_a_resource_error() {
    assert!(matches!(
      Draw::load_font(Path::new("/nonexistent/heshu/Arial_Bold.ttf")),
      Err(OutputError::FontIo { .. })
    ));
  }
}
