// 该文件是 Heshu （鹤数） 项目的一部分。
// tests/common/mod.rs - 测试公共工具
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

#![allow(dead_code)]

use std::{collections::HashMap, path::Path};

use heshu::{
  geometry::PixelBox,
  input::SourceImage,
  model::{DetectResult, Detection, SliceDetector, SliceParams},
};
use image::{Rgb, RgbImage};

/// 按文件名返回固定检测结果，并记录调用顺序
#[derive(Default)]
pub struct StubDetector {
  pub results: HashMap<String, Vec<Detection>>,
  pub calls: std::cell::RefCell<Vec<(String, SliceParams)>>,
}

#[derive(Debug, thiserror::Error)]
#[error("stub detector has no result for {0}")]
pub struct StubError(pub String);

impl StubDetector {
  pub fn with(mut self, file_name: &str, detections: Vec<Detection>) -> Self {
    self.results.insert(file_name.to_string(), detections);
    self
  }

  pub fn called_names(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|(n, _)| n.clone()).collect()
  }
}

impl SliceDetector for StubDetector {
  type Error = StubError;

  fn slice_and_detect(
    &self,
    source: &SourceImage,
    params: &SliceParams,
  ) -> Result<DetectResult, Self::Error> {
    let name = source.file_name();
    self.calls.borrow_mut().push((name.clone(), *params));
    let items = self
      .results
      .get(&name)
      .cloned()
      .ok_or(StubError(name))?;
    Ok(DetectResult { items })
  }
}

pub fn detection(category_id: u32, x: f64, y: f64, w: f64, h: f64) -> Detection {
  Detection::new(category_id, PixelBox::new(x, y, w, h), 0.9)
}

/// 写一张纯色测试图像
pub fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
  let img = RgbImage::from_pixel(width, height, Rgb([40u8, 40u8, 40u8]));
  img
    .save(dir.join(name))
    .expect("Failed to save test image");
}
