// 该文件是 Heshu （鹤数） 项目的一部分。
// src/model.rs - 检测模型与检测结果
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
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  category::{CategoryError, CategoryMap, ColoredBox},
  count::CountVector,
  geometry::PixelBox,
  input::SourceImage,
};

/// 单区域检测模型，只负责一张（切片）图像
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 切片检测器：输入整图与切片参数，返回已跨切片合并的整图结果
pub trait SliceDetector {
  type Error: std::error::Error + Send + Sync + 'static;

  fn slice_and_detect(
    &self,
    source: &SourceImage,
    params: &SliceParams,
  ) -> Result<DetectResult, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub category_id: u32,
  pub bbox: PixelBox,
  pub confidence: f32,
}

impl Detection {
  pub fn new(category_id: u32, bbox: PixelBox, confidence: f32) -> Self {
    Self {
      category_id,
      bbox,
      confidence,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Vec<Detection>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn counts(&self, categories: &CategoryMap) -> Result<CountVector, CategoryError> {
    CountVector::tally(categories, self.items.iter().map(|d| d.category_id))
  }

  pub fn colored_boxes(&self, categories: &CategoryMap) -> Result<Vec<ColoredBox>, CategoryError> {
    self
      .items
      .iter()
      .map(|d| categories.colorize(d.category_id, d.bbox))
      .collect()
  }
}

pub mod merge;
pub mod slice;
pub use self::slice::{SliceParams, SliceRegion};

mod sliced;
pub use self::sliced::{SlicedDetectError, SlicedDetector};

mod replay;
pub use self::replay::{ReplayDetector, ReplayError};

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("回放检测器错误: {0}")]
  ReplayError(#[from] ReplayError),
  #[error("不支持的检测器 URI 方案: {0}")]
  SchemeMismatch(String),
}

/// 按 URL 方案选择的检测后端
pub enum DetectorWrapper {
  Replay(ReplayDetector),
}

impl FromUrl for DetectorWrapper {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ReplayDetector::SCHEME => {
        let detector = ReplayDetector::from_url(url)?;
        Ok(DetectorWrapper::Replay(detector))
      }
      other => Err(DetectorError::SchemeMismatch(other.to_string())),
    }
  }
}

impl DetectorWrapper {
  pub fn with_confidence_threshold(self, threshold: f32) -> Self {
    match &self {
      DetectorWrapper::Replay(_) => info!("回放结果置信度恒为 1.0，阈值 {} 不生效", threshold),
    }
    self
  }

  pub fn with_device(self, device: &str) -> Self {
    match &self {
      DetectorWrapper::Replay(_) => info!("回放检测器只读取标注文件，忽略计算设备 {}", device),
    }
    self
  }
}

impl SliceDetector for DetectorWrapper {
  type Error = DetectorError;

  fn slice_and_detect(
    &self,
    source: &SourceImage,
    params: &SliceParams,
  ) -> Result<DetectResult, Self::Error> {
    match self {
      DetectorWrapper::Replay(d) => d
        .slice_and_detect(source, params)
        .map_err(DetectorError::from),
    }
  }
}
