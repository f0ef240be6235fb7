// 该文件是 Heshu （鹤数） 项目的一部分。
// src/model/sliced.rs - 切片推理检测器
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

use image::{RgbImage, imageops};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  input::SourceImage,
  model::{
    DetectResult, Detection, Model, SliceDetector,
    merge::{MergePolicy, greedy_nms},
    slice::{SliceError, SliceParams, plan_slices},
  },
};

#[derive(Error, Debug)]
pub enum SlicedDetectError {
  #[error("切片规划失败: {0}")]
  Slice(#[from] SliceError),
  #[error("切片 ({x}, {y}) 推理失败: {source}")]
  Model {
    x: u32,
    y: u32,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

/// 在每个切片上运行单区域模型，并把结果合并为整图检测
pub struct SlicedDetector<M> {
  model: M,
  confidence_threshold: f32,
  merge_policy: MergePolicy,
  standard_pred: bool,
}

impl<M> SlicedDetector<M> {
  pub fn new(model: M) -> Self {
    Self {
      model,
      confidence_threshold: 0.0,
      merge_policy: MergePolicy::default(),
      standard_pred: true,
    }
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
    self.merge_policy = policy;
    self
  }

  /// 是否在多切片时额外做一次整图推理
  pub fn with_standard_pred(mut self, enabled: bool) -> Self {
    self.standard_pred = enabled;
    self
  }
}

impl<M, E> SlicedDetector<M>
where
  M: Model<Input = RgbImage, Output = Vec<Detection>, Error = E>,
  E: std::error::Error + Send + Sync + 'static,
{
  fn infer_region(
    &self,
    region: &RgbImage,
    x: u32,
    y: u32,
    into: &mut Vec<Detection>,
  ) -> Result<(), SlicedDetectError> {
    let detections = self
      .model
      .infer(region)
      .map_err(|e| SlicedDetectError::Model {
        x,
        y,
        source: Box::new(e),
      })?;

    into.extend(
      detections
        .into_iter()
        .filter(|d| d.confidence >= self.confidence_threshold)
        .map(|d| Detection {
          bbox: d.bbox.translate(x as f64, y as f64),
          ..d
        }),
    );
    Ok(())
  }
}

impl<M, E> SliceDetector for SlicedDetector<M>
where
  M: Model<Input = RgbImage, Output = Vec<Detection>, Error = E>,
  E: std::error::Error + Send + Sync + 'static,
{
  type Error = SlicedDetectError;

  fn slice_and_detect(
    &self,
    source: &SourceImage,
    params: &SliceParams,
  ) -> Result<DetectResult, Self::Error> {
    let image = &source.image;
    let regions = plan_slices(image.width(), image.height(), params)?;
    info!("{} 切分为 {} 个切片", source.file_name(), regions.len());

    let now = std::time::Instant::now();
    let mut detections = Vec::new();
    for region in &regions {
      let crop = imageops::crop_imm(
        image,
        region.x_min,
        region.y_min,
        region.width(),
        region.height(),
      )
      .to_image();
      self.infer_region(&crop, region.x_min, region.y_min, &mut detections)?;
    }

    if self.standard_pred && regions.len() > 1 {
      self.infer_region(image, 0, 0, &mut detections)?;
    }

    let before = detections.len();
    let items = greedy_nms(detections, &self.merge_policy);
    debug!(
      "合并前 {} 个检测，合并后 {} 个，耗时 {:.2?}",
      before,
      items.len(),
      now.elapsed()
    );

    Ok(DetectResult { items })
  }
}
