// 该文件是 Heshu （鹤数） 项目的一部分。
// src/output/comparison.rs - 真值与预测并排对比图
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

use crate::{
  category::CategoryMap,
  count::CountVector,
  geometry::ReferenceSize,
  input::GroundTruth,
  model::DetectResult,
  output::{OutputError, draw::Draw},
};

const GT_PREFIX: &str = "GT";
const PRED_PREFIX: &str = "Pred";

/// 一张对比图及左右两侧的计数
#[derive(Debug, Clone)]
pub struct Comparison {
  pub image: RgbImage,
  pub gt_counts: CountVector,
  pub pred_counts: CountVector,
}

pub struct ComparisonRenderer {
  categories: CategoryMap,
  draw: Draw,
}

impl ComparisonRenderer {
  pub fn new(categories: CategoryMap, draw: Draw) -> Self {
    Self { categories, draw }
  }

  pub fn categories(&self) -> &CategoryMap {
    &self.categories
  }

  /// 源图叠加预测框（无标签），对应检测器导出的可视化结果
  pub fn prediction_visual(
    &self,
    source: &RgbImage,
    result: &DetectResult,
  ) -> Result<RgbImage, OutputError> {
    let boxes = result.colored_boxes(&self.categories)?;
    let mut visual = source.clone();
    self.draw.draw_boxes(&mut visual, &boxes);
    Ok(visual)
  }

  pub fn annotate_prediction(&self, pane: &mut RgbImage, counts: &CountVector) {
    self
      .draw
      .draw_counts(pane, PRED_PREFIX, counts, &self.categories);
  }

  /// 源图副本上绘制真值框与真值计数
  pub fn ground_truth_pane(
    &self,
    source: &RgbImage,
    ground_truth: &GroundTruth,
    reference: ReferenceSize,
  ) -> Result<(RgbImage, CountVector), OutputError> {
    let counts = ground_truth.counts(&self.categories)?;
    let boxes = ground_truth.pixel_boxes(&self.categories, reference)?;

    let mut pane = source.clone();
    self.draw.draw_boxes(&mut pane, &boxes);
    self
      .draw
      .draw_counts(&mut pane, GT_PREFIX, &counts, &self.categories);
    Ok((pane, counts))
  }

  pub fn render(
    &self,
    source: &RgbImage,
    ground_truth: &GroundTruth,
    prediction_visual: &RgbImage,
    pred_counts: &CountVector,
    reference: ReferenceSize,
  ) -> Result<Comparison, OutputError> {
    let (gt_pane, gt_counts) = self.ground_truth_pane(source, ground_truth, reference)?;

    let mut pred_pane = prediction_visual.clone();
    self.annotate_prediction(&mut pred_pane, pred_counts);

    Ok(Comparison {
      image: compose(&gt_pane, &pred_pane, reference),
      gt_counts,
      pred_counts: pred_counts.clone(),
    })
  }
}

/// 画布宽为参考宽度的两倍，真值在左，预测在右
pub fn compose(gt_pane: &RgbImage, pred_pane: &RgbImage, reference: ReferenceSize) -> RgbImage {
  let (iw, ih) = (reference.width(), reference.height());
  let mut canvas = RgbImage::new(iw * 2, ih);
  imageops::replace(&mut canvas, gt_pane, 0, 0);
  imageops::replace(&mut canvas, pred_pane, iw as i64, 0);
  canvas
}
