// 该文件是 Heshu （鹤数） 项目的一部分。
// src/model/merge.rs - 跨切片检测结果合并
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

use crate::{geometry::PixelBox, model::Detection};

/// 重叠度量方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMetric {
  /// 交并比
  Iou,
  /// 交集与较小框面积之比
  #[default]
  Ios,
}

impl MatchMetric {
  pub fn overlap(&self, a: &PixelBox, b: &PixelBox) -> f64 {
    let inter = a.intersection_area(b);
    let denom = match self {
      MatchMetric::Iou => a.area() + b.area() - inter,
      MatchMetric::Ios => a.area().min(b.area()),
    };
    if denom <= 0.0 { 0.0 } else { inter / denom }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePolicy {
  pub metric: MatchMetric,
  pub threshold: f64,
  pub class_agnostic: bool,
}

impl Default for MergePolicy {
  fn default() -> Self {
    Self {
      metric: MatchMetric::Ios,
      threshold: 0.5,
      class_agnostic: false,
    }
  }
}

/// 贪心非极大值抑制，输出按置信度降序排列
pub fn greedy_nms(mut detections: Vec<Detection>, policy: &MergePolicy) -> Vec<Detection> {
  detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
  for candidate in detections {
    let suppressed = kept.iter().any(|k| {
      (policy.class_agnostic || k.category_id == candidate.category_id)
        && policy.metric.overlap(&k.bbox, &candidate.bbox) > policy.threshold
    });
    if !suppressed {
      kept.push(candidate);
    }
  }
  kept
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(category_id: u32, x: f64, y: f64, size: f64, confidence: f32) -> Detection {
    Detection::new(category_id, PixelBox::new(x, y, size, size), confidence)
  }

  #[test]
  fn suppresses_duplicates_along_seam() {
    let merged = greedy_nms(
      vec![
        det(1, 10.0, 10.0, 20.0, 0.6),
        det(1, 12.0, 10.0, 20.0, 0.9),
        det(1, 100.0, 100.0, 20.0, 0.5),
      ],
      &MergePolicy::default(),
    );
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].confidence, 0.9);
    assert_eq!(merged[1].bbox.x_min, 100.0);
  }

  #[test]
  fn keeps_overlapping_boxes_of_other_categories() {
    let detections = vec![det(0, 0.0, 0.0, 10.0, 0.9), det(1, 0.0, 0.0, 10.0, 0.8)];
    assert_eq!(greedy_nms(detections.clone(), &MergePolicy::default()).len(), 2);

    let agnostic = MergePolicy {
      class_agnostic: true,
      ..MergePolicy::default()
    };
    assert_eq!(greedy_nms(detections, &agnostic).len(), 1);
  }

  #[test]
  fn ios_catches_partial_boxes_that_iou_misses() {
    // 切片边缘截断的半个框被完整框包含
    let full = PixelBox::new(0.0, 0.0, 20.0, 20.0);
    let half = PixelBox::new(0.0, 0.0, 10.0, 20.0);
    assert!((MatchMetric::Ios.overlap(&full, &half) - 1.0).abs() < 1e-12);
    assert!((MatchMetric::Iou.overlap(&full, &half) - 0.5).abs() < 1e-12);
  }

  #[test]
  fn degenerate_boxes_do_not_overlap() {
    let zero = PixelBox::new(5.0, 5.0, 0.0, 0.0);
    let other = PixelBox::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(MatchMetric::Ios.overlap(&zero, &other), 0.0);
    assert_eq!(MatchMetric::Iou.overlap(&zero, &zero), 0.0);
  }
}
