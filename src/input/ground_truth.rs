// 该文件是 Heshu （鹤数） 项目的一部分。
// src/input/ground_truth.rs - 真值标注加载与还原
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

use std::path::Path;

use tracing::debug;

use crate::{
  annotation::{AnnotationError, AnnotationRecord, load_annotations},
  category::{CategoryError, CategoryMap, ColoredBox},
  count::CountVector,
  geometry::ReferenceSize,
};

/// 一张图像的真值标注；文件不存在时为空
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruth {
  records: Option<Vec<AnnotationRecord>>,
}

impl GroundTruth {
  pub fn absent() -> Self {
    Self { records: None }
  }

  pub fn from_records(records: Vec<AnnotationRecord>) -> Self {
    Self {
      records: Some(records),
    }
  }

  /// 路径为空或文件不存在视为没有真值，格式错误则直接返回错误
  pub fn load(path: Option<&Path>) -> Result<Self, AnnotationError> {
    match path {
      Some(path) if path.is_file() => {
        let records = load_annotations(path)?;
        debug!("读取真值 {}: {} 条", path.display(), records.len());
        Ok(Self::from_records(records))
      }
      Some(path) => {
        debug!("真值文件 {} 不存在", path.display());
        Ok(Self::absent())
      }
      None => Ok(Self::absent()),
    }
  }

  /// 在标注目录中查找 `<stem>.txt`
  pub fn for_image(label_dir: Option<&Path>, stem: &str) -> Result<Self, AnnotationError> {
    let path = label_dir.map(|dir| dir.join(format!("{stem}.txt")));
    Self::load(path.as_deref())
  }

  pub fn is_present(&self) -> bool {
    self.records.is_some()
  }

  pub fn records(&self) -> &[AnnotationRecord] {
    self.records.as_deref().unwrap_or_default()
  }

  pub fn counts(&self, categories: &CategoryMap) -> Result<CountVector, CategoryError> {
    CountVector::tally(categories, self.records().iter().map(|r| r.category_id))
  }

  /// 还原为像素框并附上类别颜色，未登记的类别直接报错
  pub fn pixel_boxes(
    &self,
    categories: &CategoryMap,
    reference: ReferenceSize,
  ) -> Result<Vec<ColoredBox>, CategoryError> {
    self
      .records()
      .iter()
      .map(|r| categories.colorize(r.category_id, r.bbox.to_pixel(reference)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn write_gt(dir: &Path, stem: &str, content: &str) {
    std::fs::write(dir.join(format!("{stem}.txt")), content).unwrap();
  }

  #[test]
  fn counts_and_denormalizes_ground_truth() {
    let dir = tempfile::tempdir().unwrap();
    write_gt(dir.path(), "im_01", "0 0.5 0.5 0.1 0.1\n1 0.3 0.3 0.2 0.2\n");

    let gt = GroundTruth::for_image(Some(dir.path()), "im_01").unwrap();
    let map = CategoryMap::default();
    let counts = gt.counts(&map).unwrap();
    assert_eq!((counts.get(0), counts.get(1)), (1, 1));

    let boxes = gt
      .pixel_boxes(&map, ReferenceSize::new(200, 200).unwrap())
      .unwrap();
    assert_eq!(boxes.len(), 2);
    assert!((boxes[0].bbox.x_min - 90.0).abs() < 1e-9);
    assert!((boxes[0].bbox.y_min - 90.0).abs() < 1e-9);
    assert!((boxes[0].bbox.width - 20.0).abs() < 1e-9);
    assert_eq!(boxes[0].color, Rgb([255, 0, 0]));
    assert!((boxes[1].bbox.x_min - 40.0).abs() < 1e-9);
    assert_eq!(boxes[1].color, Rgb([0, 0, 255]));
  }

  #[test]
  fn absent_ground_truth_counts_zero() {
    let dir = tempfile::tempdir().unwrap();
    let map = CategoryMap::default();
    for gt in [
      GroundTruth::for_image(None, "im_01").unwrap(),
      GroundTruth::for_image(Some(dir.path()), "im_01").unwrap(),
    ] {
      assert!(!gt.is_present());
      assert_eq!(gt.counts(&map).unwrap(), CountVector::zeros(&map));
      assert!(
        gt.pixel_boxes(&map, ReferenceSize::new(10, 10).unwrap())
          .unwrap()
          .is_empty()
      );
    }
  }

  #[test]
  fn malformed_ground_truth_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    write_gt(dir.path(), "bad", "0 0.5 0.5 0.1\n");
    assert!(matches!(
      GroundTruth::for_image(Some(dir.path()), "bad"),
      Err(AnnotationError::Parse { line: 1, .. })
    ));
  }

  #[test]
  fn unmapped_ground_truth_category_fails() {
    let gt = GroundTruth::from_records(vec!["4 0.5 0.5 0.1 0.1".parse().unwrap()]);
    let map = CategoryMap::default();
    assert!(gt.counts(&map).is_err());
    assert!(
      gt.pixel_boxes(&map, ReferenceSize::new(10, 10).unwrap())
        .is_err()
    );
  }
}
