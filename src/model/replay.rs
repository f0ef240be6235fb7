// 该文件是 Heshu （鹤数） 项目的一部分。
// src/model/replay.rs - 标注回放检测器
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  annotation::{AnnotationError, load_annotations},
  geometry::{GeometryError, ReferenceSize},
  input::SourceImage,
  model::{DetectResult, Detection, SliceDetector, slice::SliceParams},
};

const REPLAY_CONFIDENCE: f32 = 1.0;

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch {
    expected: &'static str,
    actual: String,
  },
  #[error("回放目录路径不是有效的 UTF-8: {0}")]
  InvalidPath(#[from] std::string::FromUtf8Error),
  #[error("回放目录中缺少 {0}")]
  Missing(PathBuf),
  #[error("回放标注错误: {0}")]
  Annotation(#[from] AnnotationError),
  #[error("图像尺寸错误: {0}")]
  Geometry(#[from] GeometryError),
}

/// 从 `<directory>/<stem>.txt` 读取已合并的整图检测结果。
/// 标注文件不带置信度，回放结果的置信度恒为 1.0，不受置信度阈值影响。
#[derive(Debug, Clone)]
pub struct ReplayDetector {
  directory: PathBuf,
}

impl FromUrlWithScheme for ReplayDetector {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetector {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayError::SchemeMismatch {
        expected: Self::SCHEME,
        actual: url.scheme().to_string(),
      });
    }

    let directory = urlencoding::decode(url.path())?;
    Ok(Self::new(directory.into_owned()))
  }
}

impl ReplayDetector {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }
}

impl SliceDetector for ReplayDetector {
  type Error = ReplayError;

  fn slice_and_detect(
    &self,
    source: &SourceImage,
    params: &SliceParams,
  ) -> Result<DetectResult, Self::Error> {
    let path = self.directory.join(format!("{}.txt", source.stem()));
    if !path.is_file() {
      return Err(ReplayError::Missing(path));
    }
    debug!(
      "回放 {}，切片参数 {}x{} 已由上游应用",
      path.display(),
      params.slice_height,
      params.slice_width
    );

    let reference = ReferenceSize::new(source.width(), source.height())?;
    let items = load_annotations(&path)?
      .into_iter()
      .map(|record| {
        Detection::new(
          record.category_id,
          record.bbox.to_pixel(reference),
          REPLAY_CONFIDENCE,
        )
      })
      .collect();

    Ok(DetectResult { items })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;

  #[test]
  fn parses_url_and_rejects_other_schemes() {
    let url = Url::parse("replay:///tmp/detections").unwrap();
    let detector = ReplayDetector::from_url(&url).unwrap();
    assert_eq!(detector.directory, PathBuf::from("/tmp/detections"));

    let spaced = Url::parse("replay:///data/my%20detections").unwrap();
    assert_eq!(
      ReplayDetector::from_url(&spaced).unwrap().directory,
      PathBuf::from("/data/my detections")
    );

    let other = Url::parse("file:///tmp/model.onnx").unwrap();
    assert!(matches!(
      ReplayDetector::from_url(&other),
      Err(ReplayError::SchemeMismatch { .. })
    ));
  }

  #[test]
  fn replays_denormalized_detections() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("im_01.txt"), "1 0.2 0.2 0.2 0.2\n").unwrap();
    let source = SourceImage::new(dir.path().join("im_01.jpg"), RgbImage::new(100, 100));

    let result = ReplayDetector::new(dir.path())
      .slice_and_detect(&source, &SliceParams::new(50, 50))
      .unwrap();
    assert_eq!(result.len(), 1);
    let bbox = result.items[0].bbox;
    assert!((bbox.x_min - 10.0).abs() < 1e-9);
    assert!((bbox.width - 20.0).abs() < 1e-9);
  }

  #[test]
  fn missing_replay_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = SourceImage::new(dir.path().join("a.png"), RgbImage::new(4, 4));
    assert!(matches!(
      ReplayDetector::new(dir.path()).slice_and_detect(&source, &SliceParams::new(2, 2)),
      Err(ReplayError::Missing(_))
    ));
  }
}
