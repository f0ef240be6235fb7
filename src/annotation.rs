// 该文件是 Heshu （鹤数） 项目的一部分。
// src/annotation.rs - 归一化标注文件读写
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

use std::{
  fmt,
  path::{Path, PathBuf},
  str::FromStr,
};

use thiserror::Error;
use tracing::debug;

use crate::{
  geometry::{NormalizedBox, ReferenceSize},
  model::Detection,
};

const FIELDS_PER_RECORD: usize = 5;

#[derive(Error, Debug)]
pub enum AnnotationError {
  #[error("标注文件 {path} I/O 错误: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("标注文件 {path} 第 {line} 行格式错误: {reason}")]
  Parse {
    path: PathBuf,
    line: usize,
    reason: ParseRecordError,
  },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseRecordError {
  #[error("字段数应为 {FIELDS_PER_RECORD}，实际为 {0}")]
  FieldCount(usize),
  #[error("类别字段不是非负整数: {0}")]
  Category(String),
  #[error("坐标字段不是数值: {0}")]
  Number(String),
}

/// 标注文件中的一行：`category_id x_center y_center width height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationRecord {
  pub category_id: u32,
  pub bbox: NormalizedBox,
}

impl AnnotationRecord {
  pub fn from_detection(detection: &Detection, reference: ReferenceSize) -> Self {
    Self {
      category_id: detection.category_id,
      bbox: detection.bbox.to_normalized(reference),
    }
  }
}

impl fmt::Display for AnnotationRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {} {} {}",
      self.category_id, self.bbox.x_center, self.bbox.y_center, self.bbox.width, self.bbox.height
    )
  }
}

fn parse_category(token: &str) -> Result<u32, ParseRecordError> {
  if let Ok(id) = token.parse::<u32>() {
    return Ok(id);
  }
  // 兼容 `1.0` 这类整数值浮点写法
  match token.parse::<f64>() {
    Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
    _ => Err(ParseRecordError::Category(token.to_string())),
  }
}

impl FromStr for AnnotationRecord {
  type Err = ParseRecordError;

  fn from_str(line: &str) -> Result<Self, Self::Err> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != FIELDS_PER_RECORD {
      return Err(ParseRecordError::FieldCount(tokens.len()));
    }

    let category_id = parse_category(tokens[0])?;
    let mut values = [0f64; 4];
    for (slot, token) in values.iter_mut().zip(&tokens[1..]) {
      *slot = token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseRecordError::Number(token.to_string()))?;
    }

    Ok(Self {
      category_id,
      bbox: NormalizedBox::new(values[0], values[1], values[2], values[3]),
    })
  }
}

/// 将检测结果写成归一化标注文件；文件已存在时覆盖，父目录按需创建
pub fn write_annotations(
  detections: &[Detection],
  reference: ReferenceSize,
  path: &Path,
) -> Result<(), AnnotationError> {
  let io_error = |source| AnnotationError::Io {
    path: path.to_path_buf(),
    source,
  };

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).map_err(io_error)?;
  }

  let mut content = String::new();
  for detection in detections {
    let record = AnnotationRecord::from_detection(detection, reference);
    content.push_str(&record.to_string());
    content.push('\n');
  }

  std::fs::write(path, content).map_err(io_error)?;
  debug!("写入 {} 条标注到 {}", detections.len(), path.display());
  Ok(())
}

/// 读取标注文件，任一非空行格式错误即整体失败
pub fn load_annotations(path: &Path) -> Result<Vec<AnnotationRecord>, AnnotationError> {
  let text = std::fs::read_to_string(path).map_err(|source| AnnotationError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  parse_annotations(&text, path)
}

fn parse_annotations(text: &str, path: &Path) -> Result<Vec<AnnotationRecord>, AnnotationError> {
  text
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(index, line)| {
      line.parse().map_err(|reason| AnnotationError::Parse {
        path: path.to_path_buf(),
        line: index + 1,
        reason,
      })
    })
    .collect()
}
