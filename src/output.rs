// 该文件是 Heshu （鹤数） 项目的一部分。
// src/output.rs - 输出定义
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

use crate::category::CategoryError;

pub mod draw;

mod comparison;
pub use self::comparison::{Comparison, ComparisonRenderer};

mod save_image_file;
pub use self::save_image_file::save_image;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误 {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("保存图像 {path} 失败: {source}")]
  ImageError {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
  #[error("无法读取字体 {path}: {source}")]
  FontIo {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("字体文件无效: {0}")]
  InvalidFont(PathBuf),
  #[error("类别错误: {0}")]
  CategoryError(#[from] CategoryError),
}
