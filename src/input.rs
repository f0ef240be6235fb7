// 该文件是 Heshu （鹤数） 项目的一部分。
// src/input.rs - 图像与目录输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;

mod ground_truth;
pub use self::ground_truth::GroundTruth;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("无法读取 {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("无法解码图像 {path}: {source}")]
  ImageLoad {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
}

/// 一张已解码的源图像及其路径
#[derive(Debug, Clone)]
pub struct SourceImage {
  pub path: PathBuf,
  pub image: RgbImage,
}

impl SourceImage {
  pub fn new(path: impl Into<PathBuf>, image: RgbImage) -> Self {
    Self {
      path: path.into(),
      image,
    }
  }

  pub fn open(path: &Path) -> Result<Self, InputError> {
    let image = ImageReader::open(path)
      .map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
      })?
      .decode()
      .map_err(|source| InputError::ImageLoad {
        path: path.to_path_buf(),
        source,
      })?;

    Ok(Self::new(path, image.to_rgb8()))
  }

  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  pub fn stem(&self) -> String {
    self
      .path
      .file_stem()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }
}

/// 按扩展名过滤的图像目录
#[derive(Debug, Clone)]
pub struct ImageDirectory {
  directory: PathBuf,
  extension: String,
}

impl ImageDirectory {
  pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
    Self {
      directory: directory.into(),
      extension: extension.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.directory
  }

  /// 列出文件名以扩展名结尾的文件，按文件名字节序排序
  pub fn list(&self) -> Result<Vec<PathBuf>, InputError> {
    let io_error = |source| InputError::Io {
      path: self.directory.clone(),
      source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.directory).map_err(io_error)? {
      let entry = entry.map_err(io_error)?;
      if !entry.file_type().map_err(io_error)?.is_file() {
        continue;
      }
      let name = entry.file_name();
      if name.to_string_lossy().ends_with(&self.extension) {
        files.push(entry.path());
      }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(
      "在 {} 中找到 {} 个 {} 文件",
      self.directory.display(),
      files.len(),
      self.extension
    );
    Ok(files)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_matching_files_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["im_10.jpg", "im_02.jpg", "B.jpg", "a.jpg", "notes.txt", "im_01.jpeg"] {
      std::fs::write(dir.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

    let files = ImageDirectory::new(dir.path(), ".jpg").list().unwrap();
    let names: Vec<_> = files
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["B.jpg", "a.jpg", "im_02.jpg", "im_10.jpg"]);
  }

  #[test]
  fn missing_directory_is_io_error() {
    let listing = ImageDirectory::new("/nonexistent/heshu/images", ".tif").list();
    assert!(matches!(listing, Err(InputError::Io { .. })));
  }

  #[test]
  fn source_image_names() {
    let source = SourceImage::new("/data/val/im_01.tif", RgbImage::new(3, 2));
    assert_eq!(source.file_name(), "im_01.tif");
    assert_eq!(source.stem(), "im_01");
    assert_eq!((source.width(), source.height()), (3, 2));
  }
}
