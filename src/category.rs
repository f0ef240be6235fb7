// 该文件是 Heshu （鹤数） 项目的一部分。
// src/category.rs - 类别标签与颜色映射
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

use image::Rgb;
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::PixelBox;

#[derive(Error, Debug)]
pub enum CategoryError {
  #[error("类别 {0} 不在类别表中")]
  Unmapped(u32),
  #[error("类别 {0} 重复定义")]
  Duplicate(u32),
  #[error("类别表为空")]
  Empty,
  #[error("读取类别表失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("类别表 JSON 解析失败: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
  pub id: u32,
  pub label: String,
  pub color: Rgb<u8>,
}

impl Category {
  pub fn new(id: u32, label: impl Into<String>, color: [u8; 3]) -> Self {
    Self {
      id,
      label: label.into(),
      color: Rgb(color),
    }
  }
}

/// 类别表 JSON 中的一项
#[derive(Debug, Deserialize)]
struct CategoryEntry {
  id: u32,
  label: String,
  color: [u8; 3],
}

impl From<CategoryEntry> for Category {
  fn from(entry: CategoryEntry) -> Self {
    Category::new(entry.id, entry.label, entry.color)
  }
}

/// 带颜色的像素框，用于叠加绘制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredBox {
  pub bbox: PixelBox,
  pub color: Rgb<u8>,
}

/// 封闭的类别表，保持声明顺序（计数文字按此顺序逐行绘制）
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap {
  categories: Vec<Category>,
}

impl Default for CategoryMap {
  fn default() -> Self {
    Self {
      categories: vec![
        Category::new(1, "Crane", [0, 0, 255]),
        Category::new(0, "Duck", [255, 0, 0]),
      ],
    }
  }
}

impl CategoryMap {
  pub fn new(categories: Vec<Category>) -> Result<Self, CategoryError> {
    if categories.is_empty() {
      return Err(CategoryError::Empty);
    }
    for (i, category) in categories.iter().enumerate() {
      if categories[..i].iter().any(|c| c.id == category.id) {
        return Err(CategoryError::Duplicate(category.id));
      }
    }
    Ok(Self { categories })
  }

  /// 从 JSON 文件加载，格式为 `[{"id": 1, "label": "Crane", "color": [0, 0, 255]}]`
  pub fn from_json_file(path: &Path) -> Result<Self, CategoryError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  pub fn from_json_str(text: &str) -> Result<Self, CategoryError> {
    let entries: Vec<CategoryEntry> = serde_json::from_str(text)?;
    Self::new(entries.into_iter().map(Category::from).collect())
  }

  pub fn get(&self, id: u32) -> Result<&Category, CategoryError> {
    self
      .categories
      .iter()
      .find(|c| c.id == id)
      .ok_or(CategoryError::Unmapped(id))
  }

  pub fn contains(&self, id: u32) -> bool {
    self.categories.iter().any(|c| c.id == id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Category> {
    self.categories.iter()
  }

  pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
    self.categories.iter().map(|c| c.id)
  }

  pub fn len(&self) -> usize {
    self.categories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }

  pub fn colorize(&self, id: u32, bbox: PixelBox) -> Result<ColoredBox, CategoryError> {
    let category = self.get(id)?;
    Ok(ColoredBox {
      bbox,
      color: category.color,
    })
  }
}
