// 该文件是 Heshu （鹤数） 项目的一部分。
// src/count.rs - 按类别计数与计数误差
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

use std::collections::BTreeMap;

use serde::Serialize;

use crate::category::{CategoryError, CategoryMap};

/// 每个类别的实例数，类别表中的类别总是存在（可能为 0）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountVector {
  counts: BTreeMap<u32, usize>,
}

impl CountVector {
  pub fn zeros(categories: &CategoryMap) -> Self {
    Self {
      counts: categories.ids().map(|id| (id, 0)).collect(),
    }
  }

  /// 单次遍历计数，遇到类别表以外的类别时报错
  pub fn tally<I>(categories: &CategoryMap, ids: I) -> Result<Self, CategoryError>
  where
    I: IntoIterator<Item = u32>,
  {
    let mut vector = Self::zeros(categories);
    for id in ids {
      let slot = vector
        .counts
        .get_mut(&id)
        .ok_or(CategoryError::Unmapped(id))?;
      *slot += 1;
    }
    Ok(vector)
  }

  pub fn get(&self, id: u32) -> usize {
    self.counts.get(&id).copied().unwrap_or(0)
  }

  pub fn total(&self) -> usize {
    self.counts.values().sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
    self.counts.iter().map(|(id, n)| (*id, *n))
  }
}

/// 计数回归误差
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountErrors {
  pub mae: f64,
  pub mse: f64,
  pub mape: f64,
}

/// 真值序列与预测序列之间的 MAE / MSE / MAPE；长度不一致或为空时返回 `None`
pub fn count_errors(truth: &[usize], predicted: &[usize]) -> Option<CountErrors> {
  if truth.is_empty() || truth.len() != predicted.len() {
    return None;
  }

  let n = truth.len() as f64;
  let (mut abs, mut sq, mut pct) = (0.0, 0.0, 0.0);
  for (&t, &p) in truth.iter().zip(predicted) {
    let (t, p) = (t as f64, p as f64);
    let diff = (t - p).abs();
    abs += diff;
    sq += diff * diff;
    pct += diff / t.abs().max(f64::EPSILON);
  }

  Some(CountErrors {
    mae: abs / n,
    mse: sq / n,
    mape: pct / n,
  })
}
