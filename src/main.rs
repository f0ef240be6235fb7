// 该文件是 Heshu （鹤数） 项目的一部分。
// src/main.rs - 批量切片推理主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use heshu::{
  FromUrl,
  category::CategoryMap,
  geometry::ReferenceSize,
  model::DetectorWrapper,
  output::{ComparisonRenderer, draw::Draw},
  task::{BatchConfig, BatchTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("检测后端: {}", args.model);
  info!("输入目录: {}", args.image_dir.display());
  info!("输出目录: {}", args.predict_dir.display());
  info!("标注目录: {}", args.annotation_dir.display());
  info!("置信度阈值: {}", args.confidence);

  let categories = match &args.categories {
    Some(path) => CategoryMap::from_json_file(path)
      .with_context(|| format!("无法加载类别表: {}", path.display()))?,
    None => CategoryMap::default(),
  };

  let mut draw = Draw::new()?;
  if let Some(path) = &args.font {
    draw = draw.with_font(Draw::load_font(path)?);
  }

  let reference = match (args.img_width, args.img_height) {
    (Some(w), Some(h)) => Some(ReferenceSize::new(w, h)?),
    _ => None,
  };

  let detector = DetectorWrapper::from_url(&args.model)
    .context("无法创建检测后端")?
    .with_confidence_threshold(args.confidence)
    .with_device(&args.device);

  let config = BatchConfig {
    image_dir: args.image_dir,
    label_dir: args.label_dir,
    predict_dir: args.predict_dir,
    annotation_dir: args.annotation_dir,
    image_extension: args.image_extension,
    slice_heights: args.slice_height,
    slice_widths: args.slice_width,
    overlap_height_ratio: args.overlap_height_ratio,
    overlap_width_ratio: args.overlap_width_ratio,
    reference,
  };

  let renderer = ComparisonRenderer::new(categories.clone(), draw);
  let report = BatchTask::new(config, renderer).run_task(&detector)?;

  for ((name, gt), pred) in report
    .image_names
    .iter()
    .zip(&report.gt_counts)
    .zip(&report.pred_counts)
  {
    let line: Vec<String> = categories
      .iter()
      .map(|c| format!("{} {}/{}", c.label, gt.get(c.id), pred.get(c.id)))
      .collect();
    info!("{}: {} (真值/预测)", name, line.join(", "));
  }

  for category in categories.iter() {
    if let Some(errors) = report.count_errors(category.id) {
      info!(
        "{}: MAE {:.3}, MSE {:.3}, MAPE {:.3}",
        category.label, errors.mae, errors.mse, errors.mape
      );
    }
  }

  if let Some(path) = &args.report {
    report.write_json(&categories, path)?;
  }

  Ok(())
}
