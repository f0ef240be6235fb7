// 该文件是 Heshu （鹤数） 项目的一部分。
// src/bin/single_shot.rs - 单张图像切片推理
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

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use heshu::{
  FromUrl,
  category::CategoryMap,
  model::{DetectorWrapper, SliceParams},
  output::{ComparisonRenderer, draw::Draw},
  task::{SingleShotTask, Task},
};

/// 单张图像推理参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测后端
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像
  #[arg(long, value_name = "SOURCE")]
  pub input: PathBuf,
  /// 输出图像路径
  #[arg(long, default_value = "prediction.png", value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 切片高度
  #[arg(long, default_value = "512", value_name = "PIXELS")]
  pub slice_height: u32,
  /// 切片宽度
  #[arg(long, default_value = "512", value_name = "PIXELS")]
  pub slice_width: u32,
  /// 置信度阈值
  #[arg(long, default_value = "0.2", value_name = "THRESHOLD")]
  pub confidence: f32,
  /// 计算设备
  #[arg(long, default_value = "cpu", value_name = "DEVICE")]
  pub device: String,
  /// 计数文字字体
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
  /// 类别表 JSON 文件
  #[arg(long, value_name = "FILE")]
  pub categories: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测后端: {}", args.model);
  info!("输入图像: {}", args.input.display());
  info!("输出路径: {}", args.output.display());

  let categories = match &args.categories {
    Some(path) => CategoryMap::from_json_file(path)
      .with_context(|| format!("无法加载类别表: {}", path.display()))?,
    None => CategoryMap::default(),
  };

  let mut draw = Draw::new()?;
  if let Some(path) = &args.font {
    draw = draw.with_font(Draw::load_font(path)?);
  }

  let detector = DetectorWrapper::from_url(&args.model)
    .context("无法创建检测后端")?
    .with_confidence_threshold(args.confidence)
    .with_device(&args.device);

  let task = SingleShotTask::new(
    args.input,
    args.output,
    SliceParams::new(args.slice_height, args.slice_width),
    ComparisonRenderer::new(categories, draw),
  );

  let now = std::time::Instant::now();
  let output = task.run_task(&detector)?;
  info!("推理完成，耗时: {:.2?}，结果保存到 {}", now.elapsed(), output.display());

  Ok(())
}
