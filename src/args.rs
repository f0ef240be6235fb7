// 该文件是 Heshu （鹤数） 项目的一部分。
// src/args.rs - 批量推理参数配置
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

use clap::Parser;
use url::Url;

/// Heshu 批量切片推理参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测后端，例如 replay:///data/detections
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像目录
  #[arg(long, value_name = "DIR")]
  pub image_dir: PathBuf,

  /// 真值标注目录（<图像名>.txt），可选
  #[arg(long, value_name = "DIR")]
  pub label_dir: Option<PathBuf>,

  /// 预测图与对比图输出目录
  #[arg(long, default_value = "predictions", value_name = "DIR")]
  pub predict_dir: PathBuf,

  /// 预测标注输出目录
  #[arg(long, default_value = "annotations", value_name = "DIR")]
  pub annotation_dir: PathBuf,

  /// 图像扩展名过滤
  #[arg(long, default_value = ".tif", value_name = "EXT")]
  pub image_extension: String,

  /// 切片高度，单个值对所有图像生效，多个值需与图像数量一致
  #[arg(long, num_args = 1.., default_values_t = vec![736u32], value_name = "PIXELS")]
  pub slice_height: Vec<u32>,

  /// 切片宽度，规则同切片高度
  #[arg(long, num_args = 1.., default_values_t = vec![736u32], value_name = "PIXELS")]
  pub slice_width: Vec<u32>,

  /// 纵向重叠比例 [0, 1)
  #[arg(long, default_value = "0.2", value_name = "RATIO")]
  pub overlap_height_ratio: f32,

  /// 横向重叠比例 [0, 1)
  #[arg(long, default_value = "0.2", value_name = "RATIO")]
  pub overlap_width_ratio: f32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.2", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// 计算设备，例如 cpu 或 cuda:0
  #[arg(long, default_value = "cpu", value_name = "DEVICE")]
  pub device: String,

  /// 计数文字所用字体，不提供时使用内置 DejaVu Sans
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 类别表 JSON 文件，不提供时使用 Crane/Duck 默认表
  #[arg(long, value_name = "FILE")]
  pub categories: Option<PathBuf>,

  /// 归一化参考宽度，默认使用图像自身宽度
  #[arg(long, requires = "img_height", value_name = "PIXELS")]
  pub img_width: Option<u32>,

  /// 归一化参考高度，默认使用图像自身高度
  #[arg(long, requires = "img_width", value_name = "PIXELS")]
  pub img_height: Option<u32>,

  /// 批量报告 JSON 输出路径
  #[arg(long, value_name = "FILE")]
  pub report: Option<PathBuf>,
}
