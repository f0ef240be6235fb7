// 该文件是 Heshu （鹤数） 项目的一部分。
// src/task.rs - 批量与单张推理任务
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
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  annotation::{AnnotationError, write_annotations},
  category::{CategoryError, CategoryMap},
  count::{CountErrors, CountVector, count_errors},
  geometry::{GeometryError, ReferenceSize},
  input::{GroundTruth, ImageDirectory, InputError, SourceImage},
  model::{
    DetectResult, SliceDetector, SliceParams,
    slice::{DEFAULT_OVERLAP_RATIO, SliceError},
  },
  output::{ComparisonRenderer, OutputError, save_image},
};

pub const DEFAULT_SLICE_SIZE: u32 = 736;

#[derive(Error, Debug)]
pub enum TaskError {
  #[error("{kind} 列表长度 {actual} 与图像数量 {expected} 不一致")]
  SliceListMismatch {
    kind: &'static str,
    expected: usize,
    actual: usize,
  },
  #[error("{0} 列表为空")]
  EmptySliceList(&'static str),
  #[error("目录不存在: {0}")]
  MissingDirectory(PathBuf),
  #[error("切片参数错误: {0}")]
  SliceError(#[from] SliceError),
  #[error("图像列表错误: {0}")]
  InputError(#[from] InputError),
  #[error("无法创建目录 {path}: {source}")]
  CreateDirectory {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("图像 {image} 处理失败: {source}")]
  Image {
    image: String,
    #[source]
    source: ImageTaskError,
  },
  #[error("写入报告 {path} 失败: {source}")]
  ReportIo {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("报告序列化失败: {0}")]
  ReportJson(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ImageTaskError {
  #[error("{0}")]
  Input(#[from] InputError),
  #[error("检测失败: {0}")]
  Detect(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("{0}")]
  Geometry(#[from] GeometryError),
  #[error("{0}")]
  Annotation(#[from] AnnotationError),
  #[error("{0}")]
  Category(#[from] CategoryError),
  #[error("{0}")]
  Output(#[from] OutputError),
}

pub trait Task<D>: Sized {
  type Output;
  type Error;
  fn run_task(self, detector: &D) -> Result<Self::Output, Self::Error>;
}

/// 单个值广播到所有图像，否则长度必须与图像数量一致
pub fn broadcast_slice_sizes(
  kind: &'static str,
  values: &[u32],
  image_count: usize,
) -> Result<Vec<u32>, TaskError> {
  match values {
    [] => Err(TaskError::EmptySliceList(kind)),
    [single] => Ok(vec![*single; image_count]),
    _ if values.len() == image_count => Ok(values.to_vec()),
    _ => Err(TaskError::SliceListMismatch {
      kind,
      expected: image_count,
      actual: values.len(),
    }),
  }
}

fn ensure_directory(path: &Path) -> Result<(), TaskError> {
  std::fs::create_dir_all(path).map_err(|source| TaskError::CreateDirectory {
    path: path.to_path_buf(),
    source,
  })
}

fn reference_for(
  configured: Option<ReferenceSize>,
  source: &SourceImage,
) -> Result<ReferenceSize, GeometryError> {
  match configured {
    Some(reference) => Ok(reference),
    None => ReferenceSize::new(source.width(), source.height()),
  }
}

fn detect<D: SliceDetector>(
  detector: &D,
  source: &SourceImage,
  params: &SliceParams,
) -> Result<DetectResult, ImageTaskError> {
  let now = std::time::Instant::now();
  let result = detector
    .slice_and_detect(source, params)
    .map_err(|e| ImageTaskError::Detect(Box::new(e)))?;
  info!(
    "{}: 检测到 {} 个目标，耗时 {:.2?}",
    source.file_name(),
    result.len(),
    now.elapsed()
  );
  Ok(result)
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
  pub image_dir: PathBuf,
  pub label_dir: Option<PathBuf>,
  pub predict_dir: PathBuf,
  pub annotation_dir: PathBuf,
  pub image_extension: String,
  pub slice_heights: Vec<u32>,
  pub slice_widths: Vec<u32>,
  pub overlap_height_ratio: f32,
  pub overlap_width_ratio: f32,
  /// 归一化参考尺寸，未设置时使用每张图像自身的尺寸
  pub reference: Option<ReferenceSize>,
}

impl BatchConfig {
  pub fn new(image_dir: impl Into<PathBuf>) -> Self {
    Self {
      image_dir: image_dir.into(),
      label_dir: None,
      predict_dir: PathBuf::from("predictions"),
      annotation_dir: PathBuf::from("annotations"),
      image_extension: ".tif".to_string(),
      slice_heights: vec![DEFAULT_SLICE_SIZE],
      slice_widths: vec![DEFAULT_SLICE_SIZE],
      overlap_height_ratio: DEFAULT_OVERLAP_RATIO,
      overlap_width_ratio: DEFAULT_OVERLAP_RATIO,
      reference: None,
    }
  }
}

#[derive(Serialize)]
struct ImageEntry<'a> {
  name: &'a str,
  ground_truth: BTreeMap<&'a str, usize>,
  prediction: BTreeMap<&'a str, usize>,
}

/// 报告 JSON 结构，指标为 `null` 表示没有可用的图像
#[derive(Serialize)]
struct ReportDocument<'a> {
  generated_at: String,
  images: Vec<ImageEntry<'a>>,
  metrics: BTreeMap<&'a str, Option<CountErrors>>,
}

/// 批量结果：按处理顺序累积的文件名与计数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
  pub image_names: Vec<String>,
  pub gt_counts: Vec<CountVector>,
  pub pred_counts: Vec<CountVector>,
}

impl BatchReport {
  pub fn len(&self) -> usize {
    self.image_names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.image_names.is_empty()
  }

  fn push(&mut self, image_name: String, gt: CountVector, pred: CountVector) {
    self.image_names.push(image_name);
    self.gt_counts.push(gt);
    self.pred_counts.push(pred);
  }

  /// 某一类别的 (真值序列, 预测序列)
  pub fn series(&self, category_id: u32) -> (Vec<usize>, Vec<usize>) {
    (
      self.gt_counts.iter().map(|c| c.get(category_id)).collect(),
      self.pred_counts.iter().map(|c| c.get(category_id)).collect(),
    )
  }

  pub fn count_errors(&self, category_id: u32) -> Option<CountErrors> {
    let (truth, predicted) = self.series(category_id);
    count_errors(&truth, &predicted)
  }

  fn document<'a>(&'a self, categories: &'a CategoryMap) -> ReportDocument<'a> {
    let labeled = |counts: &CountVector| -> BTreeMap<&'a str, usize> {
      categories
        .iter()
        .map(|c| (c.label.as_str(), counts.get(c.id)))
        .collect()
    };

    let images = self
      .image_names
      .iter()
      .zip(&self.gt_counts)
      .zip(&self.pred_counts)
      .map(|((name, gt), pred)| ImageEntry {
        name,
        ground_truth: labeled(gt),
        prediction: labeled(pred),
      })
      .collect();

    let metrics = categories
      .iter()
      .map(|c| (c.label.as_str(), self.count_errors(c.id)))
      .collect();

    ReportDocument {
      generated_at: Utc::now().to_rfc3339(),
      images,
      metrics,
    }
  }

  pub fn to_json(&self, categories: &CategoryMap) -> Result<Value, TaskError> {
    Ok(serde_json::to_value(self.document(categories))?)
  }

  pub fn write_json(&self, categories: &CategoryMap, path: &Path) -> Result<(), TaskError> {
    let text = serde_json::to_string_pretty(&self.document(categories))?;
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      ensure_directory(parent)?;
    }
    std::fs::write(path, text).map_err(|source| TaskError::ReportIo {
      path: path.to_path_buf(),
      source,
    })?;
    info!("批量报告已写入 {}", path.display());
    Ok(())
  }
}

/// 目录批量推理：检测、写标注、计数、生成对比图
pub struct BatchTask {
  config: BatchConfig,
  renderer: ComparisonRenderer,
}

impl BatchTask {
  pub fn new(config: BatchConfig, renderer: ComparisonRenderer) -> Self {
    Self { config, renderer }
  }

  /// 在处理任何图像之前完成全部配置检查
  fn prepare(&self) -> Result<Vec<(PathBuf, SliceParams)>, TaskError> {
    if !self.config.image_dir.is_dir() {
      return Err(TaskError::MissingDirectory(self.config.image_dir.clone()));
    }
    if let Some(label_dir) = &self.config.label_dir
      && !label_dir.is_dir()
    {
      return Err(TaskError::MissingDirectory(label_dir.clone()));
    }

    let images =
      ImageDirectory::new(&self.config.image_dir, &self.config.image_extension).list()?;
    let heights = broadcast_slice_sizes("slice_height", &self.config.slice_heights, images.len())?;
    let widths = broadcast_slice_sizes("slice_width", &self.config.slice_widths, images.len())?;

    let mut plan = Vec::with_capacity(images.len());
    for ((path, height), width) in images.into_iter().zip(heights).zip(widths) {
      let params = SliceParams::new(height, width).with_overlap(
        self.config.overlap_height_ratio,
        self.config.overlap_width_ratio,
      );
      params.validate()?;
      plan.push((path, params));
    }

    ensure_directory(&self.config.predict_dir)?;
    ensure_directory(&self.config.annotation_dir)?;
    Ok(plan)
  }

  fn process_image<D: SliceDetector>(
    &self,
    detector: &D,
    path: &Path,
    params: &SliceParams,
  ) -> Result<(CountVector, CountVector), ImageTaskError> {
    let source = SourceImage::open(path)?;
    let stem = source.stem();
    let result = detect(detector, &source, params)?;
    let reference = reference_for(self.config.reference, &source)?;

    let visual = self.renderer.prediction_visual(&source.image, &result)?;
    save_image(&visual, &self.config.predict_dir.join(format!("{stem}.png")))?;

    write_annotations(
      &result.items,
      reference,
      &self.config.annotation_dir.join(format!("{stem}.txt")),
    )?;

    let pred_counts = result.counts(self.renderer.categories())?;
    let ground_truth = GroundTruth::for_image(self.config.label_dir.as_deref(), &stem)?;
    if self.config.label_dir.is_some() && !ground_truth.is_present() {
      warn!("{} 没有对应的真值标注", source.file_name());
    }

    let comparison = self.renderer.render(
      &source.image,
      &ground_truth,
      &visual,
      &pred_counts,
      reference,
    )?;
    save_image(
      &comparison.image,
      &self.config.predict_dir.join(source.file_name()),
    )?;

    Ok((comparison.gt_counts, comparison.pred_counts))
  }
}

impl<D: SliceDetector> Task<D> for BatchTask {
  type Output = BatchReport;
  type Error = TaskError;

  fn run_task(self, detector: &D) -> Result<Self::Output, Self::Error> {
    info!("开始批量任务: {}", self.config.image_dir.display());
    let plan = self.prepare()?;
    info!("共 {} 张图像", plan.len());

    let mut report = BatchReport::default();
    for (index, (path, params)) in plan.iter().enumerate() {
      let image = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
      info!(
        "处理第 {}/{} 张图像 {} (切片 {}x{})",
        index + 1,
        plan.len(),
        image,
        params.slice_height,
        params.slice_width
      );

      let (gt, pred) = self
        .process_image(detector, path, params)
        .map_err(|source| TaskError::Image {
          image: image.clone(),
          source,
        })?;
      report.push(image, gt, pred);
    }

    info!("批量任务完成，共处理 {} 张图像", report.len());
    Ok(report)
  }
}

/// 单张图像推理：输出带预测框与预测计数的图像
pub struct SingleShotTask {
  image_path: PathBuf,
  output_path: PathBuf,
  params: SliceParams,
  renderer: ComparisonRenderer,
}

impl SingleShotTask {
  pub fn new(
    image_path: impl Into<PathBuf>,
    output_path: impl Into<PathBuf>,
    params: SliceParams,
    renderer: ComparisonRenderer,
  ) -> Self {
    Self {
      image_path: image_path.into(),
      output_path: output_path.into(),
      params,
      renderer,
    }
  }

  fn process<D: SliceDetector>(&self, detector: &D) -> Result<(), ImageTaskError> {
    let source = SourceImage::open(&self.image_path)?;
    let result = detect(detector, &source, &self.params)?;

    let mut visual = self.renderer.prediction_visual(&source.image, &result)?;
    let counts = result.counts(self.renderer.categories())?;
    self.renderer.annotate_prediction(&mut visual, &counts);
    save_image(&visual, &self.output_path)?;
    Ok(())
  }
}

impl<D: SliceDetector> Task<D> for SingleShotTask {
  type Output = PathBuf;
  type Error = TaskError;

  fn run_task(self, detector: &D) -> Result<Self::Output, Self::Error> {
    self.params.validate()?;
    self
      .process(detector)
      .map_err(|source| TaskError::Image {
        image: self.image_path.display().to_string(),
        source,
      })?;
    Ok(self.output_path)
  }
}
