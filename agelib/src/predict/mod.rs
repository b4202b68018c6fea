//! 按批推理切片并按被试取中位数。

pub mod aggregate;
pub mod batch;
pub mod model;

pub use aggregate::{aggregate, median, write_results, zip_records, PredictionRecord, ResultOrder, SubjectAge};
pub use batch::{InputSize, SliceBatch, SliceBatches, SliceDirectory, SliceEntry, TensorLayout};
pub use model::{AgeModel, OnnxAgeModel};

use crate::consts::{BATCH_SIZE, ID_SEPARATOR};
use crate::error::{AgeError, Result};
use crate::prep::AccTimer;
use crate::subjects::{filename_prefix, read_subject_list};
use std::path::PathBuf;
use tracing::{debug, info};

/// 每张切片的被试ID从何而来。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubjectSource {
    /// 取切片文件名中分隔符之前的部分。
    FileName { separator: char },
    /// 读取逐行的被试列表，每个ID重复`slices_per_subject`次后与切片按顺序对应。
    SubjectList {
        path: PathBuf,
        slices_per_subject: usize,
    },
}

impl Default for SubjectSource {
    fn default() -> Self {
        SubjectSource::FileName {
            separator: ID_SEPARATOR,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PredictConfig {
    pub slice_dir: PathBuf,
    pub output: PathBuf,
    pub batch_size: usize,
    pub input_size: InputSize,
    pub layout: TensorLayout,
    pub subjects: SubjectSource,
    pub order: ResultOrder,
}

impl PredictConfig {
    pub fn new(slice_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            slice_dir: slice_dir.into(),
            output: output.into(),
            batch_size: BATCH_SIZE,
            input_size: InputSize::default(),
            layout: TensorLayout::default(),
            subjects: SubjectSource::default(),
            order: ResultOrder::default(),
        }
    }
}

pub struct AgePredictor {
    config: PredictConfig,
}

impl AgePredictor {
    #[inline]
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    /// 完整流程：扫描切片、分配被试ID、分批推理、逐被试取中位数并写出结果表。
    pub fn run<M: AgeModel>(&self, model: &mut M) -> Result<Vec<SubjectAge>> {
        if self.config.batch_size == 0 {
            return Err(AgeError::InvalidConfig("批大小必须大于0"));
        }
        let slices = SliceDirectory::scan(&self.config.slice_dir)?;
        if slices.is_empty() {
            return Err(AgeError::Empty("切片目录中没有图像"));
        }
        info!(
            "在`{}`中找到{}张切片",
            self.config.slice_dir.display(),
            slices.len()
        );
        let ids = self.subject_ids(&slices)?;

        let predictions = self.infer(&slices, model)?;
        let records = zip_records(ids, predictions)?;
        let results = aggregate(&records, self.config.order)?;

        write_results(&self.config.output, &results)?;
        info!(
            "写入{}个被试的预测到`{}`",
            results.len(),
            self.config.output.display()
        );
        Ok(results)
    }

    /// 按目录顺序为每张切片给出被试ID。
    ///
    /// 使用被试列表时，先检查切片总数与批大小、列表长度一致，再逐张核对
    /// 列表中的ID与切片所在子目录名（不在子目录中时为文件名前缀）。
    pub fn subject_ids(&self, slices: &SliceDirectory) -> Result<Vec<String>> {
        match &self.config.subjects {
            SubjectSource::FileName { separator } => slices
                .entries()
                .iter()
                .map(|e| filename_prefix(&e.file_name, *separator).map(String::from))
                .collect(),
            SubjectSource::SubjectList {
                path,
                slices_per_subject,
            } => {
                let batch_size = self.config.batch_size;
                if batch_size == 0 {
                    return Err(AgeError::InvalidConfig("批大小必须大于0"));
                }
                if slices.len() % batch_size != 0 {
                    return Err(AgeError::PartialBatch {
                        slices: slices.len(),
                        batch_size,
                    });
                }
                let listed = read_subject_list(path)?;
                let ids: Vec<String> = listed
                    .iter()
                    .flat_map(|id| std::iter::repeat(id.clone()).take(*slices_per_subject))
                    .collect();
                if ids.len() != slices.len() {
                    return Err(AgeError::LengthMismatch {
                        ids: ids.len(),
                        predictions: slices.len(),
                    });
                }
                for (index, (entry, expected)) in slices.entries().iter().zip(&ids).enumerate() {
                    let found = match &entry.group {
                        Some(g) => g.as_str(),
                        None => filename_prefix(&entry.file_name, ID_SEPARATOR)
                            .unwrap_or(entry.file_name.as_str()),
                    };
                    if found != expected {
                        return Err(AgeError::Misaligned {
                            index,
                            slice: entry.path.display().to_string(),
                            expected: expected.clone(),
                            found: found.to_string(),
                        });
                    }
                }
                Ok(ids)
            }
        }
    }

    fn infer<M: AgeModel>(&self, slices: &SliceDirectory, model: &mut M) -> Result<Vec<f32>> {
        let PredictConfig {
            batch_size,
            input_size,
            layout,
            ..
        } = self.config;
        let mut timer = AccTimer::new();
        let mut predictions = Vec::with_capacity(slices.len());
        for (seq, batch) in slices.batches(batch_size, input_size, layout)?.enumerate() {
            let batch = batch?;
            let n = batch.entries.len();
            let out = timer.time(|| model.predict(&batch.tensor))?;
            if out.len() != n {
                return Err(AgeError::BadModelOutput {
                    expected: n,
                    got: out.len(),
                });
            }
            debug!("第{seq}批: {n}张切片");
            predictions.extend(out);
        }
        info!("推理耗时{}ms", timer.get_total_ms());
        Ok(predictions)
    }
}
