use super::utils::{percentile_legal_range, positive_finite, positive_usize};
use agelib::prelude::{
    ExtractConfig, SliceExtractor, VolumeFilter, INTENSITY_PERCENTILE, SLICE_COUNT, SLICE_OFFSET,
    TARGET_INTENSITY, VOLUME_SUFFIX,
};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct Slice {
    /// nii体数据所在目录。
    input_dir: PathBuf,
    /// 切片输出目录（不存在时创建）。
    output_dir: PathBuf,
    /// 只处理以此后缀结尾的文件。
    #[arg(long, default_value = VOLUME_SUFFIX)]
    suffix: String,
    /// 处理目录中所有非隐藏文件，忽略`--suffix`。
    #[arg(long, conflicts_with = "suffix")]
    any_file: bool,
    /// 强度规范化所用百分位。
    #[arg(long, default_value_t = INTENSITY_PERCENTILE, value_parser = percentile_legal_range)]
    percentile: f64,
    /// 该百分位规范化后的强度。
    #[arg(long, default_value_t = TARGET_INTENSITY, value_parser = positive_finite)]
    target: f64,
    /// 第一张切片在第三维上的下标。
    #[arg(long, default_value_t = SLICE_OFFSET)]
    offset: usize,
    /// 每个体数据提取的切片数。
    #[arg(long, default_value_t = SLICE_COUNT, value_parser = positive_usize)]
    count: usize,
}

impl Slice {
    pub fn run(&mut self) -> anyhow::Result<()> {
        // [input-dir/*.nii.gz] -> [output-dir/<id>-<s>.jpg]
        let filter = if self.any_file {
            VolumeFilter::NonHidden
        } else {
            VolumeFilter::Suffix(self.suffix.clone())
        };
        let config = ExtractConfig {
            filter,
            percentile: self.percentile,
            target: self.target,
            offset: self.offset,
            count: self.count,
            ..ExtractConfig::new(&self.input_dir, &self.output_dir)
        };
        SliceExtractor::new(config)
            .run()
            .with_context(|| format!("切片提取失败: `{}`", self.input_dir.display()))?;
        Ok(())
    }
}
