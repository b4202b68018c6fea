use super::utils::{input_size, positive_usize};
use agelib::consts::{BATCH_SIZE, ID_SEPARATOR};
use agelib::predict::{
    AgePredictor, InputSize, OnnxAgeModel, PredictConfig, ResultOrder, SubjectSource, TensorLayout,
};
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct Predict {
    /// 切片图像目录（图像可直接放在其中，或按被试放在一层子目录中）。
    test_dir: PathBuf,
    /// ONNX模型文件。
    model: PathBuf,
    /// 输出CSV文件，表头为`ID,Pred_Age`。
    out_file: PathBuf,
    /// 逐行的被试ID列表；不提供时从切片文件名解析被试ID。
    #[arg(long)]
    subjects: Option<PathBuf>,
    /// 切片文件名中被试ID之后的分隔符。
    #[arg(long, default_value_t = ID_SEPARATOR, conflicts_with = "subjects")]
    separator: char,
    /// 推理批大小。
    #[arg(long, default_value_t = BATCH_SIZE, value_parser = positive_usize)]
    batch_size: usize,
    /// 使用被试列表时每个被试的切片数，默认等于批大小。
    #[arg(long, requires = "subjects", value_parser = positive_usize)]
    slices_per_subject: Option<usize>,
    /// 模型输入尺寸`WxH`。
    #[arg(long, default_value = "256x256", value_parser = input_size)]
    size: InputSize,
    /// 模型输入张量的维度顺序。
    #[arg(long, value_enum, default_value_t = Layout::Nhwc)]
    layout: Layout,
    /// 按被试ID排序输出。
    #[arg(long)]
    sort: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Layout {
    /// `[N, H, W, C]`
    Nhwc,
    /// `[N, C, H, W]`
    Nchw,
}

impl From<Layout> for TensorLayout {
    #[inline]
    fn from(l: Layout) -> Self {
        match l {
            Layout::Nhwc => TensorLayout::Nhwc,
            Layout::Nchw => TensorLayout::Nchw,
        }
    }
}

impl Predict {
    fn config(&self) -> PredictConfig {
        let subjects = match self.subjects {
            Some(ref path) => SubjectSource::SubjectList {
                path: path.clone(),
                slices_per_subject: self.slices_per_subject.unwrap_or(self.batch_size),
            },
            None => SubjectSource::FileName {
                separator: self.separator,
            },
        };
        PredictConfig {
            batch_size: self.batch_size,
            input_size: self.size,
            layout: self.layout.into(),
            subjects,
            order: if self.sort {
                ResultOrder::Sorted
            } else {
                ResultOrder::FirstSeen
            },
            ..PredictConfig::new(&self.test_dir, &self.out_file)
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        // [test-dir/**/<id>-<s>.jpg] -> [out-file]
        let mut model = OnnxAgeModel::load(&self.model)
            .with_context(|| format!("无法加载模型`{}`", self.model.display()))?;
        AgePredictor::new(self.config())
            .run(&mut model)
            .with_context(|| format!("预测失败: `{}`", self.test_dir.display()))?;
        Ok(())
    }
}
