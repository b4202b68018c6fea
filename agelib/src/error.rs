//! 错误类型。

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 整条流水线共用的错误类型。
#[derive(Error, Debug)]
pub enum AgeError {
    #[error("读写`{}`失败: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("遍历目录失败: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("无法解析nii文件`{}`: {source}", .path.display())]
    Nifti {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },
    #[error("图像`{}`读写失败: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("处理体数据`{}`失败: {source}", .path.display())]
    Volume {
        path: PathBuf,
        #[source]
        source: Box<AgeError>,
    },
    #[error("参数错误: {0}")]
    InvalidConfig(&'static str),
    #[error("ONNX Runtime错误: {0}")]
    Ort(String),
    #[error("CSV写入失败: {0}")]
    Csv(#[from] csv::Error),
    #[error("`{}`不是三维体数据，形状为{shape:?}", .path.display())]
    UnsupportedShape { path: PathBuf, shape: Vec<usize> },
    #[error("从第{offset}层开始的{count}张切片超出第三维长度{depth}")]
    BandOutOfBounds {
        offset: usize,
        count: usize,
        depth: usize,
    },
    #[error("第{q}百分位强度为{value}，无法规范化")]
    DegenerateIntensity { q: f64, value: f64 },
    #[error("空输入: {0}")]
    Empty(&'static str),
    #[error("数据中含有NaN")]
    NotANumber,
    #[error("无法从文件名`{0}`得到被试ID")]
    BadFileName(String),
    #[error("文件名`{name}`中没有分隔符`{separator}`")]
    MissingSeparator { name: String, separator: char },
    #[error("切片数{slices}不是批大小{batch_size}的整数倍")]
    PartialBatch { slices: usize, batch_size: usize },
    #[error("被试ID共{ids}个，而切片预测共{predictions}个")]
    LengthMismatch { ids: usize, predictions: usize },
    #[error("切片`{slice}`（第{index}个）被分配给被试`{expected}`，但它属于`{found}`")]
    Misaligned {
        index: usize,
        slice: String,
        expected: String,
        found: String,
    },
    #[error("模型输出{got}个值，而输入批大小为{expected}")]
    BadModelOutput { expected: usize, got: usize },
}

impl AgeError {
    #[inline]
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        AgeError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    #[inline]
    pub fn volume(path: impl AsRef<Path>, source: AgeError) -> Self {
        AgeError::Volume {
            path: path.as_ref().to_path_buf(),
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn ort(err: impl std::fmt::Display) -> Self {
        AgeError::Ort(err.to_string())
    }

    #[inline]
    pub fn image(path: impl AsRef<Path>, source: image::ImageError) -> Self {
        AgeError::Image {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgeError>;
