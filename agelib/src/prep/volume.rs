//! 体数据读取与强度规范化。

use crate::error::{AgeError, Result};
use ndarray::{Array3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// 输入目录中哪些文件被视为体数据。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeFilter {
    /// 文件名以给定后缀结尾。
    Suffix(String),
    /// 任何不以`.`开头的文件。
    NonHidden,
}

impl VolumeFilter {
    #[inline]
    pub fn accepts(&self, file_name: &str) -> bool {
        match self {
            VolumeFilter::Suffix(s) => file_name.ends_with(s.as_str()),
            VolumeFilter::NonHidden => !file_name.starts_with('.'),
        }
    }
}

impl Default for VolumeFilter {
    fn default() -> Self {
        VolumeFilter::Suffix(crate::consts::VOLUME_SUFFIX.to_string())
    }
}

/// 按文件名字典序列出`dir`下（仅一层）被`filter`接受的文件。
pub fn list_volume_files(dir: &Path, filter: &VolumeFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            return Err(AgeError::BadFileName(
                entry.file_name().to_string_lossy().into_owned(),
            ));
        };
        if filter.accepts(name) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// 读取nii文件为三维数组。第四维长度为1的数据会被压缩为三维。
pub fn load_volume(path: &Path) -> Result<Array3<f32>> {
    let nifti_err = |source: nifti::NiftiError| AgeError::Nifti {
        path: path.to_path_buf(),
        source,
    };
    let obj = ReaderOptions::new().read_file(path).map_err(nifti_err)?;
    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(nifti_err)?;
    let shape = volume.shape().to_vec();
    debug!("体数据形状: {shape:?}");

    let unsupported = || AgeError::UnsupportedShape {
        path: path.to_path_buf(),
        shape: shape.clone(),
    };
    let volume = match shape.len() {
        3 => volume.into_dimensionality::<Ix3>(),
        4 if shape[3] == 1 => volume
            .index_axis_move(Axis(3), 0)
            .into_dimensionality::<Ix3>(),
        _ => return Err(unsupported()),
    }
    .map_err(|_| unsupported())?;

    if volume.is_empty() {
        return Err(unsupported());
    }
    Ok(volume)
}

/// 第`q`百分位数，在相邻秩之间线性插值（即排序后位置`q/100 * (n-1)`）。
/// `q`须在`[0, 100]`内。
pub fn percentile(values: &[f32], q: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&q) {
        return Err(AgeError::InvalidConfig("百分位须在[0, 100]内"));
    }
    if values.is_empty() {
        return Err(AgeError::Empty("百分位计算"));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(AgeError::NotANumber);
    }

    let mut buf = values.to_vec();
    let rank = q / 100.0 * (buf.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;

    let (_, lo_val, upper) = buf.select_nth_unstable_by(lo, f32::total_cmp);
    let lo_val = *lo_val as f64;
    if frac == 0.0 || upper.is_empty() {
        return Ok(lo_val);
    }
    let hi_val = upper.iter().copied().fold(f32::INFINITY, f32::min) as f64;
    Ok(lo_val + (hi_val - lo_val) * frac)
}

/// 将整个体数据乘以`target / P_q`，使第`q`百分位映射到`target`。不做截断。
///
/// 返回所用的缩放系数。
pub fn normalize_intensity(volume: &mut Array3<f32>, q: f64, target: f64) -> Result<f64> {
    let values: Vec<f32> = volume.iter().copied().collect();
    let p = percentile(&values, q)?;
    if p == 0.0 || !p.is_finite() {
        return Err(AgeError::DegenerateIntensity { q, value: p });
    }
    let scale = target / p;
    debug!("第{q}百分位强度: {p:.4}，缩放系数: {scale:.6}");
    volume.mapv_inplace(|v| (v as f64 * scale) as f32);
    Ok(scale)
}
