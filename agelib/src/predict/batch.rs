//! 切片目录的确定性分批读取。

use crate::consts::{IMAGE_EXTENSIONS, INPUT_HEIGHT, INPUT_WIDTH, PIXEL_SCALE};
use crate::error::{AgeError, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use std::path::{Path, PathBuf};
use std::slice::Chunks;
use walkdir::WalkDir;

/// 批张量的维度顺序。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[N, H, W, C]`
    #[default]
    Nhwc,
    /// `[N, C, H, W]`
    Nchw,
}

/// 模型输入尺寸。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl Default for InputSize {
    fn default() -> Self {
        Self {
            width: INPUT_WIDTH,
            height: INPUT_HEIGHT,
        }
    }
}

/// 一张切片图像。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceEntry {
    pub path: PathBuf,
    pub file_name: String,
    /// 所在子目录名；直接位于根目录时为`None`。
    pub group: Option<String>,
}

/// 切片目录中所有图像，按相对路径排序（先子目录名，后文件名）。
#[derive(Debug)]
pub struct SliceDirectory {
    entries: Vec<SliceEntry>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

impl SliceDirectory {
    /// 收集`dir`及其下一层子目录中的图像文件。
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !is_image(path) {
                continue;
            }
            let group = if entry.depth() == 2 {
                path.parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
            } else {
                None
            };
            entries.push(SliceEntry {
                path: path.to_path_buf(),
                file_name: entry.file_name().to_string_lossy().into_owned(),
                group,
            });
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn entries(&self) -> &[SliceEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按目录顺序每`batch_size`张切片组成一批，最后一批可能不足。
    pub fn batches(
        &self,
        batch_size: usize,
        size: InputSize,
        layout: TensorLayout,
    ) -> Result<SliceBatches<'_>> {
        if batch_size == 0 {
            return Err(AgeError::InvalidConfig("批大小必须大于0"));
        }
        Ok(SliceBatches {
            chunks: self.entries.chunks(batch_size),
            size,
            layout,
        })
    }
}

/// 读入图像并转为RGB；尺寸不符时按最近邻缩放。
pub fn load_slice(path: &Path, size: InputSize) -> Result<RgbImage> {
    let img = image::open(path)
        .map_err(|e| AgeError::image(path, e))?
        .to_rgb8();
    if img.dimensions() == (size.width, size.height) {
        Ok(img)
    } else {
        Ok(imageops::resize(&img, size.width, size.height, FilterType::Nearest))
    }
}

pub struct SliceBatch<'a> {
    pub entries: &'a [SliceEntry],
    pub tensor: Array4<f32>,
}

pub struct SliceBatches<'a> {
    chunks: Chunks<'a, SliceEntry>,
    size: InputSize,
    layout: TensorLayout,
}

impl<'a> SliceBatches<'a> {
    fn load(&self, entries: &'a [SliceEntry]) -> Result<SliceBatch<'a>> {
        let (w, h) = (self.size.width as usize, self.size.height as usize);
        let mut tensor = match self.layout {
            TensorLayout::Nhwc => Array4::<f32>::zeros((entries.len(), h, w, 3)),
            TensorLayout::Nchw => Array4::<f32>::zeros((entries.len(), 3, h, w)),
        };
        for (n, entry) in entries.iter().enumerate() {
            let img = load_slice(&entry.path, self.size)?;
            for (x, y, pixel) in img.enumerate_pixels() {
                let (x, y) = (x as usize, y as usize);
                for c in 0..3 {
                    let v = pixel[c] as f32 * PIXEL_SCALE;
                    match self.layout {
                        TensorLayout::Nhwc => tensor[(n, y, x, c)] = v,
                        TensorLayout::Nchw => tensor[(n, c, y, x)] = v,
                    }
                }
            }
        }
        Ok(SliceBatch { entries, tensor })
    }
}

impl<'a> Iterator for SliceBatches<'a> {
    type Item = Result<SliceBatch<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.chunks.next()?;
        Some(self.load(entries))
    }
}
