//! 从体数据中提取固定范围的二维切片并保存为彩色JPEG图像。

use super::volume::{list_volume_files, load_volume, normalize_intensity, VolumeFilter};
use crate::consts::{INTENSITY_PERCENTILE, SLICE_COUNT, SLICE_OFFSET, TARGET_INTENSITY};
use crate::error::{AgeError, Result};
use image::{Rgb, RgbImage};
use ndarray::{Array3, ArrayView2, Axis};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 切片提取参数。
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub filter: VolumeFilter,
    /// 规范化所用百分位。
    pub percentile: f64,
    /// 该百分位规范化后的强度。
    pub target: f64,
    /// 第一张切片在第三维上的下标。
    pub offset: usize,
    /// 每个体数据的切片数。
    pub count: usize,
}

impl ExtractConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            filter: VolumeFilter::default(),
            percentile: INTENSITY_PERCENTILE,
            target: TARGET_INTENSITY,
            offset: SLICE_OFFSET,
            count: SLICE_COUNT,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub volumes: usize,
    pub slices: usize,
}

/// 体数据文件名去掉扩展名后即为被试ID。
///
/// 识别`.nii.gz`与`.nii`；其他文件名退化为去掉最后一个扩展名。
pub fn subject_stem(file_name: &str) -> Result<&str> {
    let stem = if let Some(s) = file_name.strip_suffix(".nii.gz") {
        s
    } else if let Some(s) = file_name.strip_suffix(".nii") {
        s
    } else {
        Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    };
    if stem.is_empty() {
        return Err(AgeError::BadFileName(file_name.to_string()));
    }
    Ok(stem)
}

#[inline]
pub fn slice_file_name(subject: &str, seq: usize) -> String {
    format!("{subject}-{seq}.jpg")
}

/// 沿第三维取出`[offset, offset + count)`范围内的切片。范围越界时报错。
pub fn extract_band(
    volume: &Array3<f32>,
    offset: usize,
    count: usize,
) -> Result<impl Iterator<Item = ArrayView2<'_, f32>>> {
    let depth = volume.len_of(Axis(2));
    let end = match offset.checked_add(count) {
        Some(end) if end <= depth => end,
        _ => {
            return Err(AgeError::BandOutOfBounds {
                offset,
                count,
                depth,
            })
        }
    };
    Ok((offset..end).map(move |z| volume.index_axis(Axis(2), z)))
}

#[inline]
fn clip_to_u8(v: f32) -> u8 {
    if v >= 255.0 {
        255_u8
    } else if v <= 0.0 {
        0_u8
    } else {
        v as u8
    }
}

/// 将浮点切片转为三通道灰度图。行对应数组第一维，列对应第二维；
/// 像素值截断到`[0, 255]`后向零取整。
pub fn plane_to_rgb(plane: ArrayView2<f32>) -> RgbImage {
    let (h, w) = plane.dim();
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let v = clip_to_u8(plane[(y as usize, x as usize)]);
        Rgb([v, v, v])
    })
}

pub struct SliceExtractor {
    config: ExtractConfig,
}

impl SliceExtractor {
    #[inline]
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<ExtractSummary> {
        let files = list_volume_files(&self.config.input_dir, &self.config.filter)?;
        info!(
            "在`{}`中找到{}个体数据",
            self.config.input_dir.display(),
            files.len()
        );
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| AgeError::io(&self.config.output_dir, e))?;

        let mut summary = ExtractSummary::default();
        for path in files {
            info!("处理文件`{}`...", path.display());
            summary.slices += self
                .run_file(&path)
                .map_err(|e| AgeError::volume(&path, e))?;
            summary.volumes += 1;
        }
        info!(
            "共处理{}个体数据，写入{}张切片",
            summary.volumes, summary.slices
        );
        Ok(summary)
    }

    fn run_file(&self, path: &Path) -> Result<usize> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AgeError::BadFileName(path.to_string_lossy().into_owned()))?;
        let subject = subject_stem(file_name)?;
        let mut volume = load_volume(path)?;
        self.run_volume(subject, &mut volume)
    }

    /// 规范化一个体数据并写出它的全部切片，返回写入的切片数。
    pub fn run_volume(&self, subject: &str, volume: &mut Array3<f32>) -> Result<usize> {
        let ExtractConfig {
            percentile,
            target,
            offset,
            count,
            ..
        } = self.config;
        normalize_intensity(volume, percentile, target)?;

        let mut written = 0;
        for (seq, plane) in extract_band(volume, offset, count)?.enumerate() {
            let path = self.config.output_dir.join(slice_file_name(subject, seq));
            plane_to_rgb(plane)
                .save(&path)
                .map_err(|e| AgeError::image(&path, e))?;
            debug!("\t写入`{}`", path.display());
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use nifti::writer::WriterOptions;

    fn synthetic_volume(depth: usize) -> Array3<f32> {
        Array3::from_shape_fn((12, 10, depth), |(i, j, k)| (i * 10 + j + k) as f32)
    }

    fn write_nifti(path: &Path, volume: &Array3<f32>) {
        WriterOptions::new(path).write_nifti(volume).unwrap();
    }

    #[test]
    fn test_subject_stem() {
        assert_eq!(subject_stem("sub01.nii.gz").unwrap(), "sub01");
        assert_eq!(subject_stem("sub01.nii").unwrap(), "sub01");
        assert_eq!(subject_stem("sub01.mgz").unwrap(), "sub01");
        assert_eq!(subject_stem("a-b.c.nii.gz").unwrap(), "a-b.c");
        assert!(matches!(
            subject_stem(".nii.gz"),
            Err(AgeError::BadFileName(_))
        ));
    }

    #[test]
    fn test_slice_file_name() {
        assert_eq!(slice_file_name("sub01", 0), "sub01-0.jpg");
        assert_eq!(slice_file_name("sub01", 79), "sub01-79.jpg");
    }

    #[test]
    fn test_extract_band_bounds() {
        let volume = synthetic_volume(125);
        let planes: Vec<_> = extract_band(&volume, 45, 80).unwrap().collect();
        assert_eq!(planes.len(), 80);
        assert_eq!(planes[0][(0, 0)], 45.0);
        assert_eq!(planes[79][(0, 0)], 124.0);
        assert_eq!(planes[0].dim(), (12, 10));

        let shallow = synthetic_volume(124);
        assert!(matches!(
            extract_band(&shallow, 45, 80),
            Err(AgeError::BandOutOfBounds { depth: 124, .. })
        ));
        assert!(matches!(
            extract_band(&volume, usize::MAX, 80),
            Err(AgeError::BandOutOfBounds { depth: 125, .. })
        ));
    }

    #[test]
    fn test_plane_to_rgb_clips_and_truncates() {
        let plane = Array2::from_shape_vec((1, 5), vec![0.0, 92.5, 185.0, 277.5, 370.0]).unwrap();
        let img = plane_to_rgb(plane.view());
        assert_eq!(img.dimensions(), (5, 1));
        let row: Vec<u8> = (0..5).map(|x| img.get_pixel(x, 0)[0]).collect();
        assert_eq!(row, [0, 92, 185, 255, 255]);
        assert!(img.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
        assert_eq!(clip_to_u8(-3.0), 0);
    }

    #[test]
    fn test_plane_to_rgb_orientation() {
        // 2行3列：宽3高2
        let plane = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let img = plane_to_rgb(plane.view());
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 0)[0], 3);
        assert_eq!(img.get_pixel(0, 1)[0], 4);
    }

    #[test]
    fn test_run_volume_writes_80_slices() {
        let out = tempfile::tempdir().unwrap();
        let extractor = SliceExtractor::new(ExtractConfig::new("unused", out.path()));
        let mut volume = synthetic_volume(130);
        let written = extractor.run_volume("sub01", &mut volume).unwrap();
        assert_eq!(written, 80);

        let mut names: Vec<String> = fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let mut expected: Vec<String> = (0..80).map(|s| slice_file_name("sub01", s)).collect();
        expected.sort();
        assert_eq!(names, expected);

        let img = image::open(out.path().join("sub01-0.jpg")).unwrap();
        assert_eq!((img.width(), img.height()), (10, 12));
    }

    #[test]
    fn test_run_volume_rejects_shallow_volume() {
        let out = tempfile::tempdir().unwrap();
        let extractor = SliceExtractor::new(ExtractConfig::new("unused", out.path()));
        let mut volume = synthetic_volume(100);
        assert!(matches!(
            extractor.run_volume("sub01", &mut volume),
            Err(AgeError::BandOutOfBounds { .. })
        ));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_fails_on_unreadable_volume() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(input.path().join("broken.nii.gz"), b"not a volume").unwrap();
        let extractor = SliceExtractor::new(ExtractConfig::new(input.path(), out.path()));
        let err = extractor.run().unwrap_err();
        let AgeError::Volume { path, source } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(path.ends_with("broken.nii.gz"));
        assert!(matches!(**source, AgeError::Nifti { .. }));
    }

    #[test]
    fn test_run_names_the_shallow_volume() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_nifti(&input.path().join("good.nii.gz"), &synthetic_volume(130));
        write_nifti(&input.path().join("short.nii.gz"), &synthetic_volume(100));

        let extractor = SliceExtractor::new(ExtractConfig::new(input.path(), out.path()));
        let err = extractor.run().unwrap_err();
        assert!(err.to_string().contains("short.nii.gz"), "{err}");
        let AgeError::Volume { source, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(matches!(
            **source,
            AgeError::BandOutOfBounds { depth: 100, .. }
        ));
    }

    #[test]
    fn test_run_reads_3d_and_single_frame_4d_volumes() {
        let input = tempfile::tempdir().unwrap();
        let out = input.path().join("slices");
        let volume = synthetic_volume(130);
        write_nifti(&input.path().join("a.nii.gz"), &volume);
        WriterOptions::new(input.path().join("b.nii.gz"))
            .write_nifti(&volume.clone().insert_axis(Axis(3)))
            .unwrap();

        let extractor = SliceExtractor::new(ExtractConfig::new(input.path(), &out));
        assert_eq!(
            extractor.run().unwrap(),
            ExtractSummary {
                volumes: 2,
                slices: 160
            }
        );

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let mut expected: Vec<String> = ["a", "b"]
            .iter()
            .flat_map(|s| (0..80).map(move |i| slice_file_name(s, i)))
            .collect();
        expected.sort();
        assert_eq!(names, expected);

        let img = image::open(out.join("b-79.jpg")).unwrap();
        assert_eq!((img.width(), img.height()), (10, 12));
    }

    #[test]
    fn test_run_on_empty_directory() {
        let input = tempfile::tempdir().unwrap();
        let out = input.path().join("slices");
        let extractor = SliceExtractor::new(ExtractConfig::new(input.path(), &out));
        assert_eq!(extractor.run().unwrap(), ExtractSummary::default());
        assert!(out.is_dir());
    }
}
