//! 流水线默认参数。

/// 强度规范化所用的百分位。
pub const INTENSITY_PERCENTILE: f64 = 97.0;

/// 规范化后该百分位对应的强度值。
pub const TARGET_INTENSITY: f64 = 185.0;

/// 第一张切片在第三维上的下标。
pub const SLICE_OFFSET: usize = 45;

/// 每个体数据提取的切片数。
pub const SLICE_COUNT: usize = 80;

/// 默认只处理该后缀的体数据文件。
pub const VOLUME_SUFFIX: &str = ".nii.gz";

/// 推理批大小，同时也是每个被试默认的切片数。
pub const BATCH_SIZE: usize = 80;

/// 模型输入图像宽度。
pub const INPUT_WIDTH: u32 = 256;

/// 模型输入图像高度。
pub const INPUT_HEIGHT: u32 = 256;

/// 切片文件名中被试ID与切片序号之间的分隔符。
pub const ID_SEPARATOR: char = '-';

/// 像素缩放系数。
pub const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// 预测器可读取的图像扩展名。
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "ppm", "tif", "tiff"];
