pub mod log;
pub mod slice;
pub mod volume;

pub use log::AccTimer;
pub use slice::{
    extract_band, plane_to_rgb, slice_file_name, subject_stem, ExtractConfig, ExtractSummary,
    SliceExtractor,
};
pub use volume::{list_volume_files, load_volume, normalize_intensity, percentile, VolumeFilter};
