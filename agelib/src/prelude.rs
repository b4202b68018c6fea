pub use super::consts::{
    BATCH_SIZE, ID_SEPARATOR, INTENSITY_PERCENTILE, SLICE_COUNT, SLICE_OFFSET, TARGET_INTENSITY,
    VOLUME_SUFFIX,
};
pub use super::error::{AgeError, Result};
pub use super::predict::{
    AgeModel, AgePredictor, InputSize, OnnxAgeModel, PredictConfig, ResultOrder, SubjectAge,
    SubjectSource, TensorLayout,
};
pub use super::prep::{AccTimer, ExtractConfig, ExtractSummary, SliceExtractor, VolumeFilter};
pub use super::subjects::{list_subjects, read_subject_list, write_subject_list};
