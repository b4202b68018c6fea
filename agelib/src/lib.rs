//! 脑龄预测流水线：nii体数据切片、按批推理与按被试汇总。

pub mod consts;
pub mod error;
pub mod predict;
pub mod prelude;
pub mod prep;
pub mod subjects;
