//! 预训练年龄模型。

use crate::error::{AgeError, Result};
use ndarray::Array4;
use ort::logging::LogLevel;
use ort::session::{Session, SessionInputs};
use ort::value::TensorRef;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info};

/// 对一批切片图像给出逐张的标量预测。
pub trait AgeModel {
    /// 返回值长度必须等于批大小，顺序与输入一致。
    fn predict(&mut self, batch: &Array4<f32>) -> Result<Vec<f32>>;
}

/// 基于ONNX Runtime的模型。
pub struct OnnxAgeModel {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxAgeModel {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self> {
        let path = model_path.as_ref();
        info!("加载模型`{}`", path.display());
        let session = Session::builder()
            .map_err(AgeError::ort)?
            .with_log_level(LogLevel::Error)
            .map_err(AgeError::ort)?
            .commit_from_file(path)
            .map_err(|e| AgeError::ort(format!("无法加载模型`{}`: {e}", path.display())))?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| AgeError::ort("模型没有输入"))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| AgeError::ort("模型没有输出"))?;
        debug!("模型输入: {input_name}，输出: {output_name}");

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

impl AgeModel for OnnxAgeModel {
    fn predict(&mut self, batch: &Array4<f32>) -> Result<Vec<f32>> {
        let dims: Vec<i64> = batch.shape().iter().map(|&d| d as i64).collect();
        let data = batch
            .as_slice()
            .ok_or_else(|| AgeError::ort("批张量在内存中不连续"))?;
        let tensor = TensorRef::from_array_view((dims, data)).map_err(AgeError::ort)?;

        let inputs: SessionInputs<'_, '_, 0> =
            SessionInputs::ValueMap(vec![(Cow::Borrowed(self.input_name.as_str()), tensor.into())]);
        let outputs = self.session.run(inputs).map_err(AgeError::ort)?;
        let (_, values) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(AgeError::ort)?;

        let expected = batch.shape()[0];
        if values.len() != expected {
            return Err(AgeError::BadModelOutput {
                expected,
                got: values.len(),
            });
        }
        Ok(values.to_vec())
    }
}
