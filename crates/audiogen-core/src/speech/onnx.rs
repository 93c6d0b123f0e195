//! StyleTTS-family ONNX inference.

use std::collections::HashMap;
use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

use crate::error::{AudiogenError, AudiogenResult};

const DEFAULT_INPUT_NAMES: [&str; 3] = ["input_ids", "style", "speed"];

/// One forward pass: padded token ids, a style vector and a speed factor in,
/// mono waveform out.
#[cfg_attr(test, mockall::automock)]
pub trait StyleTtsEngine {
    /// Run the acoustic model
    ///
    /// # Errors
    ///
    /// Returns a synthesis error if inference fails.
    fn infer(&mut self, input_ids: &[i64], style: &[f32], speed: f32) -> AudiogenResult<Vec<f32>>;
}

/// ONNX Runtime session for a StyleTTS-family graph
pub struct OnnxSession {
    session: Session,
    input_names: [String; 3],
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("input_names", &self.input_names)
            .finish_non_exhaustive()
    }
}

/// Optimization level and intra-op threads for a model file.
/// Quantized graphs get basic optimization and at most four threads.
#[must_use]
pub fn session_settings(model_path: &Path, physical_cores: usize) -> (GraphOptimizationLevel, usize) {
    let filename = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cores = physical_cores.max(1);
    if filename.contains("int8") || filename.contains("quantized") {
        (GraphOptimizationLevel::Level1, cores.min(4))
    } else {
        (GraphOptimizationLevel::Level3, cores.min(8))
    }
}

impl OnnxSession {
    /// Build a session from an `.onnx` file. ONNX Runtime must already be
    /// initialized.
    ///
    /// # Errors
    ///
    /// Returns a model error if the file is missing or the graph fails to load.
    pub fn load(model_path: &Path) -> AudiogenResult<Self> {
        if !model_path.is_file() {
            return Err(AudiogenError::model(format!(
                "ONNX model not found: {}",
                model_path.display()
            )));
        }

        let (level, intra_threads) = session_settings(model_path, num_cpus::get_physical());
        tracing::debug!(
            "Creating ONNX session for {} ({:?}, {} intra threads)",
            model_path.display(),
            level,
            intra_threads
        );

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(level))
            .and_then(|b| b.with_intra_threads(intra_threads))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                AudiogenError::model(format!(
                    "Failed to load {}: {e}",
                    model_path.display()
                ))
            })?;

        let mut input_names = DEFAULT_INPUT_NAMES.map(str::to_string);
        for (slot, input) in input_names.iter_mut().zip(session.inputs.iter()) {
            slot.clone_from(&input.name);
        }
        tracing::info!("Loaded ONNX model {} (inputs: {:?})", model_path.display(), input_names);

        Ok(Self {
            session,
            input_names,
        })
    }
}

impl StyleTtsEngine for OnnxSession {
    fn infer(&mut self, input_ids: &[i64], style: &[f32], speed: f32) -> AudiogenResult<Vec<f32>> {
        let tensor_error = |e: ort::Error| AudiogenError::synthesis(format!("failed to build input tensor: {e}"));

        let mut inputs: HashMap<String, ort::value::Value> = HashMap::new();
        let ids = ort::value::Tensor::from_array(([1, input_ids.len()], input_ids.to_vec()))
            .map_err(tensor_error)?;
        inputs.insert(self.input_names[0].clone(), ids.into());
        let style = ort::value::Tensor::from_array(([1, style.len()], style.to_vec()))
            .map_err(tensor_error)?;
        inputs.insert(self.input_names[1].clone(), style.into());
        let speed = ort::value::Tensor::from_array(([1], vec![speed])).map_err(tensor_error)?;
        inputs.insert(self.input_names[2].clone(), speed.into());

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| AudiogenError::synthesis(format!("ONNX inference failed: {e}")))?;

        let extract_error = |e: ort::Error| AudiogenError::synthesis(format!("failed to read model output: {e}"));
        let audio: Vec<f32> = if let Some(output) = outputs.get("waveform") {
            let (_, data) = output.try_extract_tensor::<f32>().map_err(extract_error)?;
            data.to_vec()
        } else if let Some(output) = outputs.get("audio") {
            let (_, data) = output.try_extract_tensor::<f32>().map_err(extract_error)?;
            data.to_vec()
        } else if let Some((_, output)) = outputs.iter().next() {
            let (_, data) = output.try_extract_tensor::<f32>().map_err(extract_error)?;
            data.to_vec()
        } else {
            return Err(AudiogenError::synthesis("model produced no outputs"));
        };

        tracing::debug!("Generated {} samples from {} tokens", audio.len(), input_ids.len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantized_models_use_conservative_settings() {
        let (level, threads) = session_settings(Path::new("onnx/model_quantized.onnx"), 16);
        assert!(matches!(level, GraphOptimizationLevel::Level1));
        assert_eq!(threads, 4);
    }

    #[test]
    fn test_fp32_models_use_full_optimization() {
        let (level, threads) = session_settings(Path::new("kitten_tts_nano_v0_8.onnx"), 16);
        assert!(matches!(level, GraphOptimizationLevel::Level3));
        assert_eq!(threads, 8);

        let (_, threads) = session_settings(Path::new("model.onnx"), 0);
        assert_eq!(threads, 1);
    }

    #[test]
    fn test_missing_model_file() {
        let err = OnnxSession::load(Path::new("/nonexistent/model.onnx")).unwrap_err();
        assert_eq!(err.category(), "model");
    }
}
