//! KittenTTS speech backend.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::onnx::{OnnxSession, StyleTtsEngine};
use super::phonemize::Phonemizer;
use super::text;
use super::tokens::{self, SymbolTable, MAX_TOKENS};
use super::voices::VoiceBank;
use super::{SpeechModel, SpeechRequest};
use crate::audio::AudioBuffer;
use crate::error::{AudiogenError, AudiogenResult};
use crate::model::ModelId;

/// Characters per inference chunk
pub const MAX_CHUNK_CHARS: usize = 400;

/// Samples dropped from the end of every chunk
pub const TAIL_TRIM_SAMPLES: usize = 5000;

/// `config.json` shipped with the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KittenConfig {
    /// Model family tag
    #[serde(rename = "type", default)]
    pub model_type: String,
    /// ONNX graph, relative to the snapshot
    pub model_file: String,
    /// NPZ voice archive, relative to the snapshot
    pub voices: String,
    /// Per-voice speed multipliers
    #[serde(default)]
    pub speed_priors: HashMap<String, f32>,
    /// Display names mapped to voice ids
    #[serde(default)]
    pub voice_aliases: HashMap<String, String>,
}

impl KittenConfig {
    /// Read `config.json` from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a model error if the file is missing or malformed.
    pub fn load(snapshot: &Path) -> AudiogenResult<Self> {
        let path = snapshot.join("config.json");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            AudiogenError::model(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AudiogenError::model(format!("Invalid {}: {e}", path.display()))
        })
    }
}

/// KittenTTS synthesizer
pub struct KittenSpeech {
    engine: Box<dyn StyleTtsEngine>,
    symbols: SymbolTable,
    voices: VoiceBank,
    phonemizer: Box<dyn Phonemizer>,
    speed_priors: HashMap<String, f32>,
    voice_aliases: HashMap<String, String>,
}

impl KittenSpeech {
    /// Assemble from parts
    #[must_use]
    pub fn new(
        engine: Box<dyn StyleTtsEngine>,
        voices: VoiceBank,
        phonemizer: Box<dyn Phonemizer>,
        config: &KittenConfig,
    ) -> Self {
        Self {
            engine,
            symbols: SymbolTable::styletts2(),
            voices,
            phonemizer,
            speed_priors: config.speed_priors.clone(),
            voice_aliases: config.voice_aliases.clone(),
        }
    }

    /// Load the model described by the snapshot's `config.json`.
    ///
    /// # Errors
    ///
    /// Returns a model error if any file is missing or malformed.
    pub fn load(snapshot: &Path, phonemizer: Box<dyn Phonemizer>) -> AudiogenResult<Self> {
        let config = KittenConfig::load(snapshot)?;
        tracing::info!(
            "Loading KittenTTS '{}' from {}",
            config.model_type,
            snapshot.display()
        );
        let voices = VoiceBank::load_npz(&snapshot.join(&config.voices))?;
        let engine = OnnxSession::load(&snapshot.join(&config.model_file))?;
        Ok(Self::new(Box::new(engine), voices, phonemizer, &config))
    }

    /// Resolve an alias to its voice id.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for unknown voices.
    pub fn resolve_voice(&self, voice: &str) -> AudiogenResult<String> {
        let resolved = self
            .voice_aliases
            .get(voice)
            .cloned()
            .unwrap_or_else(|| voice.to_string());
        if self.voices.contains(&resolved) {
            Ok(resolved)
        } else {
            Err(AudiogenError::invalid_input(format!(
                "Unknown voice '{voice}'. Available: {}",
                self.voices().join(", ")
            )))
        }
    }

    fn synthesize_chunk(&mut self, chunk: &str, voice: &str, speed: f32) -> AudiogenResult<Vec<f32>> {
        let phonemes = self.phonemizer.phonemize(chunk)?;
        let ids = self.symbols.encode_words(&phonemes);
        if ids.is_empty() {
            return Err(AudiogenError::synthesis(format!(
                "no phoneme tokens for chunk '{chunk}'"
            )));
        }
        if ids.len() > MAX_TOKENS {
            return Err(AudiogenError::invalid_input(format!(
                "chunk produced {} phoneme tokens (max {MAX_TOKENS})",
                ids.len()
            )));
        }

        let style = self.voices.get(voice)?;
        let row = style.row(chunk.chars().count());
        let audio = self.engine.infer(&tokens::pad(&ids), row, speed)?;
        let mut buffer = AudioBuffer::mono(audio, crate::SPEECH_SAMPLE_RATE);
        buffer.trim_tail(TAIL_TRIM_SAMPLES);
        Ok(buffer.samples)
    }
}

impl SpeechModel for KittenSpeech {
    fn model_id(&self) -> ModelId {
        ModelId::KittenTts
    }

    fn sample_rate(&self) -> u32 {
        crate::SPEECH_SAMPLE_RATE
    }

    fn voices(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .voice_aliases
            .keys()
            .cloned()
            .chain(self.voices.names())
            .collect();
        names.into_iter().collect()
    }

    fn generate(&mut self, request: &SpeechRequest) -> AudiogenResult<Vec<Vec<f32>>> {
        let voice = self.resolve_voice(&request.voice)?;
        let speed = request.speed * self.speed_priors.get(&voice).copied().unwrap_or(1.0);
        let chunks = text::chunk_text(&text::normalize(&request.text), MAX_CHUNK_CHARS);
        tracing::info!(
            "KittenTTS: {} chunk(s), voice '{}' ({}), speed {}",
            chunks.len(),
            request.voice,
            voice,
            speed
        );

        chunks
            .iter()
            .map(|chunk| self.synthesize_chunk(chunk, &voice, speed))
            .collect()
    }
}
