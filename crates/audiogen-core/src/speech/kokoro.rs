//! Kokoro-82M speech backend.

use std::path::Path;

use super::onnx::{OnnxSession, StyleTtsEngine};
use super::phonemize::Phonemizer;
use super::text;
use super::tokens::{self, SymbolTable, MAX_TOKENS};
use super::voices::{VoiceBank, STYLE_DIM};
use super::{SpeechModel, SpeechRequest};
use crate::audio::{AudioBuffer, DEFAULT_PEAK};
use crate::error::{AudiogenError, AudiogenResult};
use crate::model::ModelId;

/// Graph file inside the snapshot
pub const MODEL_FILE: &str = "onnx/model_quantized.onnx";
/// Vocabulary file inside the snapshot
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Voice directory inside the snapshot
pub const VOICES_DIR: &str = "voices";

/// Kokoro synthesizer
pub struct KokoroSpeech {
    engine: Box<dyn StyleTtsEngine>,
    symbols: SymbolTable,
    voices: VoiceBank,
    phonemizer: Box<dyn Phonemizer>,
}

impl KokoroSpeech {
    /// Assemble from parts
    #[must_use]
    pub fn new(
        engine: Box<dyn StyleTtsEngine>,
        symbols: SymbolTable,
        voices: VoiceBank,
        phonemizer: Box<dyn Phonemizer>,
    ) -> Self {
        Self {
            engine,
            symbols,
            voices,
            phonemizer,
        }
    }

    /// Load the graph, vocabulary and voices from a snapshot directory.
    ///
    /// # Errors
    ///
    /// Returns a model error if any file is missing or malformed.
    pub fn load(snapshot: &Path, phonemizer: Box<dyn Phonemizer>) -> AudiogenResult<Self> {
        tracing::info!("Loading Kokoro from {}", snapshot.display());
        let symbols = SymbolTable::from_tokenizer_json(&snapshot.join(TOKENIZER_FILE))?;
        let voices = VoiceBank::load_dir(&snapshot.join(VOICES_DIR), STYLE_DIM)?;
        let engine = OnnxSession::load(&snapshot.join(MODEL_FILE))?;
        Ok(Self::new(Box::new(engine), symbols, voices, phonemizer))
    }

    fn tokenize_sentences(&self, text: &str) -> AudiogenResult<Vec<Vec<i64>>> {
        let normalized = text::normalize(text);
        let mut sentences = Vec::new();
        for sentence in text::split_sentences(&normalized) {
            let phonemes = self.phonemizer.phonemize(&sentence)?;
            let ids = self.symbols.encode(&phonemes);
            if !ids.is_empty() {
                sentences.push(ids);
            }
        }
        Ok(sentences)
    }

    fn batch(&self, sentences: Vec<Vec<i64>>) -> Vec<Vec<i64>> {
        let separator = self.symbols.id(' ');
        let mut batches = Vec::new();
        let mut current: Vec<i64> = Vec::new();

        for sentence in sentences {
            for ids in split_long_sentence(sentence, separator) {
                let joined = current.len() + usize::from(separator.is_some()) + ids.len();
                if !current.is_empty() && joined > MAX_BATCH_TOKENS {
                    batches.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    if let Some(space) = separator {
                        current.push(space);
                    }
                }
                current.extend(ids);
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

/// Style rows are indexed by token count and stop below [`MAX_TOKENS`]
const MAX_BATCH_TOKENS: usize = MAX_TOKENS - 1;

/// Split a sentence that does not fit one batch at word boundaries. A word
/// longer than a batch is cut into fixed windows.
fn split_long_sentence(ids: Vec<i64>, separator: Option<i64>) -> Vec<Vec<i64>> {
    if ids.len() <= MAX_BATCH_TOKENS {
        return vec![ids];
    }
    tracing::debug!(
        "Sentence has {} phoneme tokens, splitting at word boundaries",
        ids.len()
    );

    let words: Vec<&[i64]> = match separator {
        Some(space) => ids
            .split(|&id| id == space)
            .filter(|word| !word.is_empty())
            .collect(),
        None => vec![ids.as_slice()],
    };

    let mut pieces = Vec::new();
    let mut current: Vec<i64> = Vec::new();
    for word in words {
        for window in word.chunks(MAX_BATCH_TOKENS) {
            let gap = usize::from(!current.is_empty() && separator.is_some());
            if !current.is_empty() && current.len() + gap + window.len() > MAX_BATCH_TOKENS {
                pieces.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                if let Some(space) = separator {
                    current.push(space);
                }
            }
            current.extend_from_slice(window);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

impl SpeechModel for KokoroSpeech {
    fn model_id(&self) -> ModelId {
        ModelId::Kokoro
    }

    fn sample_rate(&self) -> u32 {
        crate::SPEECH_SAMPLE_RATE
    }

    fn voices(&self) -> Vec<String> {
        self.voices.names()
    }

    fn generate(&mut self, request: &SpeechRequest) -> AudiogenResult<Vec<Vec<f32>>> {
        let style = self.voices.get(&request.voice)?;
        let batches = self.batch(self.tokenize_sentences(&request.text)?);
        if batches.is_empty() {
            return Err(AudiogenError::synthesis("text produced no phoneme tokens"));
        }
        tracing::info!(
            "Kokoro: {} batch(es), voice '{}', speed {}",
            batches.len(),
            request.voice,
            request.speed
        );

        let mut chunks = Vec::with_capacity(batches.len());
        for ids in &batches {
            let row = style.row(ids.len());
            chunks.push(self.engine.infer(&tokens::pad(ids), row, request.speed)?);
        }

        let mut buffer = AudioBuffer::concat_mono(chunks, self.sample_rate());
        buffer.normalize(DEFAULT_PEAK);
        Ok(vec![buffer.samples])
    }
}
