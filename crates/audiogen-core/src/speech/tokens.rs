//! Phoneme symbol tables

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AudiogenError, AudiogenResult};

/// Maximum number of phoneme tokens before padding
pub const MAX_TOKENS: usize = 510;

/// Padding token placed at both ends of a sequence
pub const PAD_TOKEN: i64 = 0;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]").expect("valid regex"));

const PAD: &str = "$";
const PUNCTUATION: &str = ";:,.!?¡¿—…\"«»\"\" ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LETTERS_IPA: &str = "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘'̩'ᵻ";

#[derive(Deserialize)]
struct TokenizerFile {
    model: TokenizerModel,
}

#[derive(Deserialize)]
struct TokenizerModel {
    vocab: HashMap<String, i64>,
}

/// Character to token id mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    ids: HashMap<char, i64>,
}

impl SymbolTable {
    /// StyleTTS2 symbol set: pad, punctuation, ASCII letters, IPA letters,
    /// numbered in that order. Later duplicates win.
    #[must_use]
    pub fn styletts2() -> Self {
        let ids = PAD
            .chars()
            .chain(PUNCTUATION.chars())
            .chain(LETTERS.chars())
            .chain(LETTERS_IPA.chars())
            .zip(0_i64..)
            .collect();
        Self { ids }
    }

    /// Vocabulary of a Hugging Face `tokenizer.json` (`model.vocab`).
    /// Multi-character entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns a model error if the file cannot be read or parsed, or has no
    /// single-character entries.
    pub fn from_tokenizer_json(path: &Path) -> AudiogenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AudiogenError::model(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_tokenizer_str(&content)
    }

    /// Parse `tokenizer.json` content.
    ///
    /// # Errors
    ///
    /// See [`SymbolTable::from_tokenizer_json`].
    pub fn from_tokenizer_str(content: &str) -> AudiogenResult<Self> {
        let file: TokenizerFile = serde_json::from_str(content)?;
        let ids: HashMap<char, i64> = file
            .model
            .vocab
            .into_iter()
            .filter_map(|(symbol, id)| {
                let mut chars = symbol.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some((ch, id)),
                    _ => None,
                }
            })
            .collect();
        if ids.is_empty() {
            return Err(AudiogenError::model("tokenizer vocabulary is empty"));
        }
        Ok(Self { ids })
    }

    /// Number of symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Token id of a single symbol
    #[must_use]
    pub fn id(&self, symbol: char) -> Option<i64> {
        self.ids.get(&symbol).copied()
    }

    /// Encode phonemes character by character, skipping unknown symbols
    #[must_use]
    pub fn encode(&self, phonemes: &str) -> Vec<i64> {
        phonemes.chars().filter_map(|c| self.id(c)).collect()
    }

    /// Split into words and punctuation marks, join them with single spaces
    /// and encode.
    #[must_use]
    pub fn encode_words(&self, phonemes: &str) -> Vec<i64> {
        let spaced = WORD_RE
            .find_iter(phonemes)
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.encode(&spaced)
    }
}

/// Surround tokens with padding: `[0, ...tokens, 0]`
#[must_use]
pub fn pad(tokens: &[i64]) -> Vec<i64> {
    let mut padded = Vec::with_capacity(tokens.len() + 2);
    padded.push(PAD_TOKEN);
    padded.extend_from_slice(tokens);
    padded.push(PAD_TOKEN);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    const KOKORO_TOKENIZER: &str = r#"{
        "version": "1.0",
        "model": {
            "vocab": {
                "$": 0, ";": 1, ",": 3, ".": 4, "!": 5, " ": 16,
                "d": 46, "e": 47, "h": 50, "l": 54, "o": 57, "r": 60, "w": 65,
                "ə": 83, "ˈ": 156, "ab": 999
            }
        }
    }"#;

    #[test]
    fn test_tokenizer_vocab() {
        let table = SymbolTable::from_tokenizer_str(KOKORO_TOKENIZER).unwrap();
        assert_eq!(table.len(), 15);
        assert_eq!(table.encode("hello"), vec![50, 47, 54, 54, 57]);
        assert_eq!(table.id('ə'), Some(83));
    }

    #[test]
    fn test_unknown_symbols_are_skipped() {
        let table = SymbolTable::from_tokenizer_str(KOKORO_TOKENIZER).unwrap();
        assert_eq!(table.encode("h€llo"), vec![50, 54, 54, 57]);
        assert_eq!(
            table.encode("hello, world!"),
            vec![50, 47, 54, 54, 57, 3, 16, 65, 57, 60, 54, 46, 5]
        );
    }

    #[test]
    fn test_tokenizer_errors() {
        assert!(SymbolTable::from_tokenizer_str("not json").is_err());
        let err = SymbolTable::from_tokenizer_str(r#"{"model": {"vocab": {"ab": 1}}}"#).unwrap_err();
        assert_eq!(err.category(), "model");
    }

    #[test]
    fn test_styletts2_layout() {
        let table = SymbolTable::styletts2();
        assert_eq!(table.id('$'), Some(0));
        assert_eq!(table.id(';'), Some(1));
        assert_eq!(table.id(' '), Some(16));
        assert_eq!(table.id('A'), Some(17));
        assert_eq!(table.id('a'), Some(43));
        assert_eq!(table.id('ɑ'), Some(69));
        assert!(table.id('€').is_none());
    }

    #[test]
    fn test_encode_words_normalizes_spacing() {
        let table = SymbolTable::styletts2();
        let a = table.encode_words("həlˈoʊ,  wˈɜːld!");
        let b = table.encode("həlˈoʊ , wˈɜːld !");
        assert_eq!(a, b);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad(&[50, 47]), vec![0, 50, 47, 0]);
        assert_eq!(pad(&[]), vec![0, 0]);
    }
}
