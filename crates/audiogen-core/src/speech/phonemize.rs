//! Grapheme-to-phoneme conversion.
//!
//! Kokoro reads misaki phonemes; [`FallbackPhonemizer`] pairs misaki with
//! espeak-ng for words the lexicon cannot handle. KittenTTS uses espeak-ng
//! alone.

use std::fmt;
use std::process::Command;

use misaki_rs::{Language, G2P};

use crate::config::EspeakConfig;
use crate::error::{AudiogenError, AudiogenResult};

/// Punctuation the acoustic models use for prosody but espeak drops
pub const PRESERVED_PUNCTUATION: &[char] = &[
    '\u{2014}', // em dash
    '\u{2026}', // ellipsis
    ';',
    ':',
    '"',
    '\u{201c}',
    '\u{201d}',
];

/// Text to IPA phonemes
#[cfg_attr(test, mockall::automock)]
pub trait Phonemizer {
    /// Convert text to an IPA phoneme string
    ///
    /// # Errors
    ///
    /// Returns a phonemizer error if conversion fails.
    fn phonemize(&self, text: &str) -> AudiogenResult<String>;
}

/// Phonemizer backed by the `espeak-ng` executable
#[derive(Debug, Clone)]
pub struct EspeakPhonemizer {
    program: String,
    language: String,
}

impl EspeakPhonemizer {
    /// Create from config
    #[must_use]
    pub fn new(config: &EspeakConfig) -> Self {
        Self {
            program: config.program.clone(),
            language: config.language.clone(),
        }
    }

    /// Check that the executable runs, returning its version line.
    ///
    /// # Errors
    ///
    /// Returns a phonemizer error if the program is missing or fails.
    pub fn version(&self) -> AudiogenResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.spawn_error(&e))?;
        if !output.status.success() {
            return Err(AudiogenError::phonemizer(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run(&self, text: &str) -> AudiogenResult<String> {
        let output = Command::new(&self.program)
            .args(["-q", "--ipa", "-v", &self.language, text])
            .output()
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudiogenError::phonemizer(format!(
                "{} failed: {}",
                self.program,
                stderr.trim()
            )));
        }

        Ok(join_lines(&String::from_utf8_lossy(&output.stdout)))
    }

    fn spawn_error(&self, err: &std::io::Error) -> AudiogenError {
        if err.kind() == std::io::ErrorKind::NotFound {
            AudiogenError::phonemizer(format!(
                "{} not found. Install espeak-ng (e.g. `apt install espeak-ng` or `brew install espeak-ng`)",
                self.program
            ))
        } else {
            AudiogenError::phonemizer(format!("failed to run {}: {err}", self.program))
        }
    }
}

/// Phonemizer backed by the misaki lexicon and tagger
pub struct MisakiPhonemizer {
    g2p: G2P,
}

impl MisakiPhonemizer {
    /// Build the G2P engine for an espeak-style language code.
    /// `en-gb` selects British English; everything else American.
    #[must_use]
    pub fn new(language: &str) -> Self {
        let language = if language.eq_ignore_ascii_case("en-gb") {
            Language::EnglishGB
        } else {
            Language::EnglishUS
        };
        tracing::info!("Initializing misaki G2P ({language:?})");
        Self {
            g2p: G2P::new(language),
        }
    }
}

impl fmt::Debug for MisakiPhonemizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MisakiPhonemizer").finish_non_exhaustive()
    }
}

impl Phonemizer for MisakiPhonemizer {
    fn phonemize(&self, text: &str) -> AudiogenResult<String> {
        let (phonemes, _) = self
            .g2p
            .g2p(text)
            .map_err(|e| AudiogenError::phonemizer(format!("misaki failed: {e}")))?;
        Ok(phonemes.trim().to_string())
    }
}

/// Tries `primary` on every segment between preserved punctuation marks and
/// hands the segment to `fallback` when it fails or yields nothing
pub struct FallbackPhonemizer {
    primary: Box<dyn Phonemizer>,
    fallback: Box<dyn Phonemizer>,
}

impl FallbackPhonemizer {
    /// Pair a primary phonemizer with a fallback
    #[must_use]
    pub fn new(primary: Box<dyn Phonemizer>, fallback: Box<dyn Phonemizer>) -> Self {
        Self { primary, fallback }
    }

    fn phonemize_segment(&self, segment: &str) -> AudiogenResult<String> {
        match self.primary.phonemize(segment) {
            Ok(phonemes) if !phonemes.trim().is_empty() => Ok(phonemes.trim().to_string()),
            Ok(_) => {
                tracing::debug!("Primary phonemizer returned nothing for {segment:?}, using fallback");
                self.fallback.phonemize(segment)
            }
            Err(e) => {
                tracing::warn!("Primary phonemizer failed for {segment:?}: {e}, using fallback");
                self.fallback.phonemize(segment)
            }
        }
    }
}

impl Phonemizer for FallbackPhonemizer {
    fn phonemize(&self, text: &str) -> AudiogenResult<String> {
        phonemize_segments(text, |segment| self.phonemize_segment(segment))
    }
}

impl Phonemizer for EspeakPhonemizer {
    fn phonemize(&self, text: &str) -> AudiogenResult<String> {
        let phonemes = phonemize_segments(text, |segment| self.run(segment))?;
        tracing::debug!("Phonemized {} chars into {} phoneme chars", text.len(), phonemes.len());
        Ok(phonemes)
    }
}

// espeak prints one line per clause and strips sentence punctuation
fn join_lines(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(". ")
}

/// Phonemize the text between preserved punctuation marks with `phonemize`
/// and re-insert the marks, space separated.
///
/// # Errors
///
/// Propagates the first error from `phonemize`.
pub fn phonemize_segments<F>(text: &str, mut phonemize: F) -> AudiogenResult<String>
where
    F: FnMut(&str) -> AudiogenResult<String>,
{
    let mut result = String::new();
    let mut segment = String::new();

    let mut flush = |segment: &mut String, result: &mut String| -> AudiogenResult<()> {
        let trimmed = segment.trim();
        if !trimmed.is_empty() {
            let phonemes = phonemize(trimmed)?;
            if !phonemes.is_empty() {
                push_word(result, &phonemes);
            }
        }
        segment.clear();
        Ok(())
    };

    for ch in text.chars() {
        if PRESERVED_PUNCTUATION.contains(&ch) {
            flush(&mut segment, &mut result)?;
            push_word(&mut result, ch.encode_utf8(&mut [0; 4]));
        } else {
            segment.push(ch);
        }
    }
    flush(&mut segment, &mut result)?;

    Ok(result)
}

fn push_word(out: &mut String, word: &str) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str(word);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(segment: &str) -> AudiogenResult<String> {
        Ok(segment.to_uppercase())
    }

    #[test]
    fn test_segments_preserve_em_dash() {
        let out = phonemize_segments("he felt something \u{2014} courage", fake).unwrap();
        assert_eq!(out, "HE FELT SOMETHING \u{2014} COURAGE");
    }

    #[test]
    fn test_segments_preserve_quotes() {
        let out = phonemize_segments("She said \u{201c}hello\u{201d} softly", fake).unwrap();
        assert_eq!(out, "SHE SAID \u{201c} HELLO \u{201d} SOFTLY");
    }

    #[test]
    fn test_segments_only_punctuation() {
        let out = phonemize_segments("\u{2026}", |_| panic!("nothing to phonemize")).unwrap();
        assert_eq!(out, "\u{2026}");
    }

    #[test]
    fn test_segments_propagate_errors() {
        let err = phonemize_segments("a; b", |_| Err(AudiogenError::phonemizer("boom"))).unwrap_err();
        assert_eq!(err, AudiogenError::phonemizer("boom"));
    }

    fn fixed(result: AudiogenResult<&'static str>, calls: usize) -> Box<MockPhonemizer> {
        let mut phonemizer = MockPhonemizer::new();
        phonemizer
            .expect_phonemize()
            .times(calls)
            .returning(move |_| result.clone().map(str::to_string));
        Box::new(phonemizer)
    }

    #[test]
    fn test_fallback_unused_when_primary_succeeds() {
        let phonemizer = FallbackPhonemizer::new(fixed(Ok(" hɛlO "), 1), fixed(Ok("unused"), 0));
        assert_eq!(phonemizer.phonemize("hello").unwrap(), "hɛlO");
    }

    #[test]
    fn test_fallback_on_empty_primary() {
        let phonemizer = FallbackPhonemizer::new(fixed(Ok("  "), 1), fixed(Ok("həlˈoʊ"), 1));
        assert_eq!(phonemizer.phonemize("hello").unwrap(), "həlˈoʊ");
    }

    #[test]
    fn test_fallback_on_primary_error() {
        let phonemizer = FallbackPhonemizer::new(
            fixed(Err(AudiogenError::phonemizer("no entry")), 1),
            fixed(Ok("zˈɪzi"), 1),
        );
        assert_eq!(phonemizer.phonemize("xyzzy").unwrap(), "zˈɪzi");
    }

    #[test]
    fn test_fallback_keeps_punctuation() {
        let mut primary = MockPhonemizer::new();
        primary
            .expect_phonemize()
            .times(2)
            .returning(|text| Ok(if text == "wait" { String::new() } else { text.to_uppercase() }));
        let phonemizer = FallbackPhonemizer::new(Box::new(primary), fixed(Ok("wˈeɪt"), 1));
        assert_eq!(
            phonemizer.phonemize("wait \u{2026} now").unwrap(),
            "wˈeɪt \u{2026} NOW"
        );
    }

    #[test]
    fn test_misaki_phonemizes_common_words() {
        let phonemizer = MisakiPhonemizer::new("en-us");
        let phonemes = phonemizer.phonemize("Hello world").unwrap();
        assert!(!phonemes.is_empty());
        assert!(!phonemes.contains("Hello"));
    }

    #[test]
    fn test_join_lines() {
        assert_eq!(join_lines("həlˈoʊ\n\n wˈɜːld \n"), "həlˈoʊ. wˈɜːld");
        assert_eq!(join_lines(""), "");
    }

    #[test]
    fn test_missing_program_is_phonemizer_error() {
        let phonemizer = EspeakPhonemizer::new(&EspeakConfig {
            program: "definitely-not-espeak-ng".to_string(),
            language: "en-us".to_string(),
        });
        let err = phonemizer.phonemize("hello").unwrap_err();
        assert_eq!(err.category(), "phonemizer");
        assert!(err.to_string().contains("not found"));
        assert!(phonemizer.version().is_err());
    }

    #[test]
    fn test_espeak_when_available() {
        let phonemizer = EspeakPhonemizer::new(&EspeakConfig::default());
        if phonemizer.version().is_err() {
            return;
        }
        let phonemes = phonemizer.phonemize("Hello \u{2014} world").unwrap();
        assert!(phonemes.contains('\u{2014}'));
    }
}
