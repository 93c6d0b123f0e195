//! Voice style matrices.
//!
//! A voice is a `rows x cols` f32 matrix; the acoustic model takes one row as
//! its style vector. Two on-disk formats are supported: an NPZ archive of
//! `.npy` arrays, and a directory of raw little-endian `.bin` files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{AudiogenError, AudiogenResult};

/// Width of a style vector
pub const STYLE_DIM: usize = 256;

const MAX_NPY_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// One voice's style matrix
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceStyle {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl VoiceStyle {
    /// Build from row-major data.
    ///
    /// # Errors
    ///
    /// Returns a model error if the data length is not `rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> AudiogenResult<Self> {
        if cols == 0 || rows == 0 || rows.checked_mul(cols) != Some(data.len()) {
            return Err(AudiogenError::model(format!(
                "style matrix {rows}x{cols} does not match {} values",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of rows
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Row `index`, clamped to the last row
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        let index = index.min(self.rows - 1);
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }
}

/// Named voices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceBank {
    voices: BTreeMap<String, VoiceStyle>,
}

impl VoiceBank {
    /// Load every `.npy` entry of an NPZ archive.
    ///
    /// # Errors
    ///
    /// Returns a model error if the archive is unreadable, an entry is not a
    /// little-endian f32 C-order array, or no voices are found.
    pub fn load_npz(path: &Path) -> AudiogenResult<Self> {
        let file = File::open(path).map_err(|e| {
            AudiogenError::model(format!("Failed to open voices {}: {e}", path.display()))
        })?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| AudiogenError::model(format!("Failed to read NPZ archive: {e}")))?;

        let mut voices = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| AudiogenError::model(format!("Failed to read NPZ entry {i}: {e}")))?;
            let Some(name) = entry.name().strip_suffix(".npy").map(str::to_string) else {
                continue;
            };

            let mut raw = Vec::new();
            (&mut entry)
                .take(MAX_NPY_ENTRY_BYTES + 1)
                .read_to_end(&mut raw)?;
            if raw.len() as u64 > MAX_NPY_ENTRY_BYTES {
                return Err(AudiogenError::model(format!("voice '{name}' is too large")));
            }

            let style = parse_npy_f32(&raw)
                .map_err(|e| AudiogenError::model(format!("voice '{name}': {e}")))?;
            voices.insert(name, style);
        }

        Self::non_empty(voices, path)
    }

    /// Load `<name>.bin` files of raw little-endian f32 rows of `cols` values.
    /// Files whose size is not a whole number of rows are skipped.
    ///
    /// # Errors
    ///
    /// Returns a model error if the directory is unreadable or holds no
    /// valid voice files.
    pub fn load_dir(dir: &Path, cols: usize) -> AudiogenResult<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            AudiogenError::model(format!("Failed to read voices directory {}: {e}", dir.display()))
        })?;

        let mut voices = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let raw = std::fs::read(&path)?;
            let row_bytes = cols * 4;
            if raw.is_empty() || raw.len() % row_bytes != 0 {
                tracing::warn!(
                    "Skipping voice '{}': {} bytes is not a multiple of {}",
                    name,
                    raw.len(),
                    row_bytes
                );
                continue;
            }
            let style = VoiceStyle::new(raw.len() / row_bytes, cols, le_f32s(&raw))?;
            voices.insert(name, style);
        }

        Self::non_empty(voices, dir)
    }

    fn non_empty(voices: BTreeMap<String, VoiceStyle>, source: &Path) -> AudiogenResult<Self> {
        if voices.is_empty() {
            return Err(AudiogenError::model(format!(
                "no voices found in {}",
                source.display()
            )));
        }
        tracing::info!("Loaded {} voices from {}", voices.len(), source.display());
        Ok(Self { voices })
    }

    /// Insert or replace a voice
    pub fn insert(&mut self, name: impl Into<String>, style: VoiceStyle) {
        self.voices.insert(name.into(), style);
    }

    /// Look up a voice.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error listing the available voices.
    pub fn get(&self, name: &str) -> AudiogenResult<&VoiceStyle> {
        self.voices.get(name).ok_or_else(|| {
            AudiogenError::invalid_input(format!(
                "Unknown voice '{name}'. Available: {}",
                self.names().join(", ")
            ))
        })
    }

    /// Check whether a voice exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.voices.contains_key(name)
    }

    /// Sorted voice names
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.voices.keys().cloned().collect()
    }
}

fn le_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Parse a NumPy `.npy` (v1-v3) little-endian f32 C-order array.
/// Shapes of rank >= 2 are viewed as `shape[0] x product(rest)`.
///
/// # Errors
///
/// Returns a model error for malformed headers, other dtypes, Fortran order
/// or a payload that does not match the shape.
pub fn parse_npy_f32(bytes: &[u8]) -> AudiogenResult<VoiceStyle> {
    if bytes.len() < 10 || &bytes[0..6] != b"\x93NUMPY" {
        return Err(AudiogenError::model("invalid .npy magic"));
    }
    let (header_len, offset) = match bytes[6] {
        1 => (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        other => return Err(AudiogenError::model(format!("unsupported .npy version {other}"))),
    };
    let header_end = offset + header_len;
    let header = bytes
        .get(offset..header_end)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| AudiogenError::model("truncated .npy header"))?;

    let descr = header_field(header, "descr")
        .ok_or_else(|| AudiogenError::model(".npy header missing 'descr'"))?;
    if descr != "<f4" {
        return Err(AudiogenError::model(format!("unsupported dtype '{descr}', expected '<f4'")));
    }
    if header_field(header, "fortran_order") != Some("False") {
        return Err(AudiogenError::model("Fortran-order arrays are not supported"));
    }
    let shape = parse_shape(header).ok_or_else(|| AudiogenError::model(".npy header missing 'shape'"))?;
    let (rows, cols) = match shape.as_slice() {
        [] => return Err(AudiogenError::model("scalar .npy arrays are not supported")),
        [n] => (1, *n),
        [first, rest @ ..] => (*first, rest.iter().product()),
    };

    VoiceStyle::new(rows, cols, le_f32s(&bytes[header_end..]))
}

fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    if let Some(quoted) = rest.strip_prefix('\'') {
        return quoted.find('\'').map(|end| &quoted[..end]);
    }
    let end = rest.find([',', '}']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let start = header.find("'shape':")?;
    let rest = &header[start..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{npy_bytes, write_npz};
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_row_selection_clamps() {
        let style = VoiceStyle::new(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(style.row(0), &[0.0, 1.0]);
        assert_eq!(style.row(2), &[4.0, 5.0]);
        assert_eq!(style.row(99), &[4.0, 5.0]);
    }

    #[test]
    fn test_style_shape_mismatch() {
        assert!(VoiceStyle::new(2, 2, vec![0.0; 3]).is_err());
        assert!(VoiceStyle::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_parse_npy_2d() {
        let bytes = npy_bytes(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let style = parse_npy_f32(&bytes).unwrap();
        assert_eq!(style.rows(), 2);
        assert_eq!(style.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_npy_3d_flattens_trailing_axes() {
        let data: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let style = parse_npy_f32(&npy_bytes(&[4, 1, 2], &data)).unwrap();
        assert_eq!(style.rows(), 4);
        assert_eq!(style.row(3), &[6.0, 7.0]);
    }

    #[test]
    fn test_parse_npy_rejects_garbage() {
        assert!(parse_npy_f32(b"not a numpy file").is_err());
        let mut bytes = npy_bytes(&[2, 2], &[0.0; 4]);
        bytes.truncate(bytes.len() - 4);
        assert!(parse_npy_f32(&bytes).is_err());
    }

    #[test]
    fn test_header_field() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (400, 256), }";
        assert_eq!(header_field(header, "descr"), Some("<f4"));
        assert_eq!(header_field(header, "fortran_order"), Some("False"));
        assert_eq!(parse_shape(header), Some(vec![400, 256]));
    }

    #[test]
    fn test_load_npz() {
        let temp = TempDir::new().unwrap();
        let path = temp.child("voices.npz");
        write_npz(path.path(), &[("expr-voice-2-m", 4, 8), ("expr-voice-2-f", 4, 8)]);

        let bank = VoiceBank::load_npz(path.path()).unwrap();
        assert_eq!(bank.names(), vec!["expr-voice-2-f", "expr-voice-2-m"]);
        assert_eq!(bank.get("expr-voice-2-m").unwrap().rows(), 4);
        let err = bank.get("nobody").unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("expr-voice-2-f"));
    }

    #[test]
    fn test_load_dir() {
        let temp = TempDir::new().unwrap();
        let row: Vec<u8> = (0..STYLE_DIM)
            .flat_map(|i| (i as f32).to_le_bytes())
            .collect();
        temp.child("af_nova.bin").write_binary(&row.repeat(3)).unwrap();
        temp.child("broken.bin").write_binary(&[0u8; 10]).unwrap();
        temp.child("README.md").write_str("voices").unwrap();

        let bank = VoiceBank::load_dir(temp.path(), STYLE_DIM).unwrap();
        assert_eq!(bank.names(), vec!["af_nova"]);
        let style = bank.get("af_nova").unwrap();
        assert_eq!(style.rows(), 3);
        assert_eq!(style.row(1)[255], 255.0);
    }

    #[test]
    fn test_empty_dir_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(VoiceBank::load_dir(temp.path(), STYLE_DIM).is_err());
    }
}
