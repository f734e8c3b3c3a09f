use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use super::gguf_utils::{self, GGUF_MAGIC};
use super::types::{GGUFError, GGUFValue, GGUFValueType};

/// Arrays longer than this keep only their leading elements.
const MAX_ARRAY_ELEMENTS: u64 = 16;

/// Parsed GGUF header: version, counts and metadata key-value pairs.
#[derive(Debug, Clone)]
pub struct GGUFReader {
    /// Path to the GGUF file, when read from disk
    pub path: Option<PathBuf>,
    pub version: u32,
    /// Number of tensors in the file
    pub tensor_count: u64,
    /// Metadata key-value pairs
    pub metadata: BTreeMap<String, GGUFValue>,
}

impl GGUFReader {
    /// Opens a GGUF file and parses its metadata section.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, GGUFError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = Self::from_reader(BufReader::new(file))?;
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }

    /// Parses a GGUF header from any byte stream positioned at the magic number.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, GGUFError> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != GGUF_MAGIC {
            return Err(GGUFError::InvalidFormat(format!("Invalid magic number: {:#010x}", magic)));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version == 0 || version > 3 {
            return Err(GGUFError::InvalidFormat(format!("Unsupported GGUF version: {}", version)));
        }

        let tensor_count = gguf_utils::read_len(&mut reader, version)?;
        let metadata_count = gguf_utils::read_len(&mut reader, version)?;
        debug!(version, tensor_count, metadata_count, "Reading GGUF header");

        let mut metadata = BTreeMap::new();
        for _ in 0..metadata_count {
            let key = gguf_utils::read_string(&mut reader, version)?;
            let value_type = GGUFValueType::try_from(reader.read_u32::<LittleEndian>()?)?;
            let value = read_value(&mut reader, value_type, version)?;
            metadata.insert(key, value);
        }

        Ok(Self {
            path: None,
            version,
            tensor_count,
            metadata,
        })
    }

    /// `general.name`, if present
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("general.name").and_then(GGUFValue::as_str)
    }

    /// `general.architecture`, if present
    pub fn architecture(&self) -> Option<&str> {
        self.metadata.get("general.architecture").and_then(GGUFValue::as_str)
    }

    /// `general.file_type`, if present
    pub fn file_type(&self) -> Option<i64> {
        self.metadata.get("general.file_type").and_then(GGUFValue::as_int)
    }

    /// `tokenizer.ggml.model`: `llama` for SentencePiece, `gpt2` for BPE
    pub fn tokenizer_model(&self) -> Option<&str> {
        self.metadata.get("tokenizer.ggml.model").and_then(GGUFValue::as_str)
    }

    /// Whether encoding prepends a word-boundary space to the text.
    ///
    /// An explicit `tokenizer.ggml.add_space_prefix` wins. Otherwise only
    /// SentencePiece vocabularies do it.
    pub fn adds_space_prefix(&self) -> bool {
        match self.metadata.get("tokenizer.ggml.add_space_prefix") {
            Some(GGUFValue::Bool(flag)) => *flag,
            _ => self.tokenizer_model() == Some("llama"),
        }
    }

    /// The trained context length, stored under `<architecture>.context_length`.
    pub fn context_length(&self) -> Option<u64> {
        let arch = self.architecture()?;
        self.metadata
            .get(&format!("{}.context_length", arch))
            .and_then(GGUFValue::as_int)
            .map(|n| n as u64)
    }
}

fn read_value<R: Read>(reader: &mut R, value_type: GGUFValueType, version: u32) -> Result<GGUFValue, GGUFError> {
    if value_type != GGUFValueType::ARRAY {
        return gguf_utils::read_value_by_type(reader, value_type, version);
    }

    let element_type = GGUFValueType::try_from(reader.read_u32::<LittleEndian>()?)?;
    let len = gguf_utils::read_len(reader, version)?;

    // Vocabulary arrays run to hundreds of thousands of entries; they still
    // have to be consumed to reach the next key.
    let mut kept = Vec::with_capacity(len.min(MAX_ARRAY_ELEMENTS) as usize);
    for i in 0..len {
        let value = read_value(reader, element_type, version)?;
        if i < MAX_ARRAY_ELEMENTS {
            kept.push(value);
        }
    }

    if len > MAX_ARRAY_ELEMENTS {
        Ok(GGUFValue::TruncatedArray(kept, len))
    } else {
        Ok(GGUFValue::Array(kept))
    }
}
