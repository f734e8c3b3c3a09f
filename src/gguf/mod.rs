//! Minimal GGUF header reader.
//!
//! Only the metadata section is parsed: the loader needs the model's name,
//! architecture, file type and trained context length before handing the file
//! to llama.cpp. Tensor descriptors and data are left to the backend.

mod gguf;
mod gguf_utils;
mod types;

pub use types::{GGUFError, GGUFValue, GGUFValueType, file_type_label, is_four_bit_file_type};
pub use gguf::GGUFReader;
pub use gguf_utils::{is_gguf_file, GGUF_MAGIC};
