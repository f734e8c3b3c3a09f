use std::fmt;
use std::sync::Arc;

use llama_cpp::{LlamaModel, Token};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::llm::{TokenId, Tokenizer};

/// Control markers that show up as literal pieces in GGUF vocabularies
/// (ChatML/GLM `<|...|>`, SentencePiece `<s>`, GLM `[gMASK]` and friends).
static SPECIAL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\|[^|<>]*\|>|</?s>|\[[gs]?MASK\]|<sop>|<eop>|<unk>|<pad>")
        .expect("valid special marker regex")
});

static WHOLE_SPECIAL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:<\|[^|<>]*\|>|</?s>|\[[gs]?MASK\]|<sop>|<eop>|<unk>|<pad>)$")
        .expect("valid special marker regex")
});

/// True when a decoded piece is nothing but a control marker.
pub fn is_special_marker(piece: &str) -> bool {
    WHOLE_SPECIAL_MARKER.is_match(piece.trim())
}

/// True when `text` contains a raw control marker anywhere.
pub fn contains_special_marker(text: &str) -> bool {
    SPECIAL_MARKER.is_match(text)
}

/// SentencePiece vocabularies encode a word boundary before the first word,
/// which decodes as a leading space the prompt never had.
pub fn strip_word_boundary_prefix(text: String) -> String {
    match text.strip_prefix(' ') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Joins `(is_bos_or_eos, piece_bytes)` pairs into text.
///
/// With `skip_special_tokens`, BOS/EOS and marker-only pieces are dropped.
/// Multi-byte characters may span several pieces, so bytes are converted once
/// at the end. `strip_prefix_space` is set for vocabularies that prepend a
/// word-boundary space when encoding.
pub fn join_pieces<I>(pieces: I, skip_special_tokens: bool, strip_prefix_space: bool) -> String
where
    I: IntoIterator<Item = (bool, Vec<u8>)>,
{
    let mut bytes = Vec::new();
    for (is_boundary, piece) in pieces {
        if skip_special_tokens
            && (is_boundary || is_special_marker(&String::from_utf8_lossy(&piece)))
        {
            continue;
        }
        bytes.extend_from_slice(&piece);
    }

    let text = String::from_utf8_lossy(&bytes).into_owned();
    if strip_prefix_space {
        strip_word_boundary_prefix(text)
    } else {
        text
    }
}

/// Tokenizer backed by the vocabulary of a loaded llama.cpp model.
#[derive(Clone)]
pub struct LlamaTokenizer {
    llama_model: Arc<LlamaModel>,
    add_space_prefix: bool,
}

impl fmt::Debug for LlamaTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlamaTokenizer")
            .field("bos", &self.llama_model.bos().0)
            .field("eos", &self.llama_model.eos().0)
            .field("add_space_prefix", &self.add_space_prefix)
            .finish()
    }
}

impl LlamaTokenizer {
    /// `add_space_prefix` comes from the GGUF header, see
    /// [`GGUFReader::adds_space_prefix`](crate::gguf::GGUFReader::adds_space_prefix).
    pub fn new(llama_model: Arc<LlamaModel>, add_space_prefix: bool) -> Self {
        Self { llama_model, add_space_prefix }
    }

    fn is_boundary_token(&self, token: Token) -> bool {
        token == self.llama_model.bos() || token == self.llama_model.eos()
    }
}

impl Tokenizer for LlamaTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        // Prompts are plain text: marker-looking substrings stay literal.
        let tokens = self.llama_model
            .tokenize_bytes(text, true, false)
            .map_err(|e| Error::Tokenize(e.to_string()))?;
        Ok(tokens.into_iter().map(|t| t.0 as TokenId).collect())
    }

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String> {
        let pieces = tokens.iter().map(|&id| {
            let token = Token(id as i32);
            (self.is_boundary_token(token), self.llama_model.token_to_byte_piece(token))
        });
        Ok(join_pieces(pieces, skip_special_tokens, self.add_space_prefix))
    }
}
