mod tokenizer;

pub use tokenizer::{
    LlamaTokenizer, contains_special_marker, is_special_marker, join_pieces, strip_word_boundary_prefix,
};
