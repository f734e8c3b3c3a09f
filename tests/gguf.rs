use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use glmrun::gguf::{is_gguf_file, GGUFError, GGUFReader, GGUFValue, GGUF_MAGIC};

enum Meta<'a> {
    Str(&'a str),
    U32(u32),
    F32(f32),
    Bool(bool),
    StrArray(Vec<String>),
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.write_u64::<LittleEndian>(s.len() as u64).unwrap();
    buf.write_all(s.as_bytes()).unwrap();
}

/// Builds a version 3 GGUF header with the given metadata and no tensors.
fn build_header(entries: &[(&str, Meta)]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(GGUF_MAGIC).unwrap();
    buf.write_u32::<LittleEndian>(3).unwrap();
    buf.write_u64::<LittleEndian>(0).unwrap();
    buf.write_u64::<LittleEndian>(entries.len() as u64).unwrap();

    for (key, value) in entries {
        write_string(&mut buf, key);
        match value {
            Meta::Str(s) => {
                buf.write_u32::<LittleEndian>(8).unwrap();
                write_string(&mut buf, s);
            }
            Meta::U32(v) => {
                buf.write_u32::<LittleEndian>(4).unwrap();
                buf.write_u32::<LittleEndian>(*v).unwrap();
            }
            Meta::F32(v) => {
                buf.write_u32::<LittleEndian>(6).unwrap();
                buf.write_f32::<LittleEndian>(*v).unwrap();
            }
            Meta::Bool(v) => {
                buf.write_u32::<LittleEndian>(7).unwrap();
                buf.write_u8(*v as u8).unwrap();
            }
            Meta::StrArray(items) => {
                buf.write_u32::<LittleEndian>(9).unwrap();
                buf.write_u32::<LittleEndian>(8).unwrap();
                buf.write_u64::<LittleEndian>(items.len() as u64).unwrap();
                for item in items {
                    write_string(&mut buf, item);
                }
            }
        }
    }
    buf
}

fn glm_header() -> Vec<u8> {
    let vocab: Vec<String> = (0..1000).map(|i| format!("tok{}", i)).collect();
    build_header(&[
        ("general.architecture", Meta::Str("chatglm")),
        ("general.name", Meta::Str("glm-4-9b")),
        ("general.file_type", Meta::U32(15)),
        ("chatglm.context_length", Meta::U32(131072)),
        ("chatglm.rope.freq_base", Meta::F32(10000.0)),
        ("tokenizer.ggml.model", Meta::Str("gpt2")),
        ("tokenizer.ggml.add_bos_token", Meta::Bool(false)),
        ("tokenizer.ggml.tokens", Meta::StrArray(vocab)),
        ("general.quantization_version", Meta::U32(2)),
    ])
}

#[test]
fn reads_general_metadata() {
    let reader = GGUFReader::from_reader(Cursor::new(glm_header())).unwrap();

    assert_eq!(reader.version, 3);
    assert_eq!(reader.tensor_count, 0);
    assert_eq!(reader.name(), Some("glm-4-9b"));
    assert_eq!(reader.architecture(), Some("chatglm"));
    assert_eq!(reader.file_type(), Some(15));
    assert_eq!(reader.context_length(), Some(131072));
    assert_eq!(
        reader.metadata.get("tokenizer.ggml.add_bos_token"),
        Some(&GGUFValue::Bool(false))
    );
}

#[test]
fn long_arrays_are_consumed_but_truncated() {
    let reader = GGUFReader::from_reader(Cursor::new(glm_header())).unwrap();

    match &reader.metadata["tokenizer.ggml.tokens"] {
        GGUFValue::TruncatedArray(kept, total) => {
            assert_eq!(*total, 1000);
            assert_eq!(kept.len(), 16);
            assert_eq!(kept[0], GGUFValue::String("tok0".into()));
        }
        other => panic!("expected truncated array, got {:?}", other),
    }
    // The key after the array was still read correctly.
    assert_eq!(
        reader.metadata["general.quantization_version"].as_int(),
        Some(2)
    );
}

#[test]
fn bpe_vocabulary_adds_no_prefix_space() {
    let reader = GGUFReader::from_reader(Cursor::new(glm_header())).unwrap();
    assert_eq!(reader.tokenizer_model(), Some("gpt2"));
    assert!(!reader.adds_space_prefix());
    assert!(reader.metadata.get("general.license").is_none());
}

#[test]
fn sentencepiece_vocabulary_adds_prefix_space_unless_disabled() {
    let spm = build_header(&[("tokenizer.ggml.model", Meta::Str("llama"))]);
    let reader = GGUFReader::from_reader(Cursor::new(spm)).unwrap();
    assert!(reader.adds_space_prefix());

    let disabled = build_header(&[
        ("tokenizer.ggml.model", Meta::Str("llama")),
        ("tokenizer.ggml.add_space_prefix", Meta::Bool(false)),
    ]);
    let reader = GGUFReader::from_reader(Cursor::new(disabled)).unwrap();
    assert!(!reader.adds_space_prefix());

    let bare = build_header(&[]);
    let reader = GGUFReader::from_reader(Cursor::new(bare)).unwrap();
    assert_eq!(reader.tokenizer_model(), None);
    assert!(!reader.adds_space_prefix());
}

#[test]
fn rejects_wrong_magic() {
    let mut bytes = glm_header();
    bytes[0] = b'X';
    let err = GGUFReader::from_reader(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, GGUFError::InvalidFormat(_)));
}

#[test]
fn truncated_header_is_an_io_error() {
    let bytes = glm_header();
    let err = GGUFReader::from_reader(Cursor::new(&bytes[..40])).unwrap_err();
    assert!(matches!(err, GGUFError::IoError(_) | GGUFError::InvalidFormat(_)));
}

#[test]
fn detects_gguf_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("glm-4-9b-Q4_K_M.gguf");
    let other = dir.path().join("README.md");
    std::fs::write(&model, glm_header()).unwrap();
    std::fs::write(&other, "# readme").unwrap();

    assert!(is_gguf_file(&model));
    assert!(!is_gguf_file(&other));
    assert!(!is_gguf_file(dir.path().join("absent.gguf")));

    let reader = GGUFReader::new(&model).unwrap();
    assert_eq!(reader.path.as_deref(), Some(model.as_path()));
    assert!(matches!(GGUFReader::new(&other), Err(GGUFError::InvalidFormat(_))));
}
