mod context;

pub use context::LlamaLanguageModel;
