mod engine;

pub use engine::LlamaProvider;
