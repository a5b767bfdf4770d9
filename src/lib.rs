pub mod chroma_pipeline;
pub mod logger;
