pub mod voyage_contextualized;

pub use voyage_contextualized::{VOYAGE_CONTEXT_3, VoyageContextualizedEmbeddingModel};
