pub mod config;
pub mod error;
pub mod factory;
pub mod failure;
pub mod options;
pub mod providers;
pub mod traits;
pub mod transport;
pub mod types;

pub use config::*;
pub use error::EmbedError;
pub use factory::*;
pub use failure::decode_failed_response;
pub use options::*;
pub use providers::{VOYAGE_CONTEXT_3, VoyageContextualizedEmbeddingModel};
pub use traits::*;
pub use transport::*;
pub use types::*;

pub use tokio_util::sync::CancellationToken;
