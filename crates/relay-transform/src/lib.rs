pub mod auth;
pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod normalize;
pub mod response;
pub mod streaming;
pub mod traits;
pub mod transformers;
pub mod types;

pub use traits::{ProviderInfo, RequestConfig, RequestTransform, Transformer};

pub use auth::{Credential, CredentialStore, OAuthClient};
pub use buffer_utils::SseFrameBuffer;
pub use config::{
    QwenCliConfig, TransformerConfig, TransformerFactory, TransformerKind, ZThinkingConfig,
};
pub use error::{Result, TransformError};
pub use normalize::{normalize_content, normalize_messages};
pub use response::{ByteStream, PluginResponse, ResponseBody};
pub use streaming::{ReasoningRewriter, RewriteState, SseLine};
pub use transformers::{QwenCliTransformer, ZThinkingTransformer};
pub use types::ContentBlock;
