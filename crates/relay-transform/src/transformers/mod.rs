mod qwen_cli;
mod z_thinking;

pub use qwen_cli::QwenCliTransformer;
pub use z_thinking::{rewrite_response, ZThinkingTransformer};
