mod content;

pub use content::ContentBlock;
