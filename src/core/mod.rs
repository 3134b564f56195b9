pub mod extractor;
pub mod merger;
pub mod pipeline;
pub mod prompt;
