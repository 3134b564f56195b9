// Adapters layer: concrete implementations of the domain ports and file inputs.

pub mod defaults_file;
pub mod openai;

pub use defaults_file::load_default_places;
pub use openai::OpenAiService;
