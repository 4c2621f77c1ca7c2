pub mod campaign;
pub mod generation;
pub mod library;
pub mod llm;
pub mod logging;
