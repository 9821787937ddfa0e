//! Collaborator implementations: tokenizer and reading generator

pub mod dictionary_tokenizer;
pub mod llm_client;
pub mod mock_readings;

pub use dictionary_tokenizer::DictionaryTokenizer;
pub use llm_client::LlmReadingGenerator;
