//! Generation provider seam.
//!
//! The rest of the crate only sees [`Generator`] and its plain result types;
//! provider response schemas stay inside the client modules.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::GenerateError;

/// A citation as reported by the provider, before any cleaning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Generated text plus the citations the provider grounded it on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// A web-search grounded text generator
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<Generation, GenerateError>;
}
