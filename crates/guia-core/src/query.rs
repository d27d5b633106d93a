//! Grounded question answering against the FFM site.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::ai::{Citation, GeminiClient, Generator};
use crate::config::Config;
use crate::error::{ConfigError, ServiceError};
use crate::state::Source;

/// Sources must contain this substring to be shown
pub const SOURCE_DOMAIN: &str = "ffm.br";

/// Title used when the provider does not report one
pub const UNKNOWN_SOURCE_TITLE: &str = "Fonte desconhecida";

pub const SYSTEM_INSTRUCTION: &str = "Você é um assistente virtual especialista no \"Guia Prático de Orientações\" da FFM (Fundação Faculdade de Medicina). \
Sua única função é responder a perguntas baseadas no conteúdo do site ffm.br e seus documentos. \
O site contém páginas web (HTML) e documentos importantes em formato PDF, como o \"Regimento Interno\" e outros manuais. \
Dê prioridade às informações contidas nesses documentos PDF ao formular suas respostas. \
Seja preciso, objetivo e responda sempre em português do Brasil. \
Se a resposta não estiver no site ou nos documentos, informe que não encontrou a informação. \
Sempre liste as fontes de onde tirou a informação.";

/// Answer text plus the cleaned source list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Wrap a raw user question in the site-scoped instruction template
pub fn build_prompt(query: &str) -> String {
    format!(
        "Com base nas informações do site {} e seus PDFs, responda à seguinte pergunta: \"{}\"",
        SOURCE_DOMAIN, query
    )
}

/// Normalize, domain-filter and deduplicate provider citations.
///
/// Only uris containing [`SOURCE_DOMAIN`] survive. A repeated uri keeps the
/// position of its first occurrence and the title of its last one.
pub fn clean_sources(citations: Vec<Citation>) -> Vec<Source> {
    let mut sources: Vec<Source> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    let normalized = citations.into_iter().map(|citation| Source {
        uri: citation.uri.unwrap_or_default(),
        title: citation
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE_TITLE.to_string()),
    });

    for source in normalized {
        if source.uri.is_empty() || !source.uri.contains(SOURCE_DOMAIN) {
            continue;
        }
        match index_of.get(&source.uri) {
            Some(&index) => sources[index].title = source.title,
            None => {
                index_of.insert(source.uri.clone(), sources.len());
                sources.push(source);
            }
        }
    }

    sources
}

/// Stateless front for a grounded [`Generator`]
#[derive(Clone)]
pub struct QueryService {
    generator: Arc<dyn Generator>,
}

impl QueryService {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Build the Gemini-backed service. Fails when no credential is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::gemini(config, &config.credential()?))
    }

    pub fn from_config_with<F>(config: &Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::gemini(config, &config.credential_with(lookup)?))
    }

    fn gemini(config: &Config, api_key: &str) -> Self {
        let client = GeminiClient::new(api_key)
            .with_model(config.model())
            .with_base_url(config.base_url());
        info!(model = client.model(), "generation service configured");
        Self::new(Arc::new(client))
    }

    /// One request per call, no retries
    pub async fn run_query(&self, query: &str) -> Result<Answer, ServiceError> {
        let prompt = build_prompt(query);

        match self.generator.generate(SYSTEM_INSTRUCTION, &prompt).await {
            Ok(generation) => {
                let cited = generation.citations.len();
                let sources = clean_sources(generation.citations);
                info!(cited, kept = sources.len(), "query answered");
                Ok(Answer { text: generation.text, sources })
            }
            Err(err) => {
                error!(error = %err, "error calling the generation service");
                Err(err.into())
            }
        }
    }
}
