//! Runtime assembly shared by the commands.

use crate::cli::{Cli, PresetArg};
use crate::config::{Config, ProviderKind};
use crate::error::{CliError, Result};
use nyaya_domain::Document;
use nyaya_embed::{EmbeddingProvider, LexicalEmbedder, OllamaEmbedder};
use nyaya_engine::{ComplianceEngine, EngineConfig};
use nyaya_store::{KnowledgeBase, KnowledgeBaseSpec};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Knowledge base, provider and engine settings for one invocation.
pub struct Context {
    knowledge_base: PathBuf,
    engine_config: Option<EngineConfig>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Context {
    /// Resolve flags, environment and settings file into a context.
    pub fn new(cli: &Cli, config: &Config) -> Result<Self> {
        let knowledge_base = cli
            .kb
            .clone()
            .or_else(|| config.settings.knowledge_base.clone())
            .ok_or_else(|| {
                CliError::InvalidInput(
                    "No knowledge base given. Use --kb, NYAYA_KB or settings.knowledge_base".to_string(),
                )
            })?;

        let engine_config = cli
            .config
            .as_ref()
            .or(config.settings.engine_config.as_ref())
            .map(EngineConfig::from_file)
            .transpose()?;

        let kind = cli.provider.map(Into::into).unwrap_or(config.embedding.provider);
        let embedding = &config.embedding;
        let provider: Arc<dyn EmbeddingProvider> = match kind {
            ProviderKind::Lexical => Arc::new(LexicalEmbedder::new(embedding.dimension)),
            ProviderKind::Ollama => Arc::new(
                OllamaEmbedder::new(embedding.endpoint.clone(), embedding.model.clone())
                    .with_max_concurrency(embedding.max_concurrency),
            ),
        };
        debug!(kb = %knowledge_base.display(), provider = provider.name(), "Context resolved");

        Ok(Self {
            knowledge_base,
            engine_config,
            provider,
        })
    }

    /// Knowledge-base file in use.
    pub fn knowledge_base_path(&self) -> &Path {
        &self.knowledge_base
    }

    /// Embedding provider in use.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Engine configuration: the configuration file if one was given, else `preset`.
    pub fn engine_config(&self, preset: Option<PresetArg>) -> Result<EngineConfig> {
        match (&self.engine_config, preset) {
            (Some(_), Some(_)) => Err(CliError::InvalidInput(
                "--preset cannot be combined with a configuration file".to_string(),
            )),
            (Some(config), None) => Ok(config.clone()),
            (None, preset) => Ok(preset.map(Into::into).unwrap_or_default()),
        }
    }

    /// Load the knowledge base without embedding its Articles.
    pub fn load_knowledge_base(&self) -> Result<KnowledgeBase> {
        let spec = KnowledgeBaseSpec::from_file(&self.knowledge_base)?;
        Ok(KnowledgeBase::load(spec)?)
    }

    /// Load the knowledge base, embedding Articles with the provider.
    pub async fn load_embedded_knowledge_base(&self) -> Result<KnowledgeBase> {
        let spec = KnowledgeBaseSpec::from_file(&self.knowledge_base)?;
        Ok(KnowledgeBase::load_with_embeddings(spec, self.provider.as_ref()).await?)
    }

    /// Build an engine over the embedded knowledge base.
    pub async fn engine(&self, preset: Option<PresetArg>) -> Result<ComplianceEngine> {
        let config = self.engine_config(preset)?;
        let knowledge_base = self.load_embedded_knowledge_base().await?;
        Ok(ComplianceEngine::new(
            Arc::new(knowledge_base),
            Arc::clone(&self.provider),
            config,
        )?)
    }
}

/// Read a document file.
///
/// `.json` files hold a serialized `Document`. Any other file is plain text:
/// blank lines separate clauses and the file stem becomes the document id.
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let document = if is_json {
        serde_json::from_str::<Document>(&contents)?
    } else {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let clauses: Vec<String> = contents
            .split("\n\n")
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty())
            .collect();
        Document::from_texts(id, clauses)
    };

    let mut seen = HashSet::new();
    if let Some(duplicate) = document.clauses.iter().find(|c| !seen.insert(&c.id)) {
        return Err(CliError::InvalidInput(format!(
            "Clause id '{}' appears more than once",
            duplicate.id
        )));
    }
    Ok(document)
}
