//! Search command implementation.

use crate::cli::SearchArgs;
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use nyaya_domain::{Article, KnowledgeGraph};
use nyaya_embed::EmbeddingProvider;

/// Execute the search command.
pub async fn execute_search(args: SearchArgs, context: &Context, formatter: &Formatter) -> Result<()> {
    if args.limit == 0 {
        return Err(CliError::InvalidInput("Limit must be greater than 0".to_string()));
    }

    if args.semantic {
        let knowledge_base = context.load_embedded_knowledge_base().await?;
        let snapshot = knowledge_base.snapshot();
        let query = args.terms.join(" ");
        let vector = context
            .provider()
            .embed(&query)
            .await
            .map_err(|e| CliError::InvalidInput(format!("Could not embed query: {}", e)))?;

        let hits = snapshot.search_by_similarity(&vector, args.limit)?;
        let rows: Vec<(&Article, Option<f64>)> = hits.into_iter().map(|(a, s)| (a, Some(s))).collect();
        println!("{}", formatter.format_articles(&rows)?);
    } else {
        let knowledge_base = context.load_knowledge_base()?;
        let snapshot = knowledge_base.snapshot();
        let terms: Vec<&str> = args.terms.iter().map(String::as_str).collect();

        let rows: Vec<(&Article, Option<f64>)> = snapshot
            .search_by_keyword(&terms)?
            .into_iter()
            .take(args.limit)
            .map(|a| (a, None))
            .collect();
        println!("{}", formatter.format_articles(&rows)?);
    }

    Ok(())
}
