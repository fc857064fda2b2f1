//! Neighbors command implementation.

use crate::cli::NeighborsArgs;
use crate::context::Context;
use crate::error::Result;
use crate::output::Formatter;
use nyaya_domain::{ArticleId, KnowledgeGraph};
use nyaya_store::snapshot::parse_relation_types;

/// Execute the neighbors command.
pub fn execute_neighbors(args: NeighborsArgs, context: &Context, formatter: &Formatter) -> Result<()> {
    let relations = parse_relation_types(&args.relations)?;
    let knowledge_base = context.load_knowledge_base()?;
    let snapshot = knowledge_base.snapshot();

    let neighbors = snapshot.neighbors(&ArticleId::new(args.article), &relations, args.depth)?;
    println!("{}", formatter.format_neighbors(&neighbors)?);
    Ok(())
}
