//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::context::{load_document, Context};
use crate::error::Result;
use crate::output::Formatter;
use nyaya_engine::CancellationToken;
use tracing::warn;

/// Execute the analyze command.
///
/// Ctrl-C cancels the run; nothing is printed for a cancelled run.
pub async fn execute_analyze(args: AnalyzeArgs, context: &Context, formatter: &Formatter) -> Result<()> {
    let document = load_document(&args.document)?;
    let engine = context.engine(args.preset).await?;

    let token = CancellationToken::new();
    let interrupt = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analysis");
            interrupt.cancel();
        }
    });

    let result = engine.analyze_with_cancel(&document, &token).await;
    watcher.abort();

    let report = result?;
    println!("{}", formatter.format_report(&report, args.explain)?);
    Ok(())
}
