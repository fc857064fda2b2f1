//! Classify command implementation.

use crate::cli::ClassifyArgs;
use crate::context::{load_document, Context};
use crate::error::Result;
use crate::output::Formatter;

/// Execute the classify command.
pub async fn execute_classify(args: ClassifyArgs, context: &Context, formatter: &Formatter) -> Result<()> {
    let document = load_document(&args.document)?;
    let engine = context.engine(None).await?;

    let matches = if args.all {
        engine.classify_all(&document)
    } else {
        engine.classify(&document)
    };

    println!("{}", formatter.format_classification(&matches)?);
    Ok(())
}
