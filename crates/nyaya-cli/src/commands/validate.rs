//! Validate command implementation.

use crate::context::Context;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the validate command.
///
/// Any structural error aborts the load and is reported with every violation.
pub fn execute_validate(context: &Context, formatter: &Formatter) -> Result<()> {
    let knowledge_base = context.load_knowledge_base()?;
    println!("{}", formatter.format_stats(&knowledge_base.snapshot().stats())?);
    Ok(())
}
