//! Flow analysis for JavaScript/TypeScript refactoring tools
//!
//! A library answering the data-flow questions source-to-source
//! refactorings ask: which variables does a selection read or write,
//! does it return or throw on every path, which exceptions and branch
//! targets escape it. Source is parsed with swc, lowered into a compact
//! arena tree and summarized bottom-up.

pub mod flow;
pub mod parser;
pub mod tree;

pub use flow::{
    AccessMode, ComputeMode, FlowAnalyzer, FlowContext, FlowInfo, FlowSummary, InOutFlowAnalyzer,
    VariableRole,
};
pub use parser::AstParser;
pub use tree::{lower_module, SyntaxTree};

use anyhow::{anyhow, ensure, Result};
use std::path::Path;

/// Analyzes a run of statements inside a named function.
///
/// `from`/`to` are 0-based inclusive statement indexes into the function
/// body; omitting them selects the whole body. This is the extract-method
/// entry point: the summary's arguments and results are the extracted
/// function's parameters and return values.
pub fn analyze_selection(
    code: &str,
    path: &Path,
    function: &str,
    from: Option<usize>,
    to: Option<usize>,
) -> Result<FlowSummary> {
    let parser = AstParser::new();
    let module = parser.parse(code, path)?;
    let tree = lower_module(&module);

    let target = tree
        .find_function(function)
        .ok_or_else(|| anyhow!("no function named `{function}` in {}", path.display()))?;
    let stmts = tree.function_body_stmts(target);

    let selected = if stmts.is_empty() {
        Vec::new()
    } else {
        let from = from.unwrap_or(0);
        let to = to.unwrap_or(stmts.len() - 1);
        ensure!(
            from <= to && to < stmts.len(),
            "statement range {from}..={to} out of bounds (body of `{function}` has {} statements)",
            stmts.len()
        );
        stmts[from..=to].to_vec()
    };

    let mut context = FlowContext::for_tree(&tree);
    let info = InOutFlowAnalyzer::new(&tree, &mut context).perform(&selected);
    Ok(FlowSummary::new(&info, &context))
}

/// Analyzes the whole body of a named function.
pub fn analyze_function(code: &str, path: &Path, function: &str) -> Result<FlowSummary> {
    analyze_selection(code, path, function, None, None)
}
