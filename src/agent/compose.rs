//! Merge tool results into the reply for a turn.

use crate::tools::ToolResult;

/// Final reply text and whether the turn ended in error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub response: String,
    pub errored: bool,
}

/// Combine the acknowledgement with the results of the turn's calls.
///
/// Any failure replaces the acknowledgement with the last failure's message.
/// Otherwise success messages are appended after a blank line.
pub fn compose(acknowledgement: &str, results: &[ToolResult]) -> Composition {
    if let Some(last_failure) = results.iter().rev().find(|r| !r.success) {
        return Composition {
            response: last_failure.message.clone(),
            errored: true,
        };
    }

    if results.is_empty() {
        return Composition {
            response: acknowledgement.to_string(),
            errored: false,
        };
    }

    let messages = results
        .iter()
        .map(|r| r.message.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Composition {
        response: format!("{}\n\n{}", acknowledgement, messages),
        errored: false,
    }
}
