//! Token Filter
//!
//! Hook that lets the embedded language claim tokens in markup before the
//! fragment parser interprets them.

use super::cursor::TokenCursor;
use crate::error::Result;

/// Where in the markup the filter is being asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEnv {
    Text,
    AttributeValue,
}

/// What the filter found at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Plain markup, possibly after the filter split the current token
    None,
    /// A code block (statement or declarations section) starts here
    BeginBlock,
    /// An inline expression starts here
    BeginExpression,
}

/// Inspects the current token and consumes any sigil it recognises
pub trait TokenFilter {
    fn filter(&self, env: FilterEnv, input: &mut TokenCursor<'_>) -> Result<FilterAction>;
}
