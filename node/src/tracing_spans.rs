//! Pre-built [`tracing::Span`] constructors for common node operations.
//!
//! Consistent span names and field sets make it easy to filter and
//! correlate traces across requests.

use std::path::Path;

use tracing::{info_span, Span};

/// Span covering the handling of a single request.
pub fn request_span(op: &str, seq: u64) -> Span {
    info_span!("request", op = %op, seq = seq)
}

/// Span covering the finalization of a proposal.
pub fn proposal_execute_span(proposal: u64) -> Span {
    info_span!("proposal_execute", proposal = proposal)
}

/// Span covering a snapshot load or save.
pub fn snapshot_span(action: &str, path: &Path) -> Span {
    info_span!("snapshot", action = %action, path = %path.display())
}
