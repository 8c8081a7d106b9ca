//! Structured logging schema for synapse.
//!
//! Every event and span carries `subsystem`, `component` and `op` so log
//! aggregation can query each subsystem the same way. Those are written as
//! literal field names at the call site.
//!
//! The constants below name span fields that are declared empty on entry and
//! filled in later with `Span::record`, once the value is known.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (search hits) |

/// Id assigned to an item during `create_item`.
pub const ITEM_ID: &str = "item_id";

/// Number of results a search returned.
pub const RESULT_COUNT: &str = "result_count";

/// Set to `true` when one retrieval path failed and the other answered.
pub const DEGRADED: &str = "degraded";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_field_names_match_span_declarations() {
        // Span::record silently ignores names the span did not declare.
        assert_eq!(ITEM_ID, "item_id");
        assert_eq!(RESULT_COUNT, "result_count");
        assert_eq!(DEGRADED, "degraded");
    }
}
