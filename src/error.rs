use thiserror::Error;

use crate::parser::classify::Role;

/// Failures that abandon a single page. Callers log these and move on to the
/// next page; nothing here aborts a run.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("extracted frame contains no markup")]
    EmptyDocument,

    #[error("invalid selector {query:?}: {reason}")]
    Selector { query: &'static str, reason: String },

    #[error("node matched as both {first:?} and {second:?} (text {text:?})")]
    RoleConflict {
        first: Role,
        second: Role,
        text: String,
    },

    #[error("breed anchor has no openWin link: {href:?}")]
    MissingLink { href: String },
}

pub type PageResult<T> = Result<T, PageError>;
