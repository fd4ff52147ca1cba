//! Resolution error types.

use miette::Diagnostic;
use thiserror::Error;

/// A constraint expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version constraint `{constraint}`: {reason}")]
pub struct ConstraintError {
    pub constraint: String,
    pub reason: String,
}

impl ConstraintError {
    pub(crate) fn new(constraint: &str, reason: impl Into<String>) -> Self {
        ConstraintError {
            constraint: constraint.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error while resolving a version spec to a revision.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error(
        "no version of `{repo}` matches `{constraint}` (available tags: {})",
        format_available(.available)
    )]
    #[diagnostic(
        code(bunch::resolve::no_matching_version),
        help("run `bunch outdated` to fetch new tags, or relax the constraint")
    )]
    NoMatchingVersion {
        repo: String,
        constraint: String,
        available: Vec<String>,
    },

    #[error("`{repo}` has an invalid version spec")]
    #[diagnostic(
        code(bunch::resolve::invalid_constraint),
        help("use a revision, branch, tag, or a constraint such as `~> 1.2` or `>= 1.0, < 2.0`")
    )]
    InvalidConstraint {
        repo: String,
        #[source]
        source: ConstraintError,
    },
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}
