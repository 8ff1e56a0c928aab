use crate::errors::{RbacError, RbacResult};
use crate::types::RoleBinding;
use regex::{Regex, RegexBuilder};

/// Returns true when `criterion` matches `^[0-9A-Za-z]+$`.
///
/// Such criteria are always exact matches, even though they would also be
/// valid (trivial) regular expressions.
pub fn is_exact_subject_name(criterion: &str) -> bool {
    !criterion.is_empty() && criterion.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A predicate over role bindings built from one subject criterion.
#[derive(Debug, Clone)]
pub enum SubjectFilter {
    /// Subject name must be byte-identical.
    Exact(String),
    /// Subject name must contain a match of the pattern (unanchored search).
    Pattern(Regex),
}

impl SubjectFilter {
    /// Classify and compile a single criterion.
    ///
    /// Patterns compile with ASCII-only Perl classes (`\d`, `\w`, `\s`, `\b`)
    /// when possible. A pattern that can then match invalid UTF-8, such as one
    /// using `.` or a negated class, compiles in Unicode mode instead.
    ///
    /// # Errors
    /// - `RbacError::InvalidCriterion` when a non-alphanumeric criterion is not
    ///   a valid regular expression.
    pub fn compile(criterion: &str) -> RbacResult<Self> {
        if is_exact_subject_name(criterion) {
            return Ok(Self::Exact(criterion.to_string()));
        }
        compile_pattern(criterion)
            .map(Self::Pattern)
            .map_err(|_| RbacError::InvalidCriterion(criterion.to_string()))
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// The criterion this filter was compiled from.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(name) => name,
            Self::Pattern(pattern) => pattern.as_str(),
        }
    }

    pub fn matches_subject(&self, subject_name: &str) -> bool {
        match self {
            Self::Exact(name) => name == subject_name,
            Self::Pattern(pattern) => pattern.is_match(subject_name),
        }
    }

    /// True if any subject of the binding satisfies this filter.
    pub fn matches(&self, binding: &RoleBinding) -> bool {
        binding
            .subjects
            .iter()
            .any(|subject| self.matches_subject(&subject.name))
    }
}

fn compile_pattern(criterion: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(criterion)
        .unicode(false)
        .build()
        .or_else(|_| Regex::new(criterion))
}

/// Compile criteria into filters, preserving input order.
///
/// Fails on the first criterion that cannot be compiled; no partial list is
/// returned.
pub fn compile_filters(criteria: &[String]) -> RbacResult<Vec<SubjectFilter>> {
    let mut filters = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        filters.push(SubjectFilter::compile(criterion)?);
    }
    Ok(filters)
}
