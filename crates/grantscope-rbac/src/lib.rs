//! Role binding enumeration primitives shared by the grantscope services.
//!
//! # Purpose
//! Answers "which role bindings in a namespace grant access to any of these
//! subjects?" by compiling untrusted subject criteria into filters and
//! applying them to the bindings listed by a [`RoleBindingSource`].
//!
//! # How it fits
//! The API server owns request parsing, content negotiation, and the concrete
//! sources (Kubernetes, in-memory seed). This crate owns the model, the
//! filter grammar, and the retrieval-then-filter algorithm.
//!
//! # Key invariants
//! - A criterion made only of ASCII alphanumerics is always an exact match;
//!   anything else is compiled as a regular expression (substring search).
//! - A binding is retained if any subject satisfies any filter, and at most once.
//! - An empty filter set matches nothing.
//!
//! # Examples
//! ```rust
//! use grantscope_rbac::compile_filters;
//!
//! let filters = compile_filters(&["alice".to_string(), "team-.*".to_string()]).unwrap();
//! assert!(filters[0].is_exact());
//! assert!(filters[1].matches_subject("team-payments"));
//! ```

mod enumerator;
mod errors;
mod filter;
mod source;
mod types;

pub use enumerator::{RoleBindingEnumerator, sort_by_role_name};
pub use errors::{RbacError, RbacResult};
pub use filter::{SubjectFilter, compile_filters, is_exact_subject_name};
pub use source::{RoleBindingSource, SourceError, SourceResult};
pub use types::{RoleBinding, RoleRef, Subject};
