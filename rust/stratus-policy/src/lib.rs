#![warn(missing_docs)]

//! Minimal authorization policy derived from resource identity.
//!
//! A grant attaches exactly one [`PolicyStatement`] (actions × resources) to
//! the [`PolicyDocument`] owned by a [`Principal`]. Resources expose curated
//! grants through [`Grantable`], whose action sets come from one immutable
//! registry keyed by ([`ResourceKind`], [`Capability`]).
//!
//! ```text
//! Grantable::grant_capability(principal, Capability::Read)
//!   ├── registry::lookup(kind, Read)      → ActionSet
//!   ├── Grantable::grant_targets(Read)    → [Arn]
//!   └── grant(principal, actions, arns)   → Grant
//!         └── principal.policy_document_mut().add_statement(..)
//! ```
//!
//! # Example
//!
//! ```
//! use stratus_identity::{Environment, ResourceIdentity};
//! use stratus_policy::{PolicyHolder, Principal, grant};
//!
//! let environment = Environment::new("123456789012", "us-east-1");
//! let role = ResourceIdentity::new("iam", "role")
//!     .named("deployer")
//!     .global()
//!     .resolve(&environment);
//!
//! let mut builder = PolicyHolder::new("Builder");
//! grant(&mut builder, ["iam:PassRole"], [role]).unwrap();
//!
//! assert_eq!(builder.policy_document().len(), 1);
//! ```
//!
//! Repeated identical grants are not merged: each call appends its own
//! statement.

mod error;
pub use error::*;

mod statement;
pub use statement::*;

mod document;
pub use document::*;

mod principal;
pub use principal::*;

mod grant;
pub use grant::*;

mod action;
pub use action::*;

pub mod registry;
pub use registry::{Capability, ResourceKind};

mod grantable;
pub use grantable::*;
