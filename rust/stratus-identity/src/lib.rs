#![warn(missing_docs)]

//! Resource identity for declarative cloud building blocks.
//!
//! Every resource the workspace knows about can be named by an [`Arn`]. An
//! [`Arn`] is produced by resolving a [`ResourceIdentity`] (service, resource
//! type, resource name) against an [`Environment`] (partition, account,
//! region):
//!
//! ```text
//! arn:{partition}:{service}:{region}:{account}:{resource_type}/{resource_name}
//! ```
//!
//! Partition-global resources (IAM roles and users, edge distributions) leave
//! the region field empty. Object-storage buckets leave both region and
//! account empty and use the bare bucket name as the resource part.
//!
//! # Example
//!
//! ```
//! use stratus_identity::{Environment, ResourceIdentity};
//!
//! let environment = Environment::new("123456789012", "eu-west-1");
//!
//! let role = ResourceIdentity::new("iam", "role")
//!     .named("deployer")
//!     .global()
//!     .resolve(&environment);
//! assert_eq!(role.as_str(), "arn:aws:iam::123456789012:role/deployer");
//!
//! let services = ResourceIdentity::new("apprunner", "service")
//!     .wildcard()
//!     .resolve(&environment);
//! assert_eq!(
//!     services.as_str(),
//!     "arn:aws:apprunner:eu-west-1:123456789012:service/*"
//! );
//! ```
//!
//! # Tokens
//!
//! Some names are assigned by the platform when a resource is provisioned
//! (a distribution id, a generated role name). Those are represented by a
//! [`Token`] that renders as `${LogicalId}` or `${LogicalId.Attribute}`, the
//! substitution syntax understood by `Fn::Sub`. An [`Arn`] that contains a
//! token serializes as `{"Fn::Sub": "..."}` and can be turned into a literal
//! ARN with [`Arn::resolve_tokens`] once the values are known.

mod error;
pub use error::*;

mod environment;
pub use environment::*;

mod token;
pub use token::*;

mod arn;
pub use arn::*;

mod identity;
pub use identity::*;
