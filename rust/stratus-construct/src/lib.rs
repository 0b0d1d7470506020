#![warn(missing_docs)]

//! Declarative resource wrappers and the composite constructs built from
//! them.
//!
//! Constructs are declared against a [`Stack`], which hands out stable
//! logical ids, and rendered into a [`Template`]:
//!
//! ```
//! use stratus_construct::{Cdn, CdnProps, DeletionPolicy, Stack};
//! use stratus_identity::Environment;
//! use stratus_policy::PolicyHolder;
//!
//! # fn main() -> Result<(), stratus_construct::ConstructError> {
//! let mut stack = Stack::new("Site", Environment::new("123456789012", "us-east-1"));
//! let cdn = Cdn::new(
//!     &mut stack,
//!     "Web",
//!     CdnProps {
//!         deletion_policy: DeletionPolicy::Destroy,
//!         ..CdnProps::default()
//!     },
//! )?;
//!
//! let mut deployer = PolicyHolder::new("Deployer");
//! cdn.grant_invalidate(&mut deployer)?;
//!
//! let template = stack.synthesize(&[&cdn])?;
//! assert_eq!(template.resources_of_type("AWS::CloudFront::Distribution").count(), 1);
//! assert_eq!(template.resources_of_type("Custom::StratusCleanup").count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Storage declared with [`DeletionPolicy::Destroy`] carries a
//! [`LifecycleGuard`] that empties it before the platform deletes it. Any
//! other policy declares nothing extra.

mod error;
pub use error::*;

mod removal;
pub use removal::*;

mod template;
pub use template::*;

mod stack;
pub use stack::*;

mod resource;
pub use resource::*;

pub mod guard;
pub use guard::{LifecycleGuard, Removable, Trigger};

mod cdn;
pub use cdn::*;

mod image_service;
pub use image_service::*;
