#![warn(missing_docs)]

//! Function entry points for destroy-time cleanup.
//!
//! Two binaries run on a function runtime and speak its runtime interface
//! through [`RuntimeClient`]:
//!
//! - `stratus-cleanup-router` receives lifecycle events, forwards deletes to
//!   the handler function named by `STRATUS_CLEANUP_HANDLER` through
//!   [`LambdaInvoker`], and uploads a [`ResourceReply`] to the event's
//!   response URL;
//! - `stratus-cleanup-handler` empties the target of each invocation with
//!   [`BucketStore`] or [`RepositoryStore`], picked by [`KindDispatch`].
//!
//! Service calls are signed with [`Signer`] using credentials from the
//! function environment.

mod error;
pub use error::*;

mod config;
pub use config::*;

mod signer;
pub use signer::*;

mod client;
pub use client::*;

mod s3;
pub use s3::*;

mod ecr;
pub use ecr::*;

mod lambda;
pub use lambda::*;

mod runtime;
pub use runtime::*;

mod provider;
pub use provider::*;

mod dispatch;
pub use dispatch::*;

mod functions;
pub use functions::*;

mod telemetry;
pub use telemetry::*;
