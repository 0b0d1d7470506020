#![warn(missing_docs)]

//! Destroy-time cleanup of resources the declarative layer cannot empty.
//!
//! A bucket with objects or a repository with images cannot be deleted by
//! the orchestrator. When such a resource is declared with a destroy
//! deletion policy, a lifecycle guard deploys two functions next to it:
//!
//! - the **router** receives create, update and delete lifecycle events and
//!   forwards only delete events;
//! - the **handler** lists every item in the target (following continuation
//!   tokens) and deletes them in batches.
//!
//! The handler talks to storage through the [`ContentStore`] seam;
//! [`MemoryContentStore`] backs the tests. When router and handler run as
//! separate functions, the router wraps a [`RemoteCleanup`] that forwards
//! each target to the handler named by `STRATUS_CLEANUP_HANDLER`, and the
//! handler answers with [`serve_invocation`].
//!
//! ```
//! # async fn example() -> Result<(), stratus_cleanup::CleanupError> {
//! use stratus_cleanup::{
//!     CleanupHandler, CleanupSettings, ContentKind, MemoryContentStore, Router,
//! };
//!
//! let store = MemoryContentStore::new(ContentKind::Repository);
//! store.insert("images", ["sha256:a", "sha256:b"]).await;
//!
//! let router = Router::new(CleanupHandler::new(store.clone(), CleanupSettings::default()));
//! let response = router
//!     .handle_json(
//!         r#"{
//!             "RequestType": "Delete",
//!             "PhysicalResourceId": "images",
//!             "ResourceProperties": {
//!                 "resourceName": "images",
//!                 "resourceKind": "repository"
//!             }
//!         }"#,
//!     )
//!     .await?;
//!
//! assert!(response.contains("\"PhysicalResourceId\":\"images\""));
//! assert!(store.items("images").await.is_empty());
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod contract;
pub use contract::*;

mod store;
pub use store::*;

mod memory;
pub use memory::*;

mod settings;
pub use settings::*;

mod handler;
pub use handler::*;

mod router;
pub use router::*;

mod remote;
pub use remote::*;
