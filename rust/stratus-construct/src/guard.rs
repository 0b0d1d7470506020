//! Destroy-time cleanup for storage the platform will not delete while it
//! still holds content.
//!
//! A guard is attached at construction time, and only when the owning
//! resource's deletion policy is [`DeletionPolicy::Destroy`]. It declares:
//!
//! ```text
//! CleanupHandlerRole ── empty ──▶ target
//! CleanupHandler (runs as CleanupHandlerRole)
//! CleanupRouterRole ── invoke ──▶ CleanupHandler
//! CleanupRouter (runs as CleanupRouterRole)
//! CleanupTrigger { ServiceToken: CleanupRouter, resourceName, resourceKind }
//!   DependsOn: target, CleanupHandler
//! ```
//!
//! The trigger depends on the target, so on teardown it is deleted first:
//! its delete event reaches the router, which runs the handler, and only a
//! successful cleanup lets deletion of the target proceed.

use serde_json::json;
pub use stratus_cleanup::HANDLER_FUNCTION_ENV_VAR;
use stratus_cleanup::{ContentKind, RESOURCE_KIND_PROPERTY, RESOURCE_NAME_PROPERTY};
use stratus_identity::Arn;
use stratus_policy::{Capability, Grantable};
use tracing::{debug, info};

use crate::{
    ConstructError, DeletionPolicy, Function, FunctionCode, FunctionProps, ManagedPolicy,
    ResourceDeclaration, Role, RoleProps, ServicePrincipal, Stack, Synthesize, Template,
    child_path, substituted,
};

/// Resource type of the trigger record.
pub const TRIGGER_RESOURCE_TYPE: &str = "Custom::StratusCleanup";

/// Object key of the handler's code archive in the asset bucket. Built from
/// the `stratus-cleanup-handler` binary.
pub const HANDLER_CODE_KEY: &str = "stratus-cleanup/handler.zip";

/// Object key of the router's code archive in the asset bucket. Built from
/// the `stratus-cleanup-router` binary.
pub const ROUTER_CODE_KEY: &str = "stratus-cleanup/router.zip";

/// Platform maximum.
const HANDLER_TIMEOUT_SECONDS: u32 = 900;

const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";

/// Storage that can be emptied by a lifecycle guard.
pub trait Removable: Grantable {
    /// Path the resource was declared at. Guard parts are declared below it.
    fn construct_path(&self) -> &str;

    /// Logical id of the resource declaration.
    fn logical_id(&self) -> &str;

    /// What the cleanup handler is emptying.
    fn content_kind(&self) -> ContentKind;

    /// Physical name passed to the handler. May contain placeholders.
    fn physical_name(&self) -> String;
}

/// The declarative record that binds the router to the target's deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    logical_id: String,
    service_token: Arn,
    resource_name: String,
    resource_kind: ContentKind,
    depends_on: Vec<String>,
}

impl Trigger {
    /// The trigger's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Name of the container the handler will empty.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Kind of the container the handler will empty.
    pub fn resource_kind(&self) -> ContentKind {
        self.resource_kind
    }
}

/// Handler, router and trigger attached to one removable resource.
#[derive(Debug, Clone)]
pub struct LifecycleGuard {
    target: String,
    handler_role: Role,
    handler: Function,
    router_role: Role,
    router: Function,
    trigger: Trigger,
}

impl LifecycleGuard {
    /// Attach a guard to `target` when `policy` is destroy.
    ///
    /// Returns `None`, and declares nothing, for any other policy.
    pub fn attach(
        stack: &mut Stack,
        target: &dyn Removable,
        policy: DeletionPolicy,
    ) -> Result<Option<Self>, ConstructError> {
        if !policy.is_destroy() {
            debug!(resource = target.construct_path(), %policy, "no lifecycle guard");
            return Ok(None);
        }

        let path = target.construct_path();
        let asset_bucket = stack.asset_bucket().to_string();

        let mut handler_role = Role::new(
            stack,
            &child_path(path, "CleanupHandlerRole"),
            lambda_role_props(),
        )?;
        target.grant_capability(&mut handler_role, Capability::Empty)?;

        let mut handler = Function::new(
            stack,
            &child_path(path, "CleanupHandler"),
            FunctionProps::new(
                FunctionCode::Asset {
                    bucket: asset_bucket.clone(),
                    key: HANDLER_CODE_KEY.into(),
                },
                handler_role.arn().clone(),
            )
            .with_timeout(HANDLER_TIMEOUT_SECONDS),
        )?;
        handler.add_dependency(handler_role.logical_id());

        let mut router_role = Role::new(
            stack,
            &child_path(path, "CleanupRouterRole"),
            lambda_role_props(),
        )?;
        handler.grant_invoke(&mut router_role)?;

        let mut router = Function::new(
            stack,
            &child_path(path, "CleanupRouter"),
            FunctionProps::new(
                FunctionCode::Asset {
                    bucket: asset_bucket,
                    key: ROUTER_CODE_KEY.into(),
                },
                router_role.arn().clone(),
            )
            .with_timeout(HANDLER_TIMEOUT_SECONDS)
            .with_environment(HANDLER_FUNCTION_ENV_VAR, handler.name().to_string()),
        )?;
        router.add_dependency(router_role.logical_id());

        let trigger = Trigger {
            logical_id: stack.allocate(&child_path(path, "CleanupTrigger"))?,
            service_token: router.arn().clone(),
            resource_name: target.physical_name(),
            resource_kind: target.content_kind(),
            depends_on: vec![
                target.logical_id().to_string(),
                handler.logical_id().to_string(),
            ],
        };

        info!(
            resource = path,
            kind = %trigger.resource_kind,
            trigger = %trigger.logical_id,
            "attached lifecycle guard"
        );
        Ok(Some(Self {
            target: target.logical_id().to_string(),
            handler_role,
            handler,
            router_role,
            router,
            trigger,
        }))
    }

    /// Logical id of the guarded resource.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The function that empties the target.
    pub fn handler(&self) -> &Function {
        &self.handler
    }

    /// The handler's execution role.
    pub fn handler_role(&self) -> &Role {
        &self.handler_role
    }

    /// The function receiving lifecycle events.
    pub fn router(&self) -> &Function {
        &self.router
    }

    /// The router's execution role.
    pub fn router_role(&self) -> &Role {
        &self.router_role
    }

    /// The trigger record.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }
}

fn lambda_role_props() -> RoleProps {
    RoleProps::assumed_by(ServicePrincipal::new(ServicePrincipal::LAMBDA))
        .with_managed_policy(ManagedPolicy::aws_managed(BASIC_EXECUTION_POLICY))
}

impl Synthesize for Trigger {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let properties = json!({
            "ServiceToken": serde_json::to_value(&self.service_token)?,
            RESOURCE_NAME_PROPERTY: substituted(&self.resource_name),
            RESOURCE_KIND_PROPERTY: self.resource_kind.as_str(),
        });

        let declaration = self.depends_on.iter().fold(
            ResourceDeclaration::new(TRIGGER_RESOURCE_TYPE, properties),
            |declaration, dependency| declaration.depends_on(dependency),
        );
        template.add_resource(&self.logical_id, declaration)
    }
}

impl Synthesize for LifecycleGuard {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        self.handler_role.synthesize(template)?;
        self.handler.synthesize(template)?;
        self.router_role.synthesize(template)?;
        self.router.synthesize(template)?;
        self.trigger.synthesize(template)
    }
}

/// Render `declaration` for a removable resource, plus its guard if any.
pub(crate) fn synthesize_guarded(
    template: &mut Template,
    logical_id: &str,
    declaration: ResourceDeclaration,
    guard: Option<&LifecycleGuard>,
) -> Result<(), ConstructError> {
    template.add_resource(logical_id, declaration)?;
    match guard {
        Some(guard) => guard.synthesize(template),
        None => Ok(()),
    }
}
