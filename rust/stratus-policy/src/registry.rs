//! The capability registry.
//!
//! One immutable table maps (resource kind, capability) to the exact action
//! strings the platform checks. Resource wrappers never spell out actions
//! themselves; they look them up here.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{ActionSet, GrantError};

/// Kinds of resources that expose capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Edge (CDN) distribution.
    Distribution,
    /// Container service runner.
    ServiceRunner,
    /// Identity role.
    Role,
    /// Identity user.
    User,
    /// Object-storage bucket.
    Bucket,
    /// Container image repository.
    Repository,
    /// Serverless function.
    Function,
}

impl ResourceKind {
    /// Kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Distribution => "distribution",
            ResourceKind::ServiceRunner => "service-runner",
            ResourceKind::Role => "role",
            ResourceKind::User => "user",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Repository => "repository",
            ResourceKind::Function => "function",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Named bundles of actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Invalidate cached edge content.
    Invalidate,
    /// Read-only inspection.
    Read,
    /// Configuration changes.
    Write,
    /// Runtime operations (pause, resume, deploy).
    Operate,
    /// Read and write together.
    ReadWrite,
    /// Read an identity role.
    Get,
    /// Create new resources of the kind.
    Create,
    /// Hand a role to a service.
    Pass,
    /// Issue service-specific credentials for a user.
    CreateServiceCredential,
    /// List every resource of the kind.
    List,
    /// Describe one resource.
    Describe,
    /// Enumerate and delete all contents.
    Empty,
    /// Pull container images.
    Pull,
    /// Invoke a function.
    Invoke,
}

impl Capability {
    /// Kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Invalidate => "invalidate",
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Operate => "operate",
            Capability::ReadWrite => "read-write",
            Capability::Get => "get",
            Capability::Create => "create",
            Capability::Pass => "pass",
            Capability::CreateServiceCredential => "create-service-credential",
            Capability::List => "list",
            Capability::Describe => "describe",
            Capability::Empty => "empty",
            Capability::Pull => "pull",
            Capability::Invoke => "invoke",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const DISTRIBUTION_INVALIDATE: &[&str] = &["cloudfront:CreateInvalidation"];

const SERVICE_READ: &[&str] = &[
    "apprunner:DescribeService",
    "apprunner:ListOperations",
    "apprunner:DescribeCustomDomains",
];
const SERVICE_WRITE: &[&str] = &[
    "apprunner:UpdateService",
    "apprunner:AssociateCustomDomain",
    "apprunner:DisassociateCustomDomain",
];
const SERVICE_OPERATE: &[&str] = &[
    "apprunner:PauseService",
    "apprunner:ResumeService",
    "apprunner:StartDeployment",
];
const SERVICE_CREATE: &[&str] = &["apprunner:CreateService"];
const SERVICE_LIST: &[&str] = &["apprunner:ListServices"];
const SERVICE_DESCRIBE: &[&str] = &["apprunner:DescribeService"];

const ROLE_GET: &[&str] = &["iam:GetRole"];
const ROLE_CREATE: &[&str] = &["iam:CreateRole", "iam:CreateServiceLinkedRole"];
const ROLE_PASS: &[&str] = &["iam:PassRole"];

const USER_CREATE_SERVICE_CREDENTIAL: &[&str] = &["iam:CreateServiceSpecificCredential"];

const BUCKET_READ: &[&str] = &["s3:GetObject*", "s3:GetBucket*", "s3:List*"];
const BUCKET_EMPTY: &[&str] = &["s3:GetBucket*", "s3:List*", "s3:DeleteObject*"];

const REPOSITORY_PULL: &[&str] = &[
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
];
const REPOSITORY_EMPTY: &[&str] = &["ecr:ListImages", "ecr:BatchDeleteImage"];

const FUNCTION_INVOKE: &[&str] = &["lambda:InvokeFunction"];

/// One row of the registry.
#[derive(Debug)]
pub struct CapabilityEntry {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Capability name.
    pub capability: Capability,
    /// The actions granted.
    pub actions: ActionSet,
}

const fn entry(
    kind: ResourceKind,
    capability: Capability,
    name: &'static str,
    parts: &'static [&'static [&'static str]],
) -> CapabilityEntry {
    CapabilityEntry {
        kind,
        capability,
        actions: ActionSet::new(name, parts),
    }
}

static REGISTRY: &[CapabilityEntry] = &[
    entry(
        ResourceKind::Distribution,
        Capability::Invalidate,
        "invalidate",
        &[DISTRIBUTION_INVALIDATE],
    ),
    entry(ResourceKind::ServiceRunner, Capability::Read, "read", &[SERVICE_READ]),
    entry(ResourceKind::ServiceRunner, Capability::Write, "write", &[SERVICE_WRITE]),
    entry(
        ResourceKind::ServiceRunner,
        Capability::Operate,
        "operate",
        &[SERVICE_OPERATE],
    ),
    entry(
        ResourceKind::ServiceRunner,
        Capability::ReadWrite,
        "read-write",
        &[SERVICE_READ, SERVICE_WRITE],
    ),
    entry(ResourceKind::ServiceRunner, Capability::Create, "create", &[SERVICE_CREATE]),
    entry(ResourceKind::ServiceRunner, Capability::List, "list", &[SERVICE_LIST]),
    entry(
        ResourceKind::ServiceRunner,
        Capability::Describe,
        "describe",
        &[SERVICE_DESCRIBE],
    ),
    entry(ResourceKind::Role, Capability::Get, "get", &[ROLE_GET]),
    entry(ResourceKind::Role, Capability::Create, "create", &[ROLE_CREATE]),
    entry(ResourceKind::Role, Capability::Pass, "pass", &[ROLE_PASS]),
    entry(
        ResourceKind::User,
        Capability::CreateServiceCredential,
        "create-service-credential",
        &[USER_CREATE_SERVICE_CREDENTIAL],
    ),
    entry(ResourceKind::Bucket, Capability::Read, "read", &[BUCKET_READ]),
    entry(ResourceKind::Bucket, Capability::Empty, "empty", &[BUCKET_EMPTY]),
    entry(ResourceKind::Repository, Capability::Pull, "pull", &[REPOSITORY_PULL]),
    entry(ResourceKind::Repository, Capability::Empty, "empty", &[REPOSITORY_EMPTY]),
    entry(ResourceKind::Function, Capability::Invoke, "invoke", &[FUNCTION_INVOKE]),
];

/// The action set registered for `capability` on `kind`.
///
/// # Errors
///
/// [`GrantError::UnknownCapability`] when the pair is not registered.
pub fn lookup(
    kind: ResourceKind,
    capability: Capability,
) -> Result<&'static ActionSet, GrantError> {
    REGISTRY
        .iter()
        .find(|entry| entry.kind == kind && entry.capability == capability)
        .map(|entry| &entry.actions)
        .ok_or(GrantError::UnknownCapability { kind, capability })
}

/// Every capability registered for `kind`, in registry order.
pub fn capabilities(kind: ResourceKind) -> impl Iterator<Item = &'static CapabilityEntry> {
    REGISTRY.iter().filter(move |entry| entry.kind == kind)
}

/// The whole registry.
pub fn entries() -> &'static [CapabilityEntry] {
    REGISTRY
}
