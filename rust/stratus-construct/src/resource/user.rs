use serde_json::{Map, Value, json};
use stratus_identity::{Arn, ResourceIdentity};
use stratus_policy::{
    Capability, Grant, GrantError, Grantable, PolicyDocument, Principal, ResourceKind,
};

use crate::{
    ConstructError, ResourceDeclaration, Stack, Synthesize, Template, resource::attribute_arn,
    substituted,
};

/// Properties of a [`User`].
#[derive(Debug, Clone, Default)]
pub struct UserProps {
    /// Physical name. Generated by the platform when `None`.
    pub user_name: Option<String>,
}

/// An identity user, e.g. for a CI system that needs long-lived
/// credentials.
#[derive(Debug, Clone)]
pub struct User {
    logical_id: String,
    arn: Arn,
    props: UserProps,
    document: PolicyDocument,
}

impl User {
    /// Declare a user at `path`.
    pub fn new(stack: &mut Stack, path: &str, props: UserProps) -> Result<Self, ConstructError> {
        let logical_id = stack.allocate(path)?;
        let arn = match &props.user_name {
            Some(name) => ResourceIdentity::new("iam", "user")
                .named(name)
                .global()
                .resolve(stack.environment()),
            None => attribute_arn(&logical_id, "Arn"),
        };

        Ok(Self {
            logical_id,
            arn,
            props,
            document: PolicyDocument::default(),
        })
    }

    /// The user's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The user's identifier.
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// Allow `principal` to issue service-specific credentials (e.g. git
    /// credentials) for this user.
    pub fn grant_create_service_credential(
        &self,
        principal: &mut dyn Principal,
    ) -> Result<Grant, GrantError> {
        self.grant_capability(principal, Capability::CreateServiceCredential)
    }
}

impl Principal for User {
    fn principal_id(&self) -> &str {
        &self.logical_id
    }

    fn policy_document(&self) -> &PolicyDocument {
        &self.document
    }

    fn policy_document_mut(&mut self) -> &mut PolicyDocument {
        &mut self.document
    }
}

impl Grantable for User {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn identity(&self) -> Arn {
        self.arn.clone()
    }
}

impl Synthesize for User {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        let mut properties = Map::new();
        if let Some(name) = &self.props.user_name {
            properties.insert("UserName".into(), substituted(name));
        }
        if !self.document.is_empty() {
            properties.insert(
                "Policies".into(),
                json!([{
                    "PolicyName": format!("{}Policy", self.logical_id),
                    "PolicyDocument": serde_json::to_value(&self.document)?,
                }]),
            );
        }

        template.add_resource(
            &self.logical_id,
            ResourceDeclaration::new("AWS::IAM::User", Value::Object(properties)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_identity::Environment;
    use stratus_policy::PolicyHolder;
    use testresult::TestResult;

    #[test]
    fn it_grants_service_credentials_on_itself() -> TestResult {
        let mut stack = Stack::new("Test", Environment::new("123456789012", "us-east-1"));
        let user = User::new(
            &mut stack,
            "Mirror",
            UserProps {
                user_name: Some("mirror".into()),
            },
        )?;
        let mut admin = PolicyHolder::new("Admin");

        let receipt = user.grant_create_service_credential(&mut admin)?;

        assert_eq!(receipt.actions(), &["iam:CreateServiceSpecificCredential"]);
        assert_eq!(
            receipt.resources()[0].as_str(),
            "arn:aws:iam::123456789012:user/mirror"
        );
        Ok(())
    }
}
