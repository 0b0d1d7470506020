//! The registry's action literals are part of the public contract.
mod registry {
    use pretty_assertions::assert_eq;
    use stratus_policy::{Capability, ResourceKind, registry::lookup};
    use testresult::TestResult;

    fn actions(
        kind: ResourceKind,
        capability: Capability,
    ) -> Result<Vec<&'static str>, stratus_policy::GrantError> {
        Ok(lookup(kind, capability)?.actions().collect())
    }

    #[test]
    fn it_matches_the_edge_distribution_literals() -> TestResult {
        assert_eq!(
            actions(ResourceKind::Distribution, Capability::Invalidate)?,
            vec!["cloudfront:CreateInvalidation"]
        );
        Ok(())
    }

    #[test]
    fn it_matches_the_service_runner_literals() -> TestResult {
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::Read)?,
            vec![
                "apprunner:DescribeService",
                "apprunner:ListOperations",
                "apprunner:DescribeCustomDomains"
            ]
        );
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::Write)?,
            vec![
                "apprunner:UpdateService",
                "apprunner:AssociateCustomDomain",
                "apprunner:DisassociateCustomDomain"
            ]
        );
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::Operate)?,
            vec![
                "apprunner:PauseService",
                "apprunner:ResumeService",
                "apprunner:StartDeployment"
            ]
        );
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::Create)?,
            vec!["apprunner:CreateService"]
        );
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::List)?,
            vec!["apprunner:ListServices"]
        );
        assert_eq!(
            actions(ResourceKind::ServiceRunner, Capability::Describe)?,
            vec!["apprunner:DescribeService"]
        );
        Ok(())
    }

    #[test]
    fn it_matches_the_identity_literals() -> TestResult {
        assert_eq!(actions(ResourceKind::Role, Capability::Get)?, vec!["iam:GetRole"]);
        assert_eq!(
            actions(ResourceKind::Role, Capability::Create)?,
            vec!["iam:CreateRole", "iam:CreateServiceLinkedRole"]
        );
        assert_eq!(actions(ResourceKind::Role, Capability::Pass)?, vec!["iam:PassRole"]);
        assert_eq!(
            actions(ResourceKind::User, Capability::CreateServiceCredential)?,
            vec!["iam:CreateServiceSpecificCredential"]
        );
        Ok(())
    }

    #[test]
    fn it_matches_the_storage_literals() -> TestResult {
        assert_eq!(
            actions(ResourceKind::Bucket, Capability::Empty)?,
            vec!["s3:GetBucket*", "s3:List*", "s3:DeleteObject*"]
        );
        assert_eq!(
            actions(ResourceKind::Repository, Capability::Empty)?,
            vec!["ecr:ListImages", "ecr:BatchDeleteImage"]
        );
        assert_eq!(
            actions(ResourceKind::Repository, Capability::Pull)?,
            vec![
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage"
            ]
        );
        assert_eq!(
            actions(ResourceKind::Function, Capability::Invoke)?,
            vec!["lambda:InvokeFunction"]
        );
        Ok(())
    }

    #[test]
    fn it_serializes_keys_in_kebab_case() -> TestResult {
        assert_eq!(
            serde_json::to_string(&Capability::CreateServiceCredential)?,
            "\"create-service-credential\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceKind::ServiceRunner)?,
            "\"service-runner\""
        );
        Ok(())
    }
}
