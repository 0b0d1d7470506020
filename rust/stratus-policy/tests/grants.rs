//! Grant behaviour observed through principals' documents.
mod grants {
    use pretty_assertions::assert_eq;
    use stratus_identity::{Arn, Environment, ResourceIdentity};
    use stratus_policy::{
        Capability, GrantError, Grantable, PolicyHolder, Principal, ResourceKind, grant, registry,
    };
    use testresult::TestResult;

    struct Service {
        arn: Arn,
    }

    impl Grantable for Service {
        fn kind(&self) -> ResourceKind {
            ResourceKind::ServiceRunner
        }

        fn identity(&self) -> Arn {
            self.arn.clone()
        }

        fn grant_targets(&self, _capability: Capability) -> Vec<Arn> {
            vec![self.arn.with_suffix("/*")]
        }
    }

    fn service() -> Service {
        let environment = Environment::new("123456789012", "us-east-1");
        Service {
            arn: ResourceIdentity::new("apprunner", "service")
                .named("api")
                .resolve(&environment),
        }
    }

    #[test]
    fn it_attaches_exactly_the_given_actions_and_resources() -> TestResult {
        let target = Arn::from_raw("arn:aws:s3:::site");
        let mut principal = PolicyHolder::new("Reader");

        let receipt = grant(
            &mut principal,
            ["s3:GetObject*", "s3:List*"],
            [target.clone()],
        )?;

        let statements = principal.policy_document().statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].actions(), &["s3:GetObject*", "s3:List*"]);
        assert_eq!(statements[0].resources(), &[target]);
        assert_eq!(receipt.index(), 0);
        assert_eq!(receipt.principal_id(), "Reader");
        Ok(())
    }

    #[test]
    fn it_never_merges_identical_grants() -> TestResult {
        let target = Arn::from_raw("arn:aws:iam::123456789012:role/deployer");
        let mut principal = PolicyHolder::new("Builder");

        grant(&mut principal, ["iam:PassRole"], [target.clone()])?;
        grant(&mut principal, ["iam:PassRole"], [target])?;

        let statements = principal.policy_document().statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], statements[1]);
        Ok(())
    }

    #[test]
    fn it_rejects_empty_inputs_without_side_effects() {
        let mut principal = PolicyHolder::new("Nobody");

        let no_actions = grant(
            &mut principal,
            Vec::<String>::new(),
            [Arn::from_raw("arn:aws:s3:::site")],
        );
        assert_eq!(
            no_actions,
            Err(GrantError::EmptyActions {
                principal: "Nobody".into()
            })
        );

        let no_resources = grant(&mut principal, ["s3:List*"], Vec::<Arn>::new());
        assert_eq!(
            no_resources,
            Err(GrantError::EmptyResources {
                principal: "Nobody".into()
            })
        );

        assert!(principal.policy_document().is_empty());
    }

    #[test]
    fn it_only_touches_the_grantee() -> TestResult {
        let mut grantee = PolicyHolder::new("Grantee");
        let bystander = PolicyHolder::new("Bystander");

        service().grant_capability(&mut grantee, Capability::Operate)?;

        assert_eq!(grantee.policy_document().len(), 1);
        assert!(bystander.policy_document().is_empty());
        Ok(())
    }

    #[test]
    fn it_grants_capabilities_on_overridden_targets() -> TestResult {
        let mut principal = PolicyHolder::new("Operator");

        let receipt = service().grant_capability(&mut principal, Capability::Operate)?;

        assert_eq!(
            receipt.actions(),
            &[
                "apprunner:PauseService",
                "apprunner:ResumeService",
                "apprunner:StartDeployment"
            ]
        );
        assert_eq!(
            receipt.resources()[0].as_str(),
            "arn:aws:apprunner:us-east-1:123456789012:service/api/*"
        );
        Ok(())
    }

    #[test]
    fn it_grants_arbitrary_actions_on_the_identity() -> TestResult {
        let mut principal = PolicyHolder::new("Custom");

        let receipt = service().grant(&mut principal, &["apprunner:TagResource"])?;

        assert_eq!(receipt.actions(), &["apprunner:TagResource"]);
        assert_eq!(
            receipt.resources()[0].as_str(),
            "arn:aws:apprunner:us-east-1:123456789012:service/api"
        );
        Ok(())
    }

    #[test]
    fn it_unions_read_and_write_for_read_write() -> TestResult {
        let read = registry::lookup(ResourceKind::ServiceRunner, Capability::Read)?;
        let write = registry::lookup(ResourceKind::ServiceRunner, Capability::Write)?;
        let read_write = registry::lookup(ResourceKind::ServiceRunner, Capability::ReadWrite)?;

        let expected: Vec<&str> = read.actions().chain(write.actions()).collect();
        assert_eq!(read_write.actions().collect::<Vec<_>>(), expected);
        Ok(())
    }

    #[test]
    fn it_fails_for_capabilities_a_kind_does_not_have() {
        let mut principal = PolicyHolder::new("Puller");

        let result = service().grant_capability(&mut principal, Capability::Pull);

        assert_eq!(
            result,
            Err(GrantError::UnknownCapability {
                kind: ResourceKind::ServiceRunner,
                capability: Capability::Pull,
            })
        );
        assert!(principal.policy_document().is_empty());
    }
}
