//! Properties of identifier resolution.
mod resolve {
    use pretty_assertions::assert_eq;
    use stratus_identity::{
        Arn, Environment, ProvisionedAttributes, ResourceIdentity, ResourceName, Token, resolve,
    };
    use testresult::TestResult;

    #[test]
    fn it_is_a_pure_function_of_its_inputs() {
        let environment = Environment::new("123456789012", "us-east-1");

        let first = resolve(
            "apprunner",
            "service",
            ResourceName::Named("api".into()),
            &environment,
            Some("us-east-1"),
        );
        let second = resolve(
            "apprunner",
            "service",
            ResourceName::Named("api".into()),
            &environment,
            Some("us-east-1"),
        );

        assert_eq!(first, second);
        assert_eq!(
            first.as_str(),
            "arn:aws:apprunner:us-east-1:123456789012:service/api"
        );
    }

    #[test]
    fn it_produces_well_formed_global_identifiers() -> TestResult {
        let environment = Environment::new("123456789012", "us-east-1");

        let arn = resolve(
            "iam",
            "role",
            ResourceName::Named("deployer".into()),
            &environment,
            None,
        );

        assert_eq!(arn.as_str(), "arn:aws:iam::123456789012:role/deployer");
        assert!(!arn.as_str().contains(":::"));
        assert!(!arn.as_str().contains("//"));

        let components = Arn::parse(arn.as_str())?;
        assert_eq!(components.region, "");
        assert_eq!(components.resource_name(), "deployer");
        Ok(())
    }

    #[test]
    fn it_resolves_wildcards() {
        let environment = Environment::new("123456789012", "us-east-1");
        let arn = resolve("iam", "role", ResourceName::Wildcard, &environment, None);
        assert_eq!(arn.as_str(), "arn:aws:iam::123456789012:role/*");
    }

    #[test]
    fn it_defers_tokens_until_provisioned() -> TestResult {
        let distribution = Token::reference("CdnDistribution1A2B3C4D");
        let arn = ResourceIdentity::new("cloudfront", "distribution")
            .named(distribution.to_string())
            .global()
            .resolve(&Environment::agnostic());

        assert!(!arn.is_resolved());
        assert_eq!(
            arn.as_str(),
            concat!(
                "arn:${AWS::Partition}:cloudfront::${AWS::AccountId}:",
                "distribution/${CdnDistribution1A2B3C4D}",
            )
        );

        let mut attributes = ProvisionedAttributes::default();
        attributes
            .insert(&distribution, "E2QWRUHAPOMQZL")
            .insert_pseudo("AWS::Partition", "aws")
            .insert_pseudo("AWS::AccountId", "123456789012");

        let resolved = arn.resolve_tokens(&attributes)?;
        assert!(resolved.is_resolved());
        assert_eq!(
            resolved.as_str(),
            "arn:aws:cloudfront::123456789012:distribution/E2QWRUHAPOMQZL"
        );
        Ok(())
    }
}
