//! Container images run as managed services.
mod image_service {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stratus_construct::{
        ConstructError, ECR_ACCESS_POLICY, ImageRepositoryType, ImageService, ImageServiceProps,
        Stack,
    };
    use stratus_identity::{Environment, ProvisionedAttributes};
    use stratus_policy::PolicyHolder;
    use testresult::TestResult;

    fn stack() -> Stack {
        Stack::new("Web", Environment::new("123456789012", "us-east-1"))
    }

    #[test]
    fn it_runs_a_public_image() -> TestResult {
        let mut stack = stack();
        let service = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("public.ecr.aws/x/y:latest").with_port(8080),
        )?;

        assert_eq!(service.image().repository_type(), ImageRepositoryType::EcrPublic);
        let access_role = service.access_role();
        assert_eq!(access_role.assumed_by().service(), "build.apprunner.amazonaws.com");
        let managed: Vec<&str> = access_role
            .managed_policy_arns()
            .iter()
            .map(|arn| arn.as_str())
            .collect();
        assert_eq!(
            managed,
            vec![format!("arn:aws:iam::aws:policy/{ECR_ACCESS_POLICY}")]
        );

        let template = stack.synthesize(&[&service])?;
        let declaration = template
            .resource(service.service().logical_id())
            .ok_or("service not rendered")?;
        let source = &declaration.properties()["SourceConfiguration"];
        assert_eq!(
            source["ImageRepository"],
            json!({
                "ImageIdentifier": "public.ecr.aws/x/y:latest",
                "ImageRepositoryType": "ECR_PUBLIC",
                "ImageConfiguration": { "Port": "8080" },
            })
        );
        assert!(source.get("AuthenticationConfiguration").is_none());

        let (_, role) = template
            .resources_of_type("AWS::IAM::Role")
            .next()
            .ok_or("access role not rendered")?;
        assert_eq!(
            role.properties()["AssumeRolePolicyDocument"]["Statement"],
            json!([{
                "Effect": "Allow",
                "Principal": { "Service": "build.apprunner.amazonaws.com" },
                "Action": "sts:AssumeRole",
            }])
        );
        Ok(())
    }

    #[test]
    fn it_resolves_outputs_after_provisioning() -> TestResult {
        let mut stack = stack();
        let service = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("public.ecr.aws/x/y:latest").with_port(8080),
        )?;
        let outputs = service.outputs();

        let unprovisioned = outputs.resolve(&ProvisionedAttributes::default());
        assert!(unprovisioned.is_err());

        let mut attributes = ProvisionedAttributes::default();
        attributes
            .insert(
                &outputs.arn,
                concat!(
                    "arn:aws:apprunner:us-east-1:123456789012:",
                    "service/api/8fe1e10304f84fd2b0df550fe98a71fa",
                ),
            )
            .insert(&outputs.id, "8fe1e10304f84fd2b0df550fe98a71fa")
            .insert(&outputs.url, "abc123.us-east-1.awsapprunner.com")
            .insert(&outputs.status, "RUNNING");

        let resolved = outputs.resolve(&attributes)?;

        assert!(resolved.arn.is_resolved());
        assert_eq!(resolved.id, "8fe1e10304f84fd2b0df550fe98a71fa");
        assert_eq!(resolved.url, "abc123.us-east-1.awsapprunner.com");
        assert_eq!(resolved.status, "RUNNING");

        let template = stack.synthesize(&[&service])?;
        let url = template
            .output(&format!("{}ServiceUrl", service.service().logical_id()))
            .ok_or("url output not rendered")?;
        assert_eq!(url.value(), &json!({ "Fn::Sub": outputs.url.to_string() }));
        Ok(())
    }

    #[test]
    fn it_pulls_private_images_with_the_access_role() -> TestResult {
        let mut stack = stack();
        let service = ImageService::new(
            &mut stack,
            "Worker",
            ImageServiceProps::new("123456789012.dkr.ecr.us-east-1.amazonaws.com/worker:v2")
                .with_auto_deployments(true)
                .with_start_command("./worker --queue jobs")
                .with_environment("QUEUE", "jobs")
                .with_instance("1 vCPU", "2 GB"),
        )?;

        let template = stack.synthesize(&[&service])?;
        let declaration = template
            .resource(service.service().logical_id())
            .ok_or("service not rendered")?;
        let properties = declaration.properties();

        assert_eq!(
            properties["SourceConfiguration"]["AuthenticationConfiguration"],
            json!({
                "AccessRoleArn": {
                    "Fn::Sub": format!("${{{}.Arn}}", service.access_role().logical_id())
                }
            })
        );
        assert_eq!(
            properties["SourceConfiguration"]["ImageRepository"]["ImageConfiguration"],
            json!({
                "StartCommand": "./worker --queue jobs",
                "RuntimeEnvironmentVariables": [{ "Name": "QUEUE", "Value": "jobs" }],
            })
        );
        assert_eq!(properties["SourceConfiguration"]["AutoDeploymentsEnabled"], json!(true));
        assert_eq!(
            properties["InstanceConfiguration"],
            json!({ "Cpu": "1 vCPU", "Memory": "2 GB" })
        );
        Ok(())
    }

    #[test]
    fn it_grants_read_on_the_service_and_its_operations() -> TestResult {
        let mut stack = stack();
        let service = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("public.ecr.aws/x/y:latest").named("api"),
        )?;
        let mut observer = PolicyHolder::new("Observer");

        let receipt = service.grant_read(&mut observer)?;

        let mut actions = receipt.actions().to_vec();
        actions.sort();
        assert_eq!(
            actions,
            vec![
                "apprunner:DescribeCustomDomains",
                "apprunner:DescribeService",
                "apprunner:ListOperations",
            ]
        );
        assert_eq!(
            receipt.resources()[0].as_str(),
            "arn:aws:apprunner:us-east-1:123456789012:service/api/*"
        );
        Ok(())
    }

    #[test]
    fn it_rejects_unsupported_images_before_declaring_anything() {
        let mut stack = stack();

        let result = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("docker.io/library/nginx:latest"),
        );

        assert!(matches!(
            result,
            Err(ConstructError::InvalidImageIdentifier { .. })
        ));
        assert!(!stack.contains("Api/AccessRole"));
    }

    #[test]
    fn it_rejects_public_auto_deployments_before_declaring_anything() -> TestResult {
        let mut stack = stack();

        let result = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("public.ecr.aws/x/y:latest").with_auto_deployments(true),
        );

        assert!(matches!(
            result,
            Err(ConstructError::InvalidProperty {
                property: "auto_deployments_enabled",
                ..
            })
        ));
        assert!(!stack.contains("Api/AccessRole"));
        assert!(!stack.contains("Api/Service"));

        let service = ImageService::new(
            &mut stack,
            "Api",
            ImageServiceProps::new("public.ecr.aws/x/y:latest"),
        )?;
        assert!(stack.contains("Api/AccessRole"));
        assert!(!service.service().props().auto_deployments_enabled);
        Ok(())
    }
}
