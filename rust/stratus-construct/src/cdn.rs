use stratus_policy::{Grant, GrantError, Principal};
use tracing::info;

use crate::{
    Behavior, Bucket, BucketProps, ConstructError, DeletionPolicy, Distribution, DistributionProps,
    OriginAccessIdentity, PolicyPrincipal, PriceClass, S3OriginSource, SourceConfiguration, Stack,
    Synthesize, Template, child_path,
};

const ORIGIN_READ_ACTION: &str = "s3:GetObject";

/// Properties of a [`Cdn`].
#[derive(Debug, Clone, Default)]
pub struct CdnProps {
    /// Physical name of the source bucket. Generated when `None`.
    pub bucket_name: Option<String>,
    /// Edge locations to serve from.
    pub price_class: PriceClass,
    /// What happens to the source bucket on teardown.
    pub deletion_policy: DeletionPolicy,
    /// Free-form distribution comment.
    pub comment: Option<String>,
}

/// A private bucket served through an edge distribution.
///
/// The bucket is readable only by the distribution's origin access
/// identity. The distribution has exactly one (catch-all) behavior and
/// serves `index.html` for the root path.
#[derive(Debug, Clone)]
pub struct Cdn {
    source: Bucket,
    origin_access_identity: OriginAccessIdentity,
    distribution: Distribution,
}

impl Cdn {
    /// Declare the bucket, origin access identity and distribution below
    /// `id`.
    pub fn new(stack: &mut Stack, id: &str, props: CdnProps) -> Result<Self, ConstructError> {
        let mut source = Bucket::new(
            stack,
            &child_path(id, "Source"),
            BucketProps {
                bucket_name: props.bucket_name,
                deletion_policy: props.deletion_policy,
            },
        )?;
        let origin_access_identity =
            OriginAccessIdentity::new(stack, &child_path(id, "OriginAccessIdentity"))?;

        let objects = source.objects_arn();
        source.add_to_resource_policy(
            PolicyPrincipal::CanonicalUser(origin_access_identity.canonical_user_id().to_string()),
            [ORIGIN_READ_ACTION],
            vec![objects],
        )?;

        let distribution = Distribution::new(
            stack,
            &child_path(id, "Distribution"),
            DistributionProps {
                origin_configs: vec![SourceConfiguration {
                    origin: S3OriginSource {
                        domain_name: source.regional_domain_name().to_string(),
                        origin_access_identity: Some(origin_access_identity.id().to_string()),
                    },
                    behaviors: vec![Behavior::default_behavior()],
                }],
                price_class: props.price_class,
                comment: props.comment,
            },
        )?;

        info!(
            cdn = id,
            bucket = source.logical_id(),
            distribution = distribution.logical_id(),
            guarded = source.guard().is_some(),
            "declared cdn"
        );
        Ok(Self {
            source,
            origin_access_identity,
            distribution,
        })
    }

    /// The bucket content is served from.
    pub fn source(&self) -> &Bucket {
        &self.source
    }

    /// The identity the distribution reads the bucket as.
    pub fn origin_access_identity(&self) -> &OriginAccessIdentity {
        &self.origin_access_identity
    }

    /// The edge distribution.
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Allow `principal` to invalidate cached content.
    pub fn grant_invalidate(&self, principal: &mut dyn Principal) -> Result<Grant, GrantError> {
        self.distribution.grant_invalidate(principal)
    }
}

impl Synthesize for Cdn {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        self.source.synthesize(template)?;
        self.origin_access_identity.synthesize(template)?;
        self.distribution.synthesize(template)
    }
}
