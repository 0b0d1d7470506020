use serde_json::json;
use stratus_identity::Token;

use crate::{ConstructError, ResourceDeclaration, Stack, Synthesize, Template};

/// A principal the edge network uses to read from a private bucket.
#[derive(Debug, Clone)]
pub struct OriginAccessIdentity {
    logical_id: String,
    comment: String,
}

impl OriginAccessIdentity {
    /// Declare an identity at `path`.
    pub fn new(stack: &mut Stack, path: &str) -> Result<Self, ConstructError> {
        let logical_id = stack.allocate(path)?;
        Ok(Self {
            comment: format!("Identity for {path}"),
            logical_id,
        })
    }

    /// The identity's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The identity id, as referenced from an origin.
    pub fn id(&self) -> Token {
        Token::reference(&self.logical_id)
    }

    /// The canonical user bucket policies grant access to.
    pub fn canonical_user_id(&self) -> Token {
        Token::attribute(&self.logical_id, "S3CanonicalUserId")
    }
}

impl Synthesize for OriginAccessIdentity {
    fn synthesize(&self, template: &mut Template) -> Result<(), ConstructError> {
        template.add_resource(
            &self.logical_id,
            ResourceDeclaration::new(
                "AWS::CloudFront::CloudFrontOriginAccessIdentity",
                json!({
                    "CloudFrontOriginAccessIdentityConfig": { "Comment": self.comment },
                }),
            ),
        )
    }
}
