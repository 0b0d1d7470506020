use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// A value that is only known once a resource has been provisioned.
///
/// Renders as `${LogicalId}` (the resource's primary reference) or
/// `${LogicalId.Attribute}` (one of its attributes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    logical_id: String,
    attribute: Option<String>,
}

impl Token {
    /// The primary reference of a resource (what `Ref` returns).
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            attribute: None,
        }
    }

    /// A named attribute of a resource (what `Fn::GetAtt` returns).
    pub fn attribute(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Logical id of the resource this token points at.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Attribute name, `None` for a primary reference.
    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// The text between `${` and `}`.
    pub fn key(&self) -> String {
        match &self.attribute {
            Some(attribute) => format!("{}.{}", self.logical_id, attribute),
            None => self.logical_id.clone(),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${{{}}}", self.key())
    }
}

/// Returns true if `value` contains at least one `${...}` placeholder.
pub fn contains_tokens(value: &str) -> bool {
    value.contains("${")
}

/// Values assigned by the platform after provisioning, keyed by token.
///
/// Pseudo references (`AWS::Region`, `AWS::AccountId`, `AWS::Partition`) can
/// be recorded the same way with [`ProvisionedAttributes::insert_pseudo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedAttributes {
    values: BTreeMap<String, String>,
}

impl ProvisionedAttributes {
    /// Record the provisioned value of a token.
    pub fn insert(&mut self, token: &Token, value: impl Into<String>) -> &mut Self {
        self.values.insert(token.key(), value.into());
        self
    }

    /// Record the value of a pseudo reference such as `AWS::Region`.
    pub fn insert_pseudo(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Look up a token.
    pub fn get(&self, token: &Token) -> Option<&str> {
        self.values.get(&token.key()).map(String::as_str)
    }

    /// Substitute every `${...}` placeholder in `template`.
    ///
    /// Fails on the first placeholder without a recorded value.
    pub fn substitute(&self, template: &str) -> Result<String, IdentityError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| IdentityError::UnterminatedToken(template.to_string()))?;
            let key = &after[..end];
            let value = self
                .values
                .get(key)
                .ok_or_else(|| IdentityError::UnresolvedToken {
                    key: key.to_string(),
                })?;
            output.push_str(value);
            rest = &after[end + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_references_and_attributes() {
        assert_eq!(Token::reference("SiteBucket").to_string(), "${SiteBucket}");
        assert_eq!(
            Token::attribute("Service", "ServiceArn").to_string(),
            "${Service.ServiceArn}"
        );
    }

    #[test]
    fn it_substitutes_recorded_values() {
        let mut attributes = ProvisionedAttributes::default();
        attributes
            .insert(&Token::reference("Distribution"), "E2QWRUHAPOMQZL")
            .insert_pseudo("AWS::Partition", "aws");

        let resolved = attributes
            .substitute("arn:${AWS::Partition}:cloudfront::1:distribution/${Distribution}")
            .unwrap();

        assert_eq!(resolved, "arn:aws:cloudfront::1:distribution/E2QWRUHAPOMQZL");
    }

    #[test]
    fn it_reports_missing_values() {
        let attributes = ProvisionedAttributes::default();
        assert_eq!(
            attributes.substitute("x/${Role}"),
            Err(IdentityError::UnresolvedToken { key: "Role".into() })
        );
    }

    #[test]
    fn it_reports_unterminated_tokens() {
        let attributes = ProvisionedAttributes::default();
        assert!(matches!(
            attributes.substitute("x/${Role"),
            Err(IdentityError::UnterminatedToken(_))
        ));
    }
}
