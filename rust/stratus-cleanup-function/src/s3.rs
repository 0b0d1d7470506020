//! Object storage through the ListObjectsV2 and DeleteObjects operations.
//!
//! Both exchange XML. Listing pages carry a continuation token while more
//! keys remain; deletion is quiet, so the response only names failures.

use async_trait::async_trait;
use base64::Engine;
use quick_xml::escape::escape;
use reqwest::Method;
use serde::Deserialize;
use stratus_cleanup::{ContentKind, ContentStore, ItemId, ListPage, StoreError};
use tracing::warn;

use crate::{AwsClient, AwsResponse, Request};

const SERVICE: &str = "s3";

/// Keys requested per listing page.
const MAX_KEYS: &str = "1000";

#[derive(Debug, Deserialize)]
#[serde(rename = "ListBucketResult")]
struct ListBucketResult {
    #[serde(rename = "Contents", default)]
    contents: Vec<Contents>,
    #[serde(rename = "NextContinuationToken")]
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contents {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Error")]
struct ErrorDocument {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "DeleteResult")]
struct DeleteResult {
    #[serde(rename = "Error", default)]
    errors: Vec<DeleteFailure>,
}

#[derive(Debug, Deserialize)]
struct DeleteFailure {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

/// A [`ContentStore`] over buckets, addressed virtual-host style.
#[derive(Debug, Clone)]
pub struct BucketStore {
    client: AwsClient,
}

impl BucketStore {
    /// A store sending requests through `client`.
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }

    fn host(&self, bucket: &str) -> String {
        format!("{bucket}.{}", self.client.config().endpoint(SERVICE))
    }
}

#[async_trait]
impl ContentStore for BucketStore {
    fn kind(&self) -> ContentKind {
        ContentKind::Bucket
    }

    async fn list(&self, container: &str, token: Option<&str>) -> Result<ListPage, StoreError> {
        let request = list_request(self.host(container), token);
        let response = self
            .client
            .send(SERVICE, request)
            .await
            .map_err(|error| unavailable(container, error))?;

        if !response.is_success() {
            return Err(classify(container, "list", &response));
        }
        parse_list_response(container, &response.body)
    }

    async fn delete(&self, container: &str, items: &[ItemId]) -> Result<(), StoreError> {
        let request = delete_request(self.host(container), items);
        let response = self
            .client
            .send(SERVICE, request)
            .await
            .map_err(|error| unavailable(container, error))?;

        if !response.is_success() {
            return Err(classify(container, "delete", &response));
        }
        parse_delete_response(container, &response.body)
    }
}

fn list_request(host: String, token: Option<&str>) -> Request {
    let request = Request::new(Method::GET, host, "/")
        .with_query("list-type", "2")
        .with_query("max-keys", MAX_KEYS);
    match token {
        Some(token) => request.with_query("continuation-token", token),
        None => request,
    }
}

fn delete_request(host: String, items: &[ItemId]) -> Request {
    let body = delete_body(items);
    let checksum = base64::engine::general_purpose::STANDARD.encode(md5::compute(&body).0);

    Request::new(Method::POST, host, "/")
        .with_query("delete", "")
        .with_header("content-md5", checksum)
        .with_header("content-type", "application/xml")
        .with_body(body)
}

fn delete_body(items: &[ItemId]) -> String {
    let objects: String = items
        .iter()
        .map(|item| format!("<Object><Key>{}</Key></Object>", escape(item.as_str())))
        .collect();
    format!("<Delete><Quiet>true</Quiet>{objects}</Delete>")
}

fn parse_list_response(container: &str, xml: &str) -> Result<ListPage, StoreError> {
    if !xml.contains("<ListBucketResult") {
        return Err(StoreError::Unavailable {
            container: container.to_string(),
            reason: "unexpected listing document".into(),
        });
    }
    let result: ListBucketResult =
        quick_xml::de::from_str(xml).map_err(|error| StoreError::Unavailable {
            container: container.to_string(),
            reason: format!("unreadable listing: {error}"),
        })?;

    Ok(ListPage {
        items: result
            .contents
            .into_iter()
            .map(|contents| ItemId::new(contents.key))
            .collect(),
        next_token: result.next_continuation_token,
    })
}

fn parse_delete_response(container: &str, xml: &str) -> Result<(), StoreError> {
    if xml.trim().is_empty() {
        return Ok(());
    }
    let result: DeleteResult =
        quick_xml::de::from_str(xml).map_err(|error| StoreError::Unavailable {
            container: container.to_string(),
            reason: format!("unreadable deletion result: {error}"),
        })?;

    let mut failures = result
        .errors
        .into_iter()
        .filter(|failure| failure.code != "NoSuchKey");
    let Some(first) = failures.next() else {
        return Ok(());
    };
    let remaining = failures.count();
    warn!(
        container,
        key = %first.key,
        code = %first.code,
        remaining,
        "objects were not deleted"
    );

    if first.code == "AccessDenied" {
        return Err(StoreError::AccessDenied {
            container: container.to_string(),
            operation: "delete".into(),
        });
    }
    Err(StoreError::Unavailable {
        container: container.to_string(),
        reason: format!(
            "{}: {} ({} more failed)",
            first.code,
            first.message.unwrap_or_default(),
            remaining
        ),
    })
}

fn classify(container: &str, operation: &str, response: &AwsResponse) -> StoreError {
    let document = quick_xml::de::from_str::<ErrorDocument>(&response.body).ok();
    let code = document
        .as_ref()
        .map_or("", |document| document.code.as_str());

    if code == "NoSuchBucket" || (response.status == 404 && document.is_none()) {
        return StoreError::NotFound(container.to_string());
    }
    if code == "AccessDenied" || response.status == 403 {
        return StoreError::AccessDenied {
            container: container.to_string(),
            operation: operation.to_string(),
        };
    }

    let reason = match document {
        Some(document) => format!(
            "{}: {}",
            document.code,
            document.message.unwrap_or_default()
        ),
        None => format!("HTTP {}", response.status),
    };
    StoreError::Unavailable {
        container: container.to_string(),
        reason,
    }
}

fn unavailable(container: &str, error: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        container: container.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn response(status: u16, body: &str) -> AwsResponse {
        AwsResponse {
            status,
            headers: Default::default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn it_parses_a_truncated_listing() -> TestResult {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
                <Name>site</Name>
                <IsTruncated>true</IsTruncated>
                <Contents><Key>index.html</Key><Size>120</Size></Contents>
                <Contents><Key>assets/app.js</Key><Size>4096</Size></Contents>
                <NextContinuationToken>1ueGcxLPRx1Tr/XYExHnhbYLg=</NextContinuationToken>
            </ListBucketResult>"#;

        let page = parse_list_response("site", xml)?;

        assert_eq!(
            page.items,
            vec![ItemId::from("index.html"), ItemId::from("assets/app.js")]
        );
        assert_eq!(
            page.next_token.as_deref(),
            Some("1ueGcxLPRx1Tr/XYExHnhbYLg=")
        );
        Ok(())
    }

    #[test]
    fn it_parses_the_last_page_of_a_listing() -> TestResult {
        let xml = r#"<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>"#;

        let page = parse_list_response("site", xml)?;

        assert!(page.items.is_empty());
        assert_eq!(page.next_token, None);
        Ok(())
    }

    #[test]
    fn it_continues_listings_from_the_token() {
        let request = list_request("site.s3.us-east-1.amazonaws.com".into(), Some("abc/="));

        assert_eq!(
            request.canonical_query(),
            "continuation-token=abc%2F%3D&list-type=2&max-keys=1000"
        );
    }

    #[test]
    fn it_builds_a_quiet_deletion_with_escaped_keys() {
        let request = delete_request(
            "site.s3.us-east-1.amazonaws.com".into(),
            &[ItemId::from("a&b.txt"), ItemId::from("c.txt")],
        );

        assert_eq!(
            String::from_utf8_lossy(&request.body),
            "<Delete><Quiet>true</Quiet>\
             <Object><Key>a&amp;b.txt</Key></Object>\
             <Object><Key>c.txt</Key></Object></Delete>"
        );
        assert_eq!(request.canonical_query(), "delete=");
        assert!(
            request
                .headers
                .iter()
                .any(|(name, value)| name == "content-md5" && value.len() == 24)
        );
    }

    #[test]
    fn it_maps_error_documents() {
        let missing = response(
            404,
            "<Error><Code>NoSuchBucket</Code><Message>gone</Message></Error>",
        );
        let denied = response(
            403,
            "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
        );
        let throttled = response(
            503,
            "<Error><Code>SlowDown</Code><Message>Reduce your request rate</Message></Error>",
        );

        assert_eq!(
            classify("site", "list", &missing),
            StoreError::NotFound("site".into())
        );
        assert!(matches!(
            classify("site", "list", &denied),
            StoreError::AccessDenied { .. }
        ));
        assert_eq!(
            classify("site", "delete", &throttled),
            StoreError::Unavailable {
                container: "site".into(),
                reason: "SlowDown: Reduce your request rate".into(),
            }
        );
    }

    #[test]
    fn it_reports_objects_that_were_not_deleted() {
        let clean = "<DeleteResult></DeleteResult>";
        let denied = r#"<DeleteResult>
                <Error><Key>a.txt</Key><Code>AccessDenied</Code></Error>
            </DeleteResult>"#;
        let internal = r#"<DeleteResult>
                <Error><Key>a.txt</Key><Code>InternalError</Code><Message>retry</Message></Error>
                <Error><Key>b.txt</Key><Code>InternalError</Code><Message>retry</Message></Error>
            </DeleteResult>"#;

        assert_eq!(parse_delete_response("site", clean), Ok(()));
        assert_eq!(parse_delete_response("site", ""), Ok(()));
        assert!(matches!(
            parse_delete_response("site", denied),
            Err(StoreError::AccessDenied { .. })
        ));
        assert_eq!(
            parse_delete_response("site", internal),
            Err(StoreError::Unavailable {
                container: "site".into(),
                reason: "InternalError: retry (1 more failed)".into(),
            })
        );
    }
}
