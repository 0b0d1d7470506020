//! Image repositories through the ListImages and BatchDeleteImage
//! operations of the JSON 1.1 protocol.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stratus_cleanup::{ContentKind, ContentStore, ItemId, ListPage, StoreError};
use tracing::warn;

use crate::{AwsClient, AwsResponse, Request};

const SERVICE: &str = "ecr";
const TARGET_PREFIX: &str = "AmazonEC2ContainerRegistry_V20150921";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Images requested per listing page.
const MAX_RESULTS: u32 = 1000;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageId {
    image_digest: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListImagesResponse {
    #[serde(default)]
    image_ids: Vec<ImageId>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteImageResponse {
    #[serde(default)]
    failures: Vec<ImageFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageFailure {
    failure_code: String,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(rename = "__type")]
    error_type: String,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// A [`ContentStore`] over image repositories. Items are image digests, so
/// deleting one removes every tag pointing at it.
#[derive(Debug, Clone)]
pub struct RepositoryStore {
    client: AwsClient,
}

impl RepositoryStore {
    /// A store sending requests through `client`.
    pub fn new(client: AwsClient) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        container: &str,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<AwsResponse, StoreError> {
        let request = operation_request(self.client.config().endpoint("api.ecr"), operation, &body);
        let response = self
            .client
            .send(SERVICE, request)
            .await
            .map_err(|error| StoreError::Unavailable {
                container: container.to_string(),
                reason: error.to_string(),
            })?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(classify(container, operation, &response))
        }
    }
}

#[async_trait]
impl ContentStore for RepositoryStore {
    fn kind(&self) -> ContentKind {
        ContentKind::Repository
    }

    async fn list(&self, container: &str, token: Option<&str>) -> Result<ListPage, StoreError> {
        let response = self
            .call(container, "ListImages", list_body(container, token))
            .await?;
        parse_list_response(container, &response.body)
    }

    async fn delete(&self, container: &str, items: &[ItemId]) -> Result<(), StoreError> {
        let response = self
            .call(container, "BatchDeleteImage", delete_body(container, items))
            .await?;
        parse_delete_response(container, &response.body)
    }
}

fn operation_request(host: String, operation: &str, body: &serde_json::Value) -> Request {
    Request::new(Method::POST, host, "/")
        .with_header("content-type", CONTENT_TYPE)
        .with_header("x-amz-target", format!("{TARGET_PREFIX}.{operation}"))
        .with_body(body.to_string())
}

fn list_body(repository: &str, token: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "repositoryName": repository,
        "maxResults": MAX_RESULTS,
    });
    if let Some(token) = token {
        body["nextToken"] = json!(token);
    }
    body
}

fn delete_body(repository: &str, items: &[ItemId]) -> serde_json::Value {
    let image_ids: Vec<ImageId> = items
        .iter()
        .map(|item| ImageId {
            image_digest: item.to_string(),
        })
        .collect();
    json!({
        "repositoryName": repository,
        "imageIds": image_ids,
    })
}

/// One entry per digest: an image with several tags is listed once per tag.
fn parse_list_response(container: &str, body: &str) -> Result<ListPage, StoreError> {
    let response: ListImagesResponse =
        serde_json::from_str(body).map_err(|error| StoreError::Unavailable {
            container: container.to_string(),
            reason: format!("unreadable listing: {error}"),
        })?;

    let mut seen = HashSet::new();
    let items = response
        .image_ids
        .into_iter()
        .filter(|image| seen.insert(image.image_digest.clone()))
        .map(|image| ItemId::new(image.image_digest))
        .collect();

    Ok(ListPage {
        items,
        next_token: response.next_token,
    })
}

fn parse_delete_response(container: &str, body: &str) -> Result<(), StoreError> {
    let response: BatchDeleteImageResponse =
        serde_json::from_str(body).map_err(|error| StoreError::Unavailable {
            container: container.to_string(),
            reason: format!("unreadable deletion result: {error}"),
        })?;

    let failures: Vec<ImageFailure> = response
        .failures
        .into_iter()
        .filter(|failure| failure.failure_code != "ImageNotFound")
        .collect();
    let Some(first) = failures.first() else {
        return Ok(());
    };

    warn!(
        container,
        code = %first.failure_code,
        failed = failures.len(),
        "images were not deleted"
    );
    Err(StoreError::Unavailable {
        container: container.to_string(),
        reason: format!(
            "{}: {} ({} failed)",
            first.failure_code,
            first.failure_reason.as_deref().unwrap_or_default(),
            failures.len()
        ),
    })
}

fn classify(container: &str, operation: &str, response: &AwsResponse) -> StoreError {
    let document = serde_json::from_str::<ErrorDocument>(&response.body).ok();
    let error_type = document.as_ref().map_or("", |document| {
        document
            .error_type
            .rsplit_once('#')
            .map_or(document.error_type.as_str(), |(_, name)| name)
    });

    match error_type {
        "RepositoryNotFoundException" => StoreError::NotFound(container.to_string()),
        "AccessDeniedException" => StoreError::AccessDenied {
            container: container.to_string(),
            operation: operation.to_string(),
        },
        _ if response.status == 403 => StoreError::AccessDenied {
            container: container.to_string(),
            operation: operation.to_string(),
        },
        "" => StoreError::Unavailable {
            container: container.to_string(),
            reason: format!("HTTP {}", response.status),
        },
        name => StoreError::Unavailable {
            container: container.to_string(),
            reason: format!(
                "{name}: {}",
                document
                    .as_ref()
                    .and_then(|document| document.message.as_deref())
                    .unwrap_or_default()
            ),
        },
    }
}
