//! REST client for the remote content API (JSON:API envelopes, bearer auth).

use async_trait::async_trait;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, instrument};
use url::Url;

use super::{AssetRef, Destination, DestinationId, PageRequest, RemoteItem, RemoteUpload};
use crate::error::{MigrateError, Result};
use crate::payload::ItemPayload;

pub const DEFAULT_BASE_URL: &str = "https://site-api.datocms.com";
const API_VERSION: &str = "3";
const JOB_POLL_INTERVAL: Duration = Duration::from_secs(1);
const JOB_POLL_ATTEMPTS: usize = 120;

/// Connection settings for [`CmsClient`]
#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub base_url: String,
    pub api_token: String,
}

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TypedResource {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobResult {
    attributes: JobResultAttributes,
}

#[derive(Debug, Deserialize)]
struct JobResultAttributes {
    status: u16,
    payload: Value,
}

/// Upload creation either finishes inline or hands back a job to wait on
#[derive(Debug, PartialEq)]
enum CreatedUpload {
    Ready(String),
    Pending { job_id: String },
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    id: String,
    attributes: UploadRequestAttributes,
}

#[derive(Debug, Deserialize)]
struct UploadRequestAttributes {
    url: String,
}

/// Client for the content management API
#[derive(Clone)]
pub struct CmsClient {
    http_client: Client,
    base_url: String,
    api_token: String,
}

impl CmsClient {
    pub fn new(settings: &CmsSettings) -> Result<Self> {
        let parsed = Url::parse(&settings.base_url).map_err(|e| {
            MigrateError::Configuration(format!(
                "Invalid content API base url '{}': {}",
                settings.base_url, e
            ))
        })?;

        let http_client = Client::builder()
            .user_agent(concat!("catalog-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrateError::http("build client", e))?;

        Ok(Self {
            http_client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json")
            .header("X-Api-Version", API_VERSION)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MigrateError::http(operation, e))?;
        Self::check(operation, response).await
    }

    async fn check(operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(operation, status = status.as_u16(), "Content API request failed");
        Err(MigrateError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn read<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| MigrateError::MalformedResponse {
                operation: operation.to_string(),
                message: e.to_string(),
            })
    }

    /// Wait for an asynchronous upload job and return the created upload id.
    /// The job result answers 404 until the job has finished.
    async fn await_upload_job(&self, job_id: &str) -> Result<String> {
        let endpoint = self.endpoint(&format!("job-results/{}", job_id));

        for attempt in 1..=JOB_POLL_ATTEMPTS {
            let response = self
                .authorized(self.http_client.get(&endpoint))
                .send()
                .await
                .map_err(|e| MigrateError::http("poll upload job", e))?;

            if response.status() == StatusCode::NOT_FOUND {
                debug!(job_id, attempt, "Upload job still running");
                tokio::time::sleep(JOB_POLL_INTERVAL).await;
                continue;
            }

            let response = Self::check("poll upload job", response).await?;
            let result: Document<JobResult> = Self::read("poll upload job", response).await?;
            return upload_id_from_job(result.data);
        }

        Err(MigrateError::Other(format!(
            "Upload job {} did not finish after {} polls",
            job_id, JOB_POLL_ATTEMPTS
        )))
    }

    fn page_query(page: PageRequest) -> [(&'static str, String); 2] {
        [
            ("page[limit]", page.limit.to_string()),
            ("page[offset]", page.offset.to_string()),
        ]
    }
}

/// Request body creating an item of model `schema_id`
fn item_document(schema_id: &str, attributes: Value) -> Value {
    json!({
        "data": {
            "type": "item",
            "attributes": attributes,
            "relationships": {
                "item_type": {
                    "data": { "type": "item_type", "id": schema_id }
                }
            }
        }
    })
}

fn malformed(operation: &str, message: impl Into<String>) -> MigrateError {
    MigrateError::MalformedResponse {
        operation: operation.to_string(),
        message: message.into(),
    }
}

/// Classify the resource answering `POST /uploads`
fn created_upload(resource: TypedResource) -> Result<CreatedUpload> {
    match resource.kind.as_str() {
        "upload" => Ok(CreatedUpload::Ready(resource.id)),
        "job" => Ok(CreatedUpload::Pending { job_id: resource.id }),
        other => Err(malformed(
            "create upload",
            format!("expected an upload or a job, got '{}'", other),
        )),
    }
}

/// Upload id carried by a finished job, or the error the job ended with
fn upload_id_from_job(result: JobResult) -> Result<String> {
    let JobResultAttributes { status, payload } = result.attributes;
    if !(200..300).contains(&status) {
        return Err(MigrateError::Api {
            operation: "create upload".to_string(),
            status,
            body: payload.to_string(),
        });
    }

    let created: Document<TypedResource> = serde_json::from_value(payload)
        .map_err(|e| malformed("poll upload job", e.to_string()))?;
    match created_upload(created.data)? {
        CreatedUpload::Ready(id) => Ok(id),
        CreatedUpload::Pending { job_id } => Err(malformed(
            "poll upload job",
            format!("job finished with another job '{}'", job_id),
        )),
    }
}

/// Last path segment of an asset URL, used as the upload's file name
fn file_name_from_url(url: &str) -> &str {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
}

#[async_trait]
impl Destination for CmsClient {
    #[instrument(skip(self, payload), fields(kind = %payload.kind()), err)]
    async fn create_item(&self, schema_id: &str, payload: &ItemPayload) -> Result<DestinationId> {
        let attributes = payload
            .to_attributes()
            .map_err(|e| MigrateError::Other(format!("Failed to encode {} payload: {}", payload.kind(), e)))?;

        let request = self
            .authorized(self.http_client.post(self.endpoint("items")))
            .json(&item_document(schema_id, attributes));

        let response = self.send("create item", request).await?;
        let created: Document<ResourceId> = Self::read("create item", response).await?;
        debug!(id = %created.data.id, "Item created");

        Ok(DestinationId::new(created.data.id))
    }

    async fn list_items(&self, schema_id: &str, page: PageRequest) -> Result<Vec<RemoteItem>> {
        let request = self
            .authorized(self.http_client.get(self.endpoint("items")))
            .query(&[("filter[type]", schema_id)])
            .query(&Self::page_query(page));

        let response = self.send("list items", request).await?;
        let listed: Document<Vec<ResourceId>> = Self::read("list items", response).await?;

        Ok(listed
            .data
            .into_iter()
            .map(|item| RemoteItem { id: DestinationId::new(item.id) })
            .collect())
    }

    async fn delete_item(&self, id: &DestinationId) -> Result<()> {
        let request = self.authorized(
            self.http_client
                .delete(self.endpoint(&format!("items/{}", id))),
        );
        self.send("delete item", request).await?;
        Ok(())
    }

    async fn list_uploads(&self, filter_type: &str, page: PageRequest) -> Result<Vec<RemoteUpload>> {
        let request = self
            .authorized(self.http_client.get(self.endpoint("uploads")))
            .query(&[("filter[type]", filter_type)])
            .query(&Self::page_query(page));

        let response = self.send("list uploads", request).await?;
        let listed: Document<Vec<ResourceId>> = Self::read("list uploads", response).await?;

        Ok(listed
            .data
            .into_iter()
            .map(|upload| RemoteUpload { id: upload.id })
            .collect())
    }

    async fn delete_upload(&self, id: &str) -> Result<()> {
        let request = self.authorized(
            self.http_client
                .delete(self.endpoint(&format!("uploads/{}", id))),
        );
        self.send("delete upload", request).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn upload_image(&self, url: &str) -> Result<AssetRef> {
        let image = self
            .send("download image", self.http_client.get(url))
            .await?
            .bytes()
            .await
            .map_err(|e| MigrateError::http("download image", e))?;

        // Reserve a storage slot, push the bytes there, then register the upload
        let slot_request = self
            .authorized(self.http_client.post(self.endpoint("upload-requests")))
            .json(&json!({
                "data": {
                    "type": "upload_request",
                    "attributes": { "filename": file_name_from_url(url) }
                }
            }));
        let response = self.send("request upload slot", slot_request).await?;
        let slot: Document<UploadRequest> = Self::read("request upload slot", response).await?;

        self.send(
            "store image",
            self.http_client.put(&slot.data.attributes.url).body(image),
        )
        .await?;

        let register = self
            .authorized(self.http_client.post(self.endpoint("uploads")))
            .json(&json!({
                "data": {
                    "type": "upload",
                    "attributes": { "path": slot.data.id }
                }
            }));
        let response = self.send("create upload", register).await?;
        let created: Document<TypedResource> = Self::read("create upload", response).await?;
        let upload_id = match created_upload(created.data)? {
            CreatedUpload::Ready(id) => id,
            CreatedUpload::Pending { job_id } => self.await_upload_job(&job_id).await?,
        };
        debug!(upload_id = %upload_id, "Image uploaded");

        Ok(AssetRef { upload_id })
    }
}
