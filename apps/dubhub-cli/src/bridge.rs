//! Bridge between `ApiClient` and the upload crate's `StatusSource` trait.

use std::future::Future;
use std::pin::Pin;

use dubhub_api::ApiClient;
use dubhub_protocol::JobStatus;
use dubhub_upload::{StatusSource, UploadError};

/// Answers status polls with `GET /translate/status/{id}`.
pub struct ApiStatusSource<'a> {
    client: &'a ApiClient,
}

impl<'a> ApiStatusSource<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl StatusSource for ApiStatusSource<'_> {
    fn job_status(
        &self,
        project_id: u64,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, UploadError>> + Send + '_>> {
        Box::pin(async move {
            self.client
                .translation_status(project_id)
                .await
                .map(|report| report.status)
                .map_err(|e| UploadError::Status(e.to_string()))
        })
    }
}
