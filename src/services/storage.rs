use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::StorageConfig, errors::ServiceError};

/// Metadata of one stored blob.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredObject {
    /// Publicly reachable URL of the object
    pub url: String,
    /// Key to pass back for deletion
    pub key: String,
}

/// File store backed by an S3-compatible HTTP endpoint. Objects are
/// opaque blobs; only upload and delete are supported.
#[derive(Clone)]
pub struct StorageService {
    http: reqwest::Client,
    config: StorageConfig,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Uploads a blob under a collision-free key derived from the
    /// original filename.
    #[instrument(skip(self, bytes), fields(filename = %filename, size = bytes.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredObject, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "uploaded file is empty".to_string(),
            ));
        }

        let key = format!("{}-{}", Uuid::new_v4().simple(), sanitize_filename(filename));
        let target = self.object_url(&key);

        let mut request = self
            .http
            .put(&target)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("object store unreachable: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "object store rejected upload with status {}",
                response.status()
            )));
        }

        info!(%key, "file uploaded");
        Ok(StoredObject {
            url: self.public_url(&key),
            key,
        })
    }

    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let target = self.object_url(key);

        let mut request = self.http.delete(&target);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("object store unreachable: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "object store rejected delete with status {}",
                response.status()
            )));
        }

        info!(%key, "file deleted");
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket,
            key
        )
    }

    fn public_url(&self, key: &str) -> String {
        match &self.config.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.object_url(key),
        }
    }
}

/// Keeps alphanumerics, dots, dashes and underscores; everything else
/// becomes a dash so keys stay URL-safe.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("cover.png"), "cover.png");
        assert_eq!(sanitize_filename("mi portada (1).png"), "mi-portada--1-.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn object_urls_join_cleanly() {
        let service = StorageService::new(StorageConfig {
            endpoint: "https://s3.example.com/".to_string(),
            bucket: "covers".to_string(),
            access_token: None,
            public_base_url: Some("https://cdn.example.com".to_string()),
        });
        assert_eq!(
            service.object_url("abc-cover.png"),
            "https://s3.example.com/covers/abc-cover.png"
        );
        assert_eq!(
            service.public_url("abc-cover.png"),
            "https://cdn.example.com/abc-cover.png"
        );
    }
}
