//! HTTP access to the analysis server.

use crate::config::ClientConfig;
use crate::job::error::{ApiError, ApiResult};
use crate::job::types::{
    AnalysisResult, ArtifactKind, Envelope, JobHandle, SelectedFile, ServerHealth,
    StatusSnapshot, UploadResponse,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Server operations the job client depends on.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> ApiResult<JobHandle>;

    async fn status(&self, handle: &JobHandle) -> ApiResult<StatusSnapshot>;

    async fn results(&self, handle: &JobHandle) -> ApiResult<AnalysisResult>;

    /// Ask the server to delete the task's files. Returns the server message.
    async fn cleanup(&self, handle: &JobHandle) -> ApiResult<String>;

    async fn health(&self) -> ApiResult<ServerHealth>;

    fn download_url(&self, kind: ArtifactKind, handle: &JobHandle) -> String;
}

#[derive(Clone)]
pub struct HttpJobApi {
    http: Client,
    base_url: String,
    /// Applied to everything except uploads, which keep the client-wide timeout.
    short_timeout: Duration,
}

impl HttpJobApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            short_timeout: config.status_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn upload(&self, file: &SelectedFile) -> ApiResult<JobHandle> {
        let handle = tokio::fs::File::open(&file.path).await?;
        let length = handle.metadata().await?.len();
        let mime = file
            .mime
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let part = Part::stream_with_length(Body::from(handle), length)
            .file_name(file.name.clone())
            .mime_str(&mime)?;
        let form = Form::new().part("video", part);

        let url = self.url("/upload");
        debug!("Uploading {} ({} bytes) to {}", file.name, length, url);

        let response = self.http.post(&url).multipart(form).send().await?;
        let upload: UploadResponse = decode(response).await?;

        if !upload.success {
            return Err(ApiError::Rejected(
                upload
                    .message
                    .unwrap_or_else(|| "Upload rejected by server".to_string()),
            ));
        }

        match upload.task_id {
            Some(id) if !id.is_empty() => Ok(JobHandle::new(id)),
            _ => Err(ApiError::InvalidResponse(
                "upload response has no task_id".to_string(),
            )),
        }
    }

    async fn status(&self, handle: &JobHandle) -> ApiResult<StatusSnapshot> {
        let url = self.url(&format!("/status/{}", handle));
        let response = self
            .http
            .get(&url)
            .timeout(self.short_timeout)
            .send()
            .await?;
        open_envelope(decode(response).await?, "status")
    }

    async fn results(&self, handle: &JobHandle) -> ApiResult<AnalysisResult> {
        let url = self.url(&format!("/results/{}", handle));
        let response = self
            .http
            .get(&url)
            .timeout(self.short_timeout)
            .send()
            .await?;
        open_envelope(decode(response).await?, "results")
    }

    async fn cleanup(&self, handle: &JobHandle) -> ApiResult<String> {
        let url = self.url(&format!("/cleanup/{}", handle));
        let response = self
            .http
            .delete(&url)
            .timeout(self.short_timeout)
            .send()
            .await?;
        let ack: Envelope<serde_json::Value> = decode(response).await?;

        if ack.success {
            Ok(ack
                .message
                .unwrap_or_else(|| "Task cleaned up".to_string()))
        } else {
            Err(ApiError::Rejected(
                ack.message.unwrap_or_else(|| "Cleanup rejected".to_string()),
            ))
        }
    }

    async fn health(&self) -> ApiResult<ServerHealth> {
        let response = self
            .http
            .get(self.url("/health"))
            .timeout(self.short_timeout)
            .send()
            .await?;
        decode(response).await
    }

    fn download_url(&self, kind: ArtifactKind, handle: &JobHandle) -> String {
        self.url(&format!("/download/{}/{}", kind.path_segment(), handle))
    }
}

/// The server answers JSON on most error paths too, so the body is parsed before
/// the HTTP status is consulted.
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => {
            warn!("Server returned {} with unparseable body", status);
            Err(ApiError::Status {
                code: status.as_u16(),
                body,
            })
        }
        Err(e) => Err(ApiError::InvalidResponse(e.to_string())),
    }
}

fn open_envelope<T>(envelope: Envelope<T>, what: &str) -> ApiResult<T> {
    if !envelope.success {
        return Err(ApiError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| format!("{} request rejected", what)),
        ));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::InvalidResponse(format!("{} response has no data", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::types::JobStatus;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> HttpJobApi {
        let config = ClientConfig {
            base_url: format!("{}/", server.uri()),
            ..ClientConfig::default()
        };
        HttpJobApi::new(&config).unwrap()
    }

    fn video_on_disk(dir: &tempfile::TempDir) -> SelectedFile {
        let path = dir.path().join("demo.mp4");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"not really a video").unwrap();
        SelectedFile::new("demo.mp4", path, 18, Some("video/mp4"))
    }

    #[tokio::test]
    async fn test_upload_returns_task_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "task_id": "abc123",
                "message": "Video uploaded and analysis started"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let handle = api_for(&server).upload(&video_on_disk(&dir)).await.unwrap();
        assert_eq!(handle.as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_upload_rejection_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "No video file provided"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = api_for(&server)
            .upload(&video_on_disk(&dir))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No video file provided");
    }

    #[tokio::test]
    async fn test_upload_without_task_id_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = api_for(&server)
            .upload(&video_on_disk(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let server = MockServer::start().await;
        let missing = SelectedFile::new("gone.mp4", "/definitely/not/here.mp4", 1, None);
        let err = api_for(&server).upload(&missing).await.unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }

    #[tokio::test]
    async fn test_status_parses_completed_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "status": "completed",
                    "progress": 100.0,
                    "message": "Video analysis completed successfully!",
                    "result": {
                        "success": true,
                        "stats": {
                            "total_frames": 300,
                            "processed_frames": 300,
                            "total_alarms": 2,
                            "max_danger_level": 5
                        },
                        "files": { "analyzed_video": "out.mp4", "database": "out.db" }
                    }
                }
            })))
            .mount(&server)
            .await;

        let snapshot = api_for(&server)
            .status(&JobHandle::new("abc123"))
            .await
            .unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        let stats = snapshot.result.unwrap().stats;
        assert_eq!(stats.total_alarms, 2);
        assert_eq!(stats.max_danger_level, 5);
    }

    #[tokio::test]
    async fn test_status_unknown_task_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Task not found"
            })))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .status(&JobHandle::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Task not found"));
    }

    #[tokio::test]
    async fn test_status_failure_without_data_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Task is being cleaned up"
            })))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .status(&JobHandle::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Task is being cleaned up"));
    }

    #[tokio::test]
    async fn test_status_success_without_data_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .status(&JobHandle::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_stalled_status_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": { "status": "processing" } }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig {
            base_url: server.uri(),
            status_timeout: Duration::from_millis(200),
            ..ClientConfig::default()
        };
        let err = HttpJobApi::new(&config)
            .unwrap()
            .status(&JobHandle::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_status_html_error_page_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/abc123"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .status(&JobHandle::new("abc123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { code: 502, .. }));
    }

    #[tokio::test]
    async fn test_results_and_cleanup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/results/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "stats": { "processed_frames": 12, "total_alarms": 1 } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/cleanup/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Task cleaned up successfully"
            })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let handle = JobHandle::new("abc123");
        let result = api.results(&handle).await.unwrap();
        assert_eq!(result.stats.processed_frames, 12);
        assert_eq!(result.stats.max_danger_level, 0);
        assert_eq!(
            api.cleanup(&handle).await.unwrap(),
            "Task cleaned up successfully"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy",
                "timestamp": "2026-10-18T10:00:00",
                "active_tasks": 3
            })))
            .mount(&server)
            .await;

        let health = api_for(&server).health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.active_tasks, 3);
    }

    #[test]
    fn test_download_url_trims_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://analysis.local:5000/".to_string(),
            ..ClientConfig::default()
        };
        let api = HttpJobApi::new(&config).unwrap();
        assert_eq!(
            api.download_url(ArtifactKind::Database, &JobHandle::new("abc123")),
            "http://analysis.local:5000/download/database/abc123"
        );
    }
}
