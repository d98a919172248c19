use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A task as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Partial update; absent fields are left unchanged by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Substring filter for listing. The service applies `title` when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl ClientError {
    /// Status code of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
        }
    }
}

pub struct TaskClient {
    client: Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List tasks, optionally filtered.
    pub async fn list_tasks(&self, query: Option<&TaskQuery>) -> Result<Vec<Task>, ClientError> {
        let mut request = self.client.get(self.url("/tasks"));
        if let Some(query) = query {
            request = request.query(query);
        }
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let resp = self.client.post(self.url("/tasks")).json(task).send().await?;
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn update_task(&self, id: Uuid, update: &TaskUpdate) -> Result<(), ClientError> {
        let resp = self
            .client
            .put(self.url(&format!("/tasks/{id}")))
            .json(update)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Toggle the completion state of a task.
    pub async fn complete_task(&self, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .client
            .patch(self.url(&format!("/tasks/{id}/complete")))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = TaskClient::new("http://localhost:3333/");
        assert_eq!(client.base_url(), "http://localhost:3333");
        assert_eq!(client.url("/tasks"), "http://localhost:3333/tasks");
    }

    #[test]
    fn test_update_omits_absent_fields() {
        let update = TaskUpdate {
            title: Some("New".into()),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "title": "New" })
        );
    }

    #[test]
    fn test_task_deserializes_service_shape() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "0b9c7f4e-6f0a-4c55-9a43-2b1f0f2f6a11",
            "title": "Write docs",
            "description": "README",
            "completed_at": null,
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(task.title, "Write docs");
        assert!(task.completed_at.is_none());
    }
}
