use teamspace_shared::{
    ApiError, CreateProjectInput, CreateTaskInput, Project, Task, TaskStatus, TaskStatusInput,
    UpdateProjectInput, UpdateTaskInput,
};

use super::seg;
use crate::api_client::ApiClient;

/// Projects and the tasks and task statuses nested under them.
#[derive(Debug, Clone)]
pub struct ProjectsApi {
    client: ApiClient,
}

impl ProjectsApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        self.client.get_json("/projects").await
    }

    pub async fn get(&self, id: &str) -> Result<Project, ApiError> {
        self.client.get_json(&format!("/projects/{}", seg(id))).await
    }

    pub async fn create(&self, input: &CreateProjectInput) -> Result<Project, ApiError> {
        self.client.post_json("/projects", input).await
    }

    pub async fn update(&self, id: &str, input: &UpdateProjectInput) -> Result<Project, ApiError> {
        self.client
            .patch_json(&format!("/projects/{}", seg(id)), input)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/projects/{}", seg(id))).await
    }

    // --- Tasks ---

    pub async fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
        self.client
            .get_json(&format!("/projects/{}/tasks", seg(project_id)))
            .await
    }

    pub async fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        self.client
            .get_json(&format!("/projects/{}/tasks/{}", seg(project_id), seg(task_id)))
            .await
    }

    pub async fn create_task(
        &self,
        project_id: &str,
        input: &CreateTaskInput,
    ) -> Result<Task, ApiError> {
        self.client
            .post_json(&format!("/projects/{}/tasks", seg(project_id)), input)
            .await
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> Result<Task, ApiError> {
        self.client
            .patch_json(
                &format!("/projects/{}/tasks/{}", seg(project_id), seg(task_id)),
                input,
            )
            .await
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/projects/{}/tasks/{}", seg(project_id), seg(task_id)))
            .await
    }

    // --- Task statuses ---

    pub async fn list_statuses(&self, project_id: &str) -> Result<Vec<TaskStatus>, ApiError> {
        self.client
            .get_json(&format!("/projects/{}/statuses", seg(project_id)))
            .await
    }

    pub async fn create_status(
        &self,
        project_id: &str,
        input: &TaskStatusInput,
    ) -> Result<TaskStatus, ApiError> {
        self.client
            .post_json(&format!("/projects/{}/statuses", seg(project_id)), input)
            .await
    }

    pub async fn update_status(
        &self,
        project_id: &str,
        status_id: &str,
        input: &TaskStatusInput,
    ) -> Result<TaskStatus, ApiError> {
        self.client
            .patch_json(
                &format!("/projects/{}/statuses/{}", seg(project_id), seg(status_id)),
                input,
            )
            .await
    }

    pub async fn delete_status(&self, project_id: &str, status_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/projects/{}/statuses/{}", seg(project_id), seg(status_id)))
            .await
    }
}
