use teamspace_shared::{
    ApiError, CreateProjectInput, CreateTaskInput, Project, Task, TaskStatus, TaskStatusInput,
    UpdateProjectInput, UpdateTaskInput,
};

use crate::api::ProjectsApi;
use crate::api_client::ApiClient;
use crate::query::{QueryClient, QueryKey};
use crate::query_key;

/// Projects, their tasks and their task statuses.
///
/// Project writes invalidate `["projects"]`; task and status writes invalidate
/// the owning `["projects", id]` subtree.
#[derive(Debug, Clone)]
pub struct ProjectQueries {
    api: ProjectsApi,
    cache: QueryClient,
}

impl ProjectQueries {
    pub fn new(client: &ApiClient, cache: &QueryClient) -> Self {
        Self {
            api: client.projects(),
            cache: cache.clone(),
        }
    }

    pub fn all_key() -> QueryKey {
        query_key!["projects"]
    }

    pub fn detail_key(id: &str) -> QueryKey {
        query_key!["projects", id]
    }

    pub fn tasks_key(project_id: &str) -> QueryKey {
        query_key!["projects", project_id, "tasks"]
    }

    pub fn task_key(project_id: &str, task_id: &str) -> QueryKey {
        query_key!["projects", project_id, "tasks", task_id]
    }

    pub fn statuses_key(project_id: &str) -> QueryKey {
        query_key!["projects", project_id, "statuses"]
    }

    // --- Projects ---

    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(&Self::all_key(), move || async move { api.list().await })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Project, ApiError> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .fetch_query(&Self::detail_key(id), move || async move { api.get(&owned).await })
            .await
    }

    pub async fn create(&self, input: &CreateProjectInput) -> Result<Project, ApiError> {
        self.cache
            .mutate(self.api.create(input), &[Self::all_key()])
            .await
    }

    pub async fn update(&self, id: &str, input: &UpdateProjectInput) -> Result<Project, ApiError> {
        self.cache
            .mutate(self.api.update(id, input), &[Self::all_key()])
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete(id), &[Self::all_key()])
            .await
    }

    // --- Tasks ---

    pub async fn tasks(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
        let api = self.api.clone();
        let owned = project_id.to_string();
        self.cache
            .fetch_query(&Self::tasks_key(project_id), move || async move {
                api.list_tasks(&owned).await
            })
            .await
    }

    pub async fn task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        let api = self.api.clone();
        let (project, task) = (project_id.to_string(), task_id.to_string());
        self.cache
            .fetch_query(&Self::task_key(project_id, task_id), move || async move {
                api.get_task(&project, &task).await
            })
            .await
    }

    pub async fn create_task(
        &self,
        project_id: &str,
        input: &CreateTaskInput,
    ) -> Result<Task, ApiError> {
        self.cache
            .mutate(
                self.api.create_task(project_id, input),
                &[Self::detail_key(project_id)],
            )
            .await
    }

    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        input: &UpdateTaskInput,
    ) -> Result<Task, ApiError> {
        self.cache
            .mutate(
                self.api.update_task(project_id, task_id, input),
                &[Self::detail_key(project_id)],
            )
            .await
    }

    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(
                self.api.delete_task(project_id, task_id),
                &[Self::detail_key(project_id)],
            )
            .await
    }

    // --- Task statuses ---

    pub async fn statuses(&self, project_id: &str) -> Result<Vec<TaskStatus>, ApiError> {
        let api = self.api.clone();
        let owned = project_id.to_string();
        self.cache
            .fetch_query(&Self::statuses_key(project_id), move || async move {
                api.list_statuses(&owned).await
            })
            .await
    }

    pub async fn create_status(
        &self,
        project_id: &str,
        input: &TaskStatusInput,
    ) -> Result<TaskStatus, ApiError> {
        self.cache
            .mutate(
                self.api.create_status(project_id, input),
                &[Self::detail_key(project_id)],
            )
            .await
    }

    pub async fn update_status(
        &self,
        project_id: &str,
        status_id: &str,
        input: &TaskStatusInput,
    ) -> Result<TaskStatus, ApiError> {
        self.cache
            .mutate(
                self.api.update_status(project_id, status_id, input),
                &[Self::detail_key(project_id)],
            )
            .await
    }

    pub async fn delete_status(&self, project_id: &str, status_id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(
                self.api.delete_status(project_id, status_id),
                &[Self::detail_key(project_id)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::offline_api;

    #[test]
    fn task_keys_live_under_the_project() {
        let project = ProjectQueries::detail_key("p1");
        assert!(ProjectQueries::tasks_key("p1").starts_with(&project));
        assert!(ProjectQueries::task_key("p1", "t1").starts_with(&project));
        assert!(ProjectQueries::statuses_key("p1").starts_with(&project));
        assert!(!ProjectQueries::tasks_key("p2").starts_with(&project));
    }

    #[tokio::test]
    async fn failed_task_write_keeps_cached_tasks_fresh() {
        let cache = QueryClient::new();
        let projects = ProjectQueries::new(&offline_api(), &cache);
        let key = ProjectQueries::tasks_key("p1");
        cache.set_query_data(&key, Vec::<Task>::new());

        let result = projects
            .create_task(
                "p1",
                &CreateTaskInput {
                    title: "write docs".into(),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ApiError::Network(_))));
        assert!(!cache.is_stale(&key));
        // Served from cache without touching the (unreachable) server.
        assert_eq!(projects.tasks("p1").await.unwrap(), Vec::<Task>::new());
    }
}
