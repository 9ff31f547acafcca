//! Typed calls for datasets, models, trainings and admin endpoints.
//!
//! All of these go through `HttpClient::request`, so they carry the stored
//! bearer token and surface the server's status unchanged.

use std::ops::Deref;

use crate::models::{
    Acknowledgement, Dataset, DatasetCreate, Model, ModelCreate, Training, TrainingCreate,
    UserProfile,
};

use super::{ApiError, HttpClient};

/// Admin routes live under this prefix.
const ADMIN_PREFIX: &str = "/admin";
const ADMIN_SEGMENT: &str = "admin";

/// Resource API on top of an `HttpClient`.
/// Derefs to the underlying client for ad-hoc requests.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl Deref for ApiClient {
    type Target = HttpClient;

    fn deref(&self) -> &HttpClient {
        &self.http
    }
}

impl ApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    // ===== Datasets =====

    pub async fn create_dataset(&self, dataset: &DatasetCreate) -> Result<Dataset, ApiError> {
        self.http.post("/datasets", dataset).await
    }

    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        self.http.get("/datasets").await
    }

    pub async fn get_dataset(&self, dataset_id: i64) -> Result<Dataset, ApiError> {
        self.http.get(&format!("/datasets/{}", dataset_id)).await
    }

    // ===== Models =====

    pub async fn create_model(&self, model: &ModelCreate) -> Result<Model, ApiError> {
        self.http.post("/models", model).await
    }

    pub async fn list_models(&self) -> Result<Vec<Model>, ApiError> {
        self.http.get("/models").await
    }

    pub async fn get_model(&self, model_id: i64) -> Result<Model, ApiError> {
        self.http.get(&format!("/models/{}", model_id)).await
    }

    // ===== Trainings =====

    pub async fn create_training(&self, training: &TrainingCreate) -> Result<Training, ApiError> {
        self.http.post("/trainings", training).await
    }

    pub async fn list_trainings(&self) -> Result<Vec<Training>, ApiError> {
        self.http.get("/trainings").await
    }

    pub async fn get_training(&self, training_id: i64) -> Result<Training, ApiError> {
        self.http.get(&format!("/trainings/{}", training_id)).await
    }

    // ===== Admin =====

    pub async fn admin_list_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.http.get(&format!("{}/users", ADMIN_PREFIX)).await
    }

    pub async fn admin_delete_user(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        let path = self
            .http
            .config()
            .path_from_segments(&[ADMIN_SEGMENT, "users", "delete", email])?;
        self.http.post(&path, &serde_json::json!({})).await
    }

    pub async fn admin_create_dataset(&self, dataset: &DatasetCreate) -> Result<Dataset, ApiError> {
        self.http.post(&format!("{}/datasets", ADMIN_PREFIX), dataset).await
    }

    pub async fn admin_list_datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        self.http.get(&format!("{}/datasets", ADMIN_PREFIX)).await
    }

    pub async fn admin_get_dataset(&self, dataset_id: i64) -> Result<Dataset, ApiError> {
        self.http
            .get(&format!("{}/datasets/{}", ADMIN_PREFIX, dataset_id))
            .await
    }

    pub async fn admin_delete_dataset(&self, dataset_id: i64) -> Result<Acknowledgement, ApiError> {
        self.http
            .delete(&format!("{}/datasets/{}", ADMIN_PREFIX, dataset_id))
            .await
    }

    pub async fn admin_create_model(&self, model: &ModelCreate) -> Result<Model, ApiError> {
        self.http.post(&format!("{}/models", ADMIN_PREFIX), model).await
    }

    pub async fn admin_list_models(&self) -> Result<Vec<Model>, ApiError> {
        self.http.get(&format!("{}/models", ADMIN_PREFIX)).await
    }

    pub async fn admin_get_model(&self, model_id: i64) -> Result<Model, ApiError> {
        self.http
            .get(&format!("{}/models/{}", ADMIN_PREFIX, model_id))
            .await
    }

    pub async fn admin_delete_model(&self, model_id: i64) -> Result<Acknowledgement, ApiError> {
        self.http
            .delete(&format!("{}/models/{}", ADMIN_PREFIX, model_id))
            .await
    }
}
