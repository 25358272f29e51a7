use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use qlens_common::error::QlensError;
use qlens_config::ProjectConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// JSON body whose rejections come back as `{ "error": … }` with 400.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| QlensError::Validation(e.body_text()))?;
        Ok(ValidJson(value))
    }
}

/// Query string parsed into `T`; bad values are a 400 `Validation` error.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::try_from_uri(&parts.uri)
            .map_err(|e| QlensError::Validation(e.body_text()))?;
        Ok(ValidQuery(value))
    }
}

#[derive(Debug, Deserialize)]
struct ProjectParam {
    project: Option<String>,
}

/// The project named by `?project=`, or the configured default.
pub struct SelectedProject(pub ProjectConfig);

impl FromRequestParts<AppState> for SelectedProject {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ValidQuery(param) = ValidQuery::<ProjectParam>::from_request_parts(parts, state).await?;
        let project = state.projects.resolve(param.project.as_deref())?;
        Ok(SelectedProject(project.clone()))
    }
}
