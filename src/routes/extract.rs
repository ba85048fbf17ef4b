// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request extractors that reject with `AppError`.

use crate::error::AppError;
use axum::extract::{FromRequest, Path, Request};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

/// UUID path parameter; malformed ids become a 422.
pub type IdPath = WithRejection<Path<Uuid>, AppError>;

/// Two UUID path parameters.
pub type IdPairPath = WithRejection<Path<(Uuid, Uuid)>, AppError>;

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
