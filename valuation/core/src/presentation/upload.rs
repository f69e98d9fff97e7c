// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Section request body extractor
//!
//! Section writes arrive either as plain JSON or as `multipart/form-data`
//! with a `payload` part holding the JSON and one part per uploaded file.
//! A multipart request without a `payload` part uses the section default.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::application::error::ServiceError;
use crate::domain::storage::FileUpload;

const PAYLOAD_FIELD: &str = "payload";

pub struct SectionForm<T> {
    pub payload: T,
    pub files: Vec<FileUpload>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<S, T> FromRequest<S> for SectionForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(payload) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ServiceError::Validation(e.body_text()))?;
            return Ok(Self {
                payload,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ServiceError::Validation(e.body_text()))?;

        let mut payload = None;
        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::Validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == PAYLOAD_FIELD {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::Validation(e.body_text()))?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ServiceError::Validation(format!("Invalid payload: {e}")))?;
                payload = Some(parsed);
                continue;
            }

            let file_name = field.file_name().unwrap_or(&name).to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::Validation(e.body_text()))?;

            // Browsers send empty parts for untouched file inputs.
            if bytes.is_empty() {
                continue;
            }

            files.push(FileUpload {
                field: name,
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(Self {
            payload: payload.unwrap_or_default(),
            files,
        })
    }
}
