//! Request body extractors.
//!
//! - [`ValidJson`]: JSON body, deserialized and validated, with every rejection rendered in the
//!   API's error envelope instead of axum's plain-text bodies
//! - [`ApiPath`], [`ApiQuery`]: the same treatment for path and query parameters
//! - [`MediaPayload`]: body of a media-bearing write, accepted either as JSON that references
//!   objects uploaded through a presigned URL, or as `multipart/form-data` carrying the files
//!   themselves. Files are uploaded here, before the handler runs, and the resulting url/key
//!   pairs are merged into the request as if the client had sent them.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::{StatusCode, header, request::Parts},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use validator::Validate;

use crate::{
    AppState,
    errors::{Error, FieldError, Result},
    storage::{CleanupQueue, MediaField, UploadFolder},
};

/// A request type that can carry media.
pub trait MediaForm: DeserializeOwned + Validate + Send {
    /// File parts accepted in multipart bodies and the folder each one is stored under.
    const UPLOADS: &'static [(MediaField, UploadFolder)];

    /// Whether the client may reference already stored objects by url/key. When false the
    /// pairs can only be set from files uploaded with the request.
    const CLIENT_MEDIA_REFS: bool = true;
}

fn rejection(status: StatusCode, message: String) -> Error {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { message }
    } else {
        Error::BadRequest { message }
    }
}

fn decode<T: DeserializeOwned + Validate>(value: Value) -> Result<T> {
    let data: T = serde_json::from_value(value).map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {e}"),
    })?;
    data.validate()?;
    Ok(data)
}

async fn json_body(req: Request, state: &AppState) -> Result<Value> {
    let Json(value) = Json::<Value>::from_request(req, state)
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?;
    Ok(value)
}

/// Validated JSON body.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T> FromRequest<AppState> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let value = json_body(req, state).await?;
        Ok(Self(decode(value)?))
    }
}

/// Path parameters.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T> FromRequestParts<AppState> for ApiPath<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string parameters.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T> FromRequestParts<AppState> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        Ok(Self(value))
    }
}

/// Keys of objects uploaded while extracting a request.
#[derive(Debug, Default)]
pub struct Uploads(Vec<String>);

impl Uploads {
    /// Pass `result` through, scheduling deletion of the uploads if the write that would have
    /// referenced them failed.
    pub fn release_on_error<R>(&self, cleanup: &CleanupQueue, result: Result<R>) -> Result<R> {
        if result.is_err() {
            self.release(cleanup);
        }
        result
    }

    fn release(&self, cleanup: &CleanupQueue) {
        if !self.0.is_empty() {
            debug!(count = self.0.len(), "Releasing uploads of a failed write");
            cleanup.enqueue_all(self.0.iter().cloned());
        }
    }
}

/// Body of a media-bearing write.
#[derive(Debug)]
pub struct MediaPayload<T> {
    pub data: T,
    pub uploads: Uploads,
}

impl<T: MediaForm> FromRequest<AppState> for MediaPayload<T> {
    type Rejection = Error;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            from_multipart(multipart, state).await
        } else {
            let mut value = json_body(req, state).await?;
            if !T::CLIENT_MEDIA_REFS
                && let Value::Object(map) = &mut value
            {
                strip_media_refs::<T>(map);
            }
            Ok(Self {
                data: decode(value)?,
                uploads: Uploads::default(),
            })
        }
    }
}

fn strip_media_refs<T: MediaForm>(map: &mut Map<String, Value>) {
    for (field, _) in T::UPLOADS {
        map.remove(field.url_field());
        map.remove(field.key_field());
    }
}

/// A file part waiting to be stored.
struct PendingUpload {
    field: MediaField,
    folder: UploadFolder,
    file_name: String,
    content_type: String,
    body: Bytes,
}

/// Content type of a file part: the declared one, or a guess from the file name when the
/// browser sent none or the generic `application/octet-stream`.
fn part_content_type(declared: Option<&str>, file_name: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && !ct.eq_ignore_ascii_case("application/octet-stream") => ct.to_string(),
        _ => mime_guess::from_path(file_name).first_or_octet_stream().essence_str().to_string(),
    }
}

/// Add a text part to the form map. A repeated name turns the value into an array.
fn insert_text(map: &mut Map<String, Value>, name: String, value: String) {
    match map.get_mut(&name) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(name, Value::String(value));
        }
    }
}

#[instrument(skip_all, err)]
async fn from_multipart<T: MediaForm>(mut multipart: Multipart, state: &AppState) -> Result<MediaPayload<T>> {
    let mut form = Map::new();
    let mut pending = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), format!("Failed to parse multipart data: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(&(media, folder)) = T::UPLOADS.iter().find(|(media, _)| media.form_part() == name) {
            let file_name = field.file_name().map(str::to_string).unwrap_or_else(|| name.clone());
            let content_type = part_content_type(field.content_type(), &file_name);
            let body = field
                .bytes()
                .await
                .map_err(|e| rejection(e.status(), format!("Failed to read file '{name}': {}", e.body_text())))?;

            // An untouched file input still submits an empty part
            if body.is_empty() {
                continue;
            }
            pending.push(PendingUpload {
                field: media,
                folder,
                file_name,
                content_type,
                body,
            });
        } else if field.file_name().is_some() {
            return Err(Error::BadRequest {
                message: format!("Unexpected file field '{name}'"),
            });
        } else {
            let value = field.text().await.map_err(|e| rejection(e.status(), e.body_text()))?;
            if !value.is_empty() {
                insert_text(&mut form, name, value);
            }
        }
    }

    if !T::CLIENT_MEDIA_REFS {
        strip_media_refs::<T>(&mut form);
    }

    // Reject bad requests before anything reaches the bucket
    let data: T = decode(Value::Object(form.clone()))?;
    if pending.is_empty() {
        return Ok(MediaPayload {
            data,
            uploads: Uploads::default(),
        });
    }

    let rejected: Vec<FieldError> = pending
        .iter()
        .filter(|upload| !upload.folder.accepts(&upload.content_type))
        .map(|upload| {
            FieldError::new(
                upload.field.form_part(),
                format!(
                    "Content type '{}' is not allowed for {} (expected {})",
                    upload.content_type,
                    upload.field.form_part(),
                    upload.folder.accepted_description()
                ),
            )
        })
        .collect();
    if !rejected.is_empty() {
        return Err(Error::Validation { fields: rejected });
    }

    let mut uploads = Uploads::default();
    for upload in pending {
        let stored = state
            .issuer
            .upload(upload.folder, &upload.file_name, &upload.content_type, upload.body)
            .await;
        let reference = match stored {
            Ok(reference) => reference,
            Err(e) => {
                uploads.release(&state.cleanup);
                return Err(e);
            }
        };
        form.insert(upload.field.url_field().to_string(), Value::String(reference.url));
        form.insert(upload.field.key_field().to_string(), Value::String(reference.key.clone()));
        uploads.0.push(reference.key);
    }

    // Re-read so the request carries the stored url/key pairs
    let data = uploads.release_on_error(&state.cleanup, decode(Value::Object(form)))?;
    Ok(MediaPayload { data, uploads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_text_parts_become_arrays() {
        let mut map = Map::new();
        insert_text(&mut map, "requirements".to_string(), "Resolve".to_string());
        insert_text(&mut map, "title".to_string(), "Colorist".to_string());
        insert_text(&mut map, "requirements".to_string(), "ACES".to_string());
        insert_text(&mut map, "requirements".to_string(), "Nuke".to_string());

        assert_eq!(
            Value::Object(map),
            json!({ "title": "Colorist", "requirements": ["Resolve", "ACES", "Nuke"] })
        );
    }

    #[test]
    fn test_part_content_type() {
        assert_eq!(part_content_type(Some("video/mp4"), "clip.bin"), "video/mp4");
        assert_eq!(part_content_type(Some("application/octet-stream"), "clip.mp4"), "video/mp4");
        assert_eq!(part_content_type(None, "cv.pdf"), "application/pdf");
        assert_eq!(part_content_type(None, "noextension"), "application/octet-stream");
    }

    #[test]
    fn test_rejection_status_mapping() {
        assert!(matches!(
            rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".to_string()),
            Error::PayloadTooLarge { .. }
        ));
        assert!(matches!(
            rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad".to_string()),
            Error::BadRequest { .. }
        ));
    }
}
