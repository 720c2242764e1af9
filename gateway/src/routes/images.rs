use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::{
    admission::{
        AdmissionPipeline, AuthPolicy, BatchOutline, Caller, RoutePolicies, MAX_FILES_PER_BATCH,
        MAX_FILE_SIZE_BYTES,
    },
    media_storage::{MediaStorage, UploadFile},
    types::{AppError, ValidatedJson},
};

/// Form field carrying the file on the single-upload endpoint
const SINGLE_FILE_FIELD: &str = "file";
/// Form fields accepted for files on the multi-upload endpoint
const MULTI_FILE_FIELDS: [&str; 2] = ["files", "files[]"];
/// Form field carrying the optional destination folder
const FOLDER_FIELD: &str = "path";
/// Name given to file parts that carry no filename
const DEFAULT_FILE_NAME: &str = "blob";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
/// Longest folder value accepted, in bytes
const MAX_FOLDER_BYTES: usize = 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    /// Public URL of the stored image
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MultiUploadResponse {
    pub success: bool,
    /// Public URLs, in the order the files were sent
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Public URL returned by an earlier upload
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing publicUrl"))]
    pub public_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuotaResponse {
    pub success: bool,
    /// Files the caller may still upload
    pub remaining: u32,
    /// Files allowed per client
    pub limit: u32,
}

/// Files and folder read from a multipart upload form
struct UploadForm {
    /// File parts that were read in full and fit the size limit
    files: Vec<UploadFile>,
    /// Every file part sent, including those that were never buffered
    outline: BatchOutline,
    folder: Option<String>,
}

/// Uploads a single image
///
/// Admission runs before any storage call: authentication per the endpoint's
/// policy, then the structural checks, then the caller's quota.
#[instrument(skip_all, fields(client = %caller.identity))]
pub async fn upload_image(
    Extension(pipeline): Extension<Arc<AdmissionPipeline>>,
    Extension(media_storage): Extension<Arc<MediaStorage>>,
    Extension(policies): Extension<RoutePolicies>,
    caller: Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    pipeline.authorize(&caller, policies.single_upload)?;

    let mut form = read_upload_form(multipart?, &[SINGLE_FILE_FIELD], 1).await?;
    // Only the first `file` part is stored
    form.outline.file_count = form.outline.file_count.min(1);

    pipeline.admit_outline(&caller, &form.outline, policies.single_upload)?;

    let urls = media_storage
        .upload_batch(form.files, form.folder.as_deref())
        .await?;
    let url = single_url(urls)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { success: true, url }),
    ))
}

/// Uploads up to ten images concurrently
///
/// The batch costs one quota unit per file. If any file fails to store the
/// whole request fails; files already stored are left in place.
#[instrument(skip_all, fields(client = %caller.identity))]
pub async fn upload_images(
    Extension(pipeline): Extension<Arc<AdmissionPipeline>>,
    Extension(media_storage): Extension<Arc<MediaStorage>>,
    Extension(policies): Extension<RoutePolicies>,
    caller: Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<MultiUploadResponse>), AppError> {
    pipeline.authorize(&caller, policies.multi_upload)?;

    let form = read_upload_form(multipart?, &MULTI_FILE_FIELDS, MAX_FILES_PER_BATCH).await?;

    pipeline.admit_outline(&caller, &form.outline, policies.multi_upload)?;

    let urls = media_storage
        .upload_batch(form.files, form.folder.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MultiUploadResponse {
            success: true,
            urls,
        }),
    ))
}

/// Deletes an image by its public URL
///
/// Always requires the bearer credential, whatever the upload policies are.
#[instrument(skip_all, fields(client = %caller.identity))]
pub async fn delete_image(
    Extension(pipeline): Extension<Arc<AdmissionPipeline>>,
    Extension(media_storage): Extension<Arc<MediaStorage>>,
    caller: Caller,
    payload: Result<ValidatedJson<DeleteRequest>, AppError>,
) -> Result<Json<DeleteResponse>, AppError> {
    pipeline.authorize(&caller, AuthPolicy::Strict)?;

    let ValidatedJson(payload) = payload?;
    pipeline.admit_delete(&caller, Some(&payload.public_url))?;

    media_storage.delete_one(&payload.public_url).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("File with URL {} deleted successfully", payload.public_url),
    }))
}

/// Reports how many more files the caller may upload
#[allow(clippy::unused_async)]
#[instrument(skip_all, fields(client = %caller.identity))]
pub async fn get_quota(
    Extension(pipeline): Extension<Arc<AdmissionPipeline>>,
    caller: Caller,
) -> Json<QuotaResponse> {
    Json(QuotaResponse {
        success: true,
        remaining: pipeline.remaining(&caller),
        limit: pipeline.quota_ceiling(),
    })
}

/// Collects file parts named in `file_fields` and the optional folder field
///
/// At most `keep` file parts are buffered, each up to [`MAX_FILE_SIZE_BYTES`].
/// Later parts are counted and skipped, and an oversize part is recorded by
/// name and drained, so the admission checks see the whole batch without it
/// ever being held in memory. Other fields are ignored. When the folder field
/// repeats, the first value wins.
async fn read_upload_form(
    mut multipart: Multipart,
    file_fields: &[&str],
    keep: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        files: Vec::new(),
        outline: BatchOutline::default(),
        folder: None,
    };

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_owned();

        if field_name == FOLDER_FIELD {
            let value = read_capped(&mut field, MAX_FOLDER_BYTES)
                .await?
                .ok_or_else(|| AppError::malformed("Folder path is too long"))?;
            let value = String::from_utf8(value)
                .map_err(|_| AppError::malformed("Folder path is not valid UTF-8"))?;
            form.folder.get_or_insert(value);
        } else if file_fields.contains(&field_name.as_str()) {
            form.outline.file_count += 1;
            if form.outline.file_count > keep {
                drain(&mut field).await?;
                continue;
            }

            let name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_owned();
            let content_type = field
                .content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_owned();

            match read_capped(&mut field, MAX_FILE_SIZE_BYTES).await? {
                Some(bytes) => form.files.push(UploadFile::new(name, content_type, bytes)),
                None => {
                    form.outline.oversized.get_or_insert(name);
                }
            }
        }
    }

    Ok(form)
}

/// Reads a part into memory, or `None` once it grows past `limit` bytes
///
/// The rest of an oversize part is consumed and discarded.
async fn read_capped(
    field: &mut Field<'_>,
    limit: usize,
) -> Result<Option<Vec<u8>>, MultipartError> {
    let mut buffer = Vec::new();
    let mut overflowed = false;

    while let Some(chunk) = field.chunk().await? {
        if overflowed {
            continue;
        }
        if buffer.len() + chunk.len() > limit {
            overflowed = true;
            buffer = Vec::new();
        } else {
            buffer.extend_from_slice(&chunk);
        }
    }

    Ok((!overflowed).then_some(buffer))
}

async fn drain(field: &mut Field<'_>) -> Result<(), MultipartError> {
    while field.chunk().await?.is_some() {}
    Ok(())
}

/// The one URL of a single-file upload
fn single_url(mut urls: Vec<String>) -> Result<String, AppError> {
    match (urls.pop(), urls.is_empty()) {
        (Some(url), true) => Ok(url),
        (found, _) => Err(AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "Storage returned {} URLs for a single upload",
                usize::from(found.is_some()) + urls.len()
            ),
        )),
    }
}
