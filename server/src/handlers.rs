//! Server request dispatcher: the three namespaced endpoints and
//! the path-safety check every one of them goes through first.

use crate::error::ApiError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use dirsync_protocol::{query, DirEntry, MetaPayload};
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Pulls the opaque `q=` blob out of the raw query string and decodes it back
/// into key/value pairs. Requests never carry bare `key=`/`path=`
/// parameters on the wire — only the single encoded `q` blob does.
fn decode_query(raw: Option<String>) -> Result<Vec<(String, String)>, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::InvalidRequest("missing query string".into()))?;
    let blob = raw
        .strip_prefix("q=")
        .ok_or_else(|| ApiError::InvalidRequest("missing q parameter".into()))?;
    query::parse_query(blob).map_err(|err| ApiError::InvalidRequest(err.to_string()))
}

fn required<'a>(pairs: &'a [(String, String)], key: &str) -> Result<&'a str, ApiError> {
    query::get(pairs, key).ok_or_else(|| ApiError::InvalidRequest(format!("missing {key}")))
}

/// Validates `key` and `path`, then resolves the filesystem path they name
/// under `root`. Rejects any path-traversal attempt with `400`.
fn resolve_path(root: &std::path::Path, key: &str, path: &str) -> Result<PathBuf, ApiError> {
    let key_rel = dirsync_core::validate_relative_path(key)
        .map_err(|err| ApiError::InvalidRequest(format!("invalid key: {err}")))?;
    let path_rel = dirsync_core::validate_relative_path(path)
        .map_err(|err| ApiError::InvalidRequest(format!("invalid path: {err}")))?;
    let namespace_root = root.join(key_rel);
    Ok(namespace_root.join(path_rel))
}

fn namespace_root(root: &std::path::Path, key: &str) -> Result<PathBuf, ApiError> {
    let key_rel = dirsync_core::validate_relative_path(key)
        .map_err(|err| ApiError::InvalidRequest(format!("invalid key: {err}")))?;
    Ok(root.join(key_rel))
}

pub async fn files_description_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let ns_root = namespace_root(&state.root, key)?;

    if !ns_root.is_dir() {
        return Ok(axum::Json(Vec::<DirEntry>::new()));
    }

    let entries = tokio::task::spawn_blocking(move || dirsync_core::walk_tree(&ns_root))
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?
        .map_err(|err| ApiError::InternalError(err.into()))?;

    Ok(axum::Json(entries))
}

pub async fn meta_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let path = required(&pairs, "path")?;
    let full_path = resolve_path(&state.root, key, path)?;

    if !full_path.exists() {
        return Err(ApiError::NotFound(format!("{path} not found")));
    }

    let payload = if full_path.is_dir() {
        MetaPayload::non_file()
    } else {
        let chunks = tokio::task::spawn_blocking({
            let full_path = full_path.clone();
            move || dirsync_core::chunker::chunk_file(&full_path)
        })
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?
        .map_err(|err| ApiError::InternalError(err.into()))?;
        MetaPayload::for_file(chunks)
    };

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        payload.encode(),
    ))
}

pub async fn get_file_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let path = required(&pairs, "path")?;
    let full_path = resolve_path(&state.root, key, path)?;

    if !full_path.is_file() {
        return Err(ApiError::NotFound(format!("{path} not found")));
    }

    let content = tokio::fs::read(&full_path)
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], content))
}

pub async fn post_file_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let path = required(&pairs, "path")?;
    let entry_type = required(&pairs, "type")?;
    let full_path = resolve_path(&state.root, key, path)?;

    match entry_type {
        "dir" => {
            tokio::fs::create_dir_all(&full_path)
                .await
                .map_err(|err| ApiError::InternalError(err.into()))?;
        }
        "file" => {
            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| ApiError::InternalError(err.into()))?;
            }
            tokio::fs::write(&full_path, &body)
                .await
                .map_err(|err| ApiError::InternalError(err.into()))?;
        }
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "unknown type '{other}', expected file or dir"
            )));
        }
    }

    Ok(StatusCode::OK)
}

/// Applies a byte-range write at `offset`, creating the file first if it
/// doesn't exist yet. When `end=1` is present and the write didn't reach the current end
/// of file, truncates to `offset + body.len()`.
pub async fn patch_file_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let path = required(&pairs, "path")?;
    let offset: u64 = required(&pairs, "offset")?
        .parse()
        .map_err(|_| ApiError::InvalidRequest("offset is not a valid integer".into()))?;
    let end = query::get(&pairs, "end") == Some("1");
    let full_path = resolve_path(&state.root, key, path)?;

    if full_path.is_dir() {
        return Ok(StatusCode::OK);
    }

    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| ApiError::InternalError(err.into()))?;
    }

    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&full_path)
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?;

    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?;
    file.write_all(&body)
        .await
        .map_err(|err| ApiError::InternalError(err.into()))?;

    if end {
        let new_len = offset + body.len() as u64;
        file.set_len(new_len)
            .await
            .map_err(|err| ApiError::InternalError(err.into()))?;
    }

    Ok(StatusCode::OK)
}

pub async fn delete_file_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = decode_query(raw)?;
    let key = required(&pairs, "key")?;
    let path = required(&pairs, "path")?;
    let full_path = resolve_path(&state.root, key, path)?;

    if full_path.is_dir() {
        tokio::fs::remove_dir_all(&full_path)
            .await
            .map_err(|err| ApiError::InternalError(err.into()))?;
    } else if full_path.is_file() {
        tokio::fs::remove_file(&full_path)
            .await
            .map_err(|err| ApiError::InternalError(err.into()))?;
    } else {
        return Err(ApiError::NotFound(format!("{path} not found")));
    }

    Ok(StatusCode::OK)
}
