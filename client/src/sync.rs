//! Wires the reconciliation engine and delta-patch engine to the
//! transport: the business logic a worker executes for each `WorkerOp`.

use crate::transport::Transport;
use dirsync_protocol::{DirEntry, EntryType};
use std::path::{Path, PathBuf};

/// Full reconciliation pass: walk the local tree, fetch the remote
/// entry set, and apply the three resulting work sets.
pub async fn run_full_reconcile(transport: &Transport, root: &Path) -> anyhow::Result<()> {
    let local = {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || dirsync_core::walk_tree(&root)).await??
    };
    let remote = transport.files_description().await?;
    let plan = dirsync_core::plan(&local, &remote);

    tracing::debug!(
        uploads = plan.to_upload.len(),
        downloads = plan.to_download.len(),
        delta_candidates = plan.to_delta_sync.len(),
        "reconciliation plan computed"
    );

    for entry in &plan.to_upload {
        upload_entry(transport, root, entry).await?;
    }
    for entry in &plan.to_download {
        download_entry(transport, root, entry).await?;
    }
    for entry in &plan.to_delta_sync {
        delta_sync_path(transport, root, &entry.path).await?;
    }
    Ok(())
}

async fn upload_entry(transport: &Transport, root: &Path, entry: &DirEntry) -> anyhow::Result<()> {
    match entry.entry_type {
        EntryType::Dir => transport.post_dir(&entry.path).await?,
        EntryType::File => {
            let content = tokio::fs::read(root.join(&entry.path)).await?;
            transport.post_file(&entry.path, content).await?;
        }
    }
    Ok(())
}

async fn download_entry(
    transport: &Transport,
    root: &Path,
    entry: &DirEntry,
) -> anyhow::Result<()> {
    let full_path = root.join(&entry.path);
    match entry.entry_type {
        EntryType::Dir => {
            tokio::fs::create_dir_all(&full_path).await?;
        }
        EntryType::File => {
            if let Some(content) = transport.get_file(&entry.path).await? {
                if let Some(parent) = full_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&full_path, content).await?;
            }
        }
    }
    Ok(())
}

/// Delta-patch sync for one path: fetch the remote chunk manifest,
/// diff it against the local file, and send only the patches that differ.
pub async fn delta_sync_path(transport: &Transport, root: &Path, path: &str) -> anyhow::Result<()> {
    let meta = transport.meta(path).await?;
    let remote_chunks = match meta {
        Some(payload) if payload.is_file => payload.chunks,
        _ => Vec::new(),
    };

    let full_path = root.join(path);
    let patches = {
        let full_path = full_path.clone();
        tokio::task::spawn_blocking(move || dirsync_core::compute_patches(&full_path, &remote_chunks))
            .await??
    };

    for patch in patches {
        transport
            .patch(path, patch.offset, patch.data, patch.end)
            .await?;
    }
    Ok(())
}

/// A new path observed by the watcher: uploads it in full.
pub async fn handle_added(transport: &Transport, root: &Path, path: &str) -> anyhow::Result<()> {
    let full_path = root.join(path);
    let metadata = match tokio::fs::metadata(&full_path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    if metadata.is_dir() {
        transport.post_dir(path).await?;
    } else if metadata.is_file() {
        let content = tokio::fs::read(&full_path).await?;
        transport.post_file(path, content).await?;
    }
    Ok(())
}

pub async fn handle_removed(transport: &Transport, path: &str) -> anyhow::Result<()> {
    transport.delete(path).await?;
    Ok(())
}

/// A debounced `MODIFIED` event: only fires if `path` is still a
/// regular file; dropped silently otherwise.
pub async fn handle_modified(transport: &Transport, root: &Path, path: &str) -> anyhow::Result<()> {
    let full_path: PathBuf = root.join(path);
    match tokio::fs::metadata(&full_path).await {
        Ok(metadata) if metadata.is_file() => delta_sync_path(transport, root, path).await,
        _ => Ok(()),
    }
}
