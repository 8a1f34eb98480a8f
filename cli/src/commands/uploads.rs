use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use futures::future::try_join_all;
use markflow_shared::{
    endpoints::{CreateUploads, DeleteUpload, ListBatchUploads, ListUploads, UploadMode},
    models::{summarize_batches, Upload},
    status::any_processing,
    FilePart, PageRequest, PollProfile, SortValue,
};

use crate::{
    cli::ListArgs,
    commands::sort_local,
    output::{or_dash, pager_line, status_cell, TextTable},
    watch::{ctrl_c, watch as watch_loop, WatchExit},
    CliClient,
};

/// Rows fetched per refresh while watching a whole group.
const WATCH_PAGE_SIZE: usize = 100;

fn sort_key(upload: &Upload, field: &str) -> Option<SortValue> {
    Some(match field {
        "filename" => upload.filename.clone().into(),
        "status" => upload.status.label().into(),
        "pages" | "page_count" => upload.page_count.into(),
        "batch" | "batch_name" => upload.batch_name.clone().into(),
        "created" | "created_at" => upload.created_at.clone().into(),
        _ => return None,
    })
}

fn upload_table(uploads: &[Upload]) -> TextTable {
    let mut table = TextTable::new(&["ID", "FILE", "STATUS", "PAGES", "BATCH", "NOTES"]);
    for upload in uploads {
        table.row(vec![
            upload.id.clone(),
            upload.filename.clone(),
            status_cell(&upload.status),
            or_dash(upload.page_count),
            or_dash(upload.batch_name.as_deref()),
            upload.error_message.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// Guess the part content type from the file extension.
pub(crate) fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => return None,
    })
}

async fn read_part(path: &PathBuf) -> Result<FilePart> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;
    Ok(FilePart {
        field: String::new(),
        file_name,
        content_type: content_type_for(path).map(str::to_string),
        bytes,
    })
}

pub async fn list(client: &CliClient, group_id: &str, list: &ListArgs) -> Result<()> {
    let page = client
        .call(&ListUploads {
            group_id: group_id.to_string(),
            page: PageRequest::new(list.page, list.per_page),
        })
        .await
        .context("failed to list uploads")?;
    let info = page.page_info();
    let mut rows = page.items;
    sort_local(&mut rows, list.sort_state(), sort_key)?;

    println!("{}", upload_table(&rows).render("No uploads in this group yet."));
    println!("{}", pager_line(&info));
    let batches = summarize_batches(&rows);
    if !batches.is_empty() {
        let mut table = TextTable::new(&["BATCH", "UPLOADS", "PROCESSING", "FAILED"]);
        for batch in batches {
            table.row(vec![
                batch.name,
                batch.uploads.to_string(),
                batch.processing.to_string(),
                batch.failed.to_string(),
            ]);
        }
        println!("\n{}", table.render(""));
    }
    Ok(())
}

pub async fn batch(client: &CliClient, group_id: &str, batch_name: &str) -> Result<()> {
    let uploads = client
        .call(&ListBatchUploads {
            group_id: group_id.to_string(),
            batch_name: batch_name.to_string(),
        })
        .await
        .with_context(|| format!("failed to list batch {batch_name}"))?;
    println!("{}", upload_table(&uploads).render("This batch has no uploads."));
    Ok(())
}

pub async fn create(
    client: &CliClient,
    group_id: &str,
    mode: UploadMode,
    batch_name: Option<String>,
    paths: &[PathBuf],
) -> Result<()> {
    let files = try_join_all(paths.iter().map(read_part)).await?;
    let bytes: usize = files.iter().map(|file| file.bytes.len()).sum();
    tracing::info!("uploading {} file(s), {bytes} bytes", files.len());

    let request = CreateUploads {
        group_id: group_id.to_string(),
        mode,
        batch_name,
        files,
    };
    let created = client
        .call(&request)
        .await
        .context("upload failed")?;
    println!("{}", upload_table(&created).render("The server accepted no uploads."));
    tracing::info!("follow progress at {}", request.follow_up_path());
    Ok(())
}

pub async fn watch(client: &CliClient, group_id: &str, batch_name: Option<&str>) -> Result<()> {
    let profile = if batch_name.is_some() {
        PollProfile::Batch
    } else {
        PollProfile::Uploads
    };
    let last = RefCell::new(Vec::<Upload>::new());
    let last_ref = &last;

    let exit = watch_loop(
        profile.period(),
        move || async move {
            let uploads = match batch_name {
                Some(batch_name) => {
                    client
                        .call(&ListBatchUploads {
                            group_id: group_id.to_string(),
                            batch_name: batch_name.to_string(),
                        })
                        .await
                },
                None => client
                    .call(&ListUploads {
                        group_id: group_id.to_string(),
                        page: PageRequest::new(1, WATCH_PAGE_SIZE),
                    })
                    .await
                    .map(|page| page.items),
            }
            .with_context(|| format!("failed to list uploads of group {group_id}"))?;
            let busy = any_processing(uploads.iter());
            let processing = uploads.iter().filter(|u| u.status.is_processing()).count();
            tracing::info!("{} upload(s), {processing} still processing", uploads.len());
            *last_ref.borrow_mut() = uploads;
            Ok::<_, anyhow::Error>(busy)
        },
        ctrl_c(),
    )
    .await?;

    match exit {
        WatchExit::Settled => {
            println!("{}", upload_table(&last.borrow()).render("No uploads."));
            Ok(())
        },
        WatchExit::Interrupted => {
            tracing::info!("stopped watching");
            Ok(())
        },
    }
}

pub async fn delete(client: &CliClient, id: String) -> Result<()> {
    client
        .call(&DeleteUpload { id: id.clone() })
        .await
        .with_context(|| format!("failed to delete upload {id}"))?;
    tracing::info!(%id, "deleted upload");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(Path::new("scan.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("essay.pdf")), Some("application/pdf"));
        assert_eq!(content_type_for(Path::new("notes.txt")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }
}
