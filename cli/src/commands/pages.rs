use std::path::Path;

use anyhow::{Context, Result};
use markflow_shared::{
    endpoints::{ListPages, RedoOcr, UpdatePageText},
    models::UploadPage,
    BoundedPoll, ResourceStatus,
};
use tokio::time;

use crate::{
    output::{status_cell, TextTable},
    watch::ctrl_c,
    CliClient,
};

async fn fetch_pages(client: &CliClient, upload_id: &str) -> Result<Vec<UploadPage>> {
    client
        .call(&ListPages {
            upload_id: upload_id.to_string(),
        })
        .await
        .with_context(|| format!("failed to load pages of upload {upload_id}"))
}

pub async fn list(client: &CliClient, upload_id: &str) -> Result<()> {
    let pages = fetch_pages(client, upload_id).await?;
    let mut table = TextTable::new(&["PAGE", "STATUS", "CHARS", "PREVIEW"]);
    for page in &pages {
        let text = page.ocr_text.as_deref().unwrap_or_default();
        let preview: String = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(48)
            .collect();
        table.row(vec![
            page.page_number.to_string(),
            status_cell(&page.status),
            text.chars().count().to_string(),
            preview,
        ]);
    }
    println!("{}", table.render("No pages have been extracted yet."));
    Ok(())
}

pub async fn show(client: &CliClient, upload_id: &str, page_number: u32) -> Result<()> {
    let pages = fetch_pages(client, upload_id).await?;
    let page = pages
        .into_iter()
        .find(|page| page.page_number == page_number)
        .with_context(|| format!("upload {upload_id} has no page {page_number}"))?;
    println!("{}", page.ocr_text.unwrap_or_default());
    Ok(())
}

pub async fn set_text(client: &CliClient, upload_id: &str, page_number: u32, file: &Path) -> Result<()> {
    let ocr_text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let page = client
        .call(&UpdatePageText {
            upload_id: upload_id.to_string(),
            page_number,
            ocr_text,
        })
        .await
        .context("failed to save page text")?;
    tracing::info!("saved page {} ({})", page.page_number, page.status.label());
    Ok(())
}

pub async fn redo_ocr(client: &CliClient, upload_id: &str, page_number: u32, wait: bool) -> Result<()> {
    client
        .call(&RedoOcr {
            upload_id: upload_id.to_string(),
            page_number,
        })
        .await
        .context("failed to restart OCR")?;
    tracing::info!("OCR restarted for page {page_number}");
    if !wait {
        return Ok(());
    }

    // Fixed budget; page status does not end the poll early.
    let mut budget = BoundedPoll::default();
    let mut interval = time::interval(budget.period());
    interval.tick().await;
    let shutdown = ctrl_c();
    tokio::pin!(shutdown);
    let mut last_status: Option<ResourceStatus> = None;

    while budget.tick() {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("stopped waiting");
                return Ok(());
            }
            _ = interval.tick() => {}
        }
        match fetch_pages(client, upload_id).await {
            Ok(pages) => {
                let Some(page) = pages.into_iter().find(|page| page.page_number == page_number) else {
                    continue;
                };
                if last_status.as_ref() != Some(&page.status) {
                    tracing::info!("page {page_number}: {}", status_cell(&page.status));
                    last_status = Some(page.status);
                }
            },
            Err(err) => tracing::warn!("refresh failed: {err:#}"),
        }
    }
    tracing::info!("done polling; run `mf-cli pages show` to read the text");
    Ok(())
}
