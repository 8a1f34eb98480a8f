use anyhow::{Context, Result};
use markflow_shared::{
    endpoints::{CreateGroup, DeleteGroup, ListGroups},
    models::{GroupKind, NewGroup},
    PageRequest,
};

use crate::{
    cli::ListArgs,
    output::{or_dash, pager_line, TextTable},
    CliClient,
};

pub async fn list(client: &CliClient, list: &ListArgs) -> Result<()> {
    let page = client
        .call(&ListGroups {
            page: PageRequest::new(list.page, list.per_page),
            sort: list.sort_state(),
        })
        .await
        .context("failed to list groups")?;

    let mut table = TextTable::new(&["ID", "NAME", "TYPE", "UPLOADS", "CREATED"]);
    for group in &page.items {
        table.row(vec![
            group.id.clone(),
            group.name.clone(),
            group.group_type.as_str().to_string(),
            or_dash(group.upload_count),
            or_dash(group.created_at.as_deref()),
        ]);
    }
    println!("{}", table.render("No groups yet."));
    println!("{}", pager_line(&page.page_info()));
    Ok(())
}

pub async fn create(
    client: &CliClient,
    name: String,
    kind: GroupKind,
    description: Option<String>,
) -> Result<()> {
    let group = client
        .call(&CreateGroup(NewGroup {
            name: name.trim().to_string(),
            description,
            group_type: kind,
        }))
        .await
        .context("failed to create group")?;
    tracing::info!(id = %group.id, "created {} group \"{}\"", group.group_type.as_str(), group.name);
    Ok(())
}

pub async fn delete(client: &CliClient, ids: Vec<String>) -> Result<()> {
    let mut failed = 0usize;
    for id in ids {
        match client.call(&DeleteGroup { id: id.clone() }).await {
            Ok(_) => tracing::info!(%id, "deleted group"),
            Err(err) => {
                failed += 1;
                tracing::error!(%id, "failed to delete group: {err}");
            },
        }
    }
    anyhow::ensure!(failed == 0, "{failed} group(s) could not be deleted");
    Ok(())
}
