//! Command dispatch.

mod auth;
mod groups;
mod jobs;
mod pages;
mod results;
mod schemes;
mod uploads;

use std::path::Path;

use anyhow::{bail, Result};
use markflow_shared::{api_root, table::sort_rows, ApiClient, SortDirection, SortState, SortValue};

use crate::{
    cli::{
        Cli, Commands, GroupCommands, JobCommands, ListArgs, PageCommands, ResultCommands,
        SchemeCommands, UploadCommands,
    },
    session_file::FileTokenStore,
    transport::ReqwestTransport,
    CliClient,
};

/// Build the client for `api_base` over the session stored at `session_file`.
pub fn connect(api_base: &str, session_file: &Path) -> Result<CliClient> {
    let store = FileTokenStore::open(session_file)?;
    let transport = ReqwestTransport::new()?;
    let root = api_root(api_base);
    tracing::debug!(%root, session = %session_file.display(), "client configured");
    Ok(ApiClient::new(root, transport, store).with_session_expired_hook(|| {
        tracing::warn!("session expired; run `mf-cli login` to sign in again");
    }))
}

impl ListArgs {
    /// Requested order, if any.
    pub fn sort_state(&self) -> Option<SortState> {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.sort
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| SortState::by(field, direction))
    }
}

/// Sort rows already fetched. `key` returns `None` for a column it does not
/// know.
pub(crate) fn sort_local<T>(
    rows: &mut [T],
    sort: Option<SortState>,
    key: fn(&T, &str) -> Option<SortValue>,
) -> Result<()> {
    let Some(SortState {
        field: Some(field),
        direction,
    }) = sort
    else {
        return Ok(());
    };
    if let Some(first) = rows.first() {
        if key(first, &field).is_none() {
            bail!("cannot sort by `{field}`");
        }
    }
    sort_rows(rows, direction, |row| key(row, &field).unwrap_or(SortValue::Null));
    Ok(())
}

/// Run one parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let client = connect(&cli.api_base, &cli.session_file)?;

    match cli.command {
        Commands::Login {
            email,
            password,
        } => auth::login(&client, &email, &password).await,
        Commands::Register {
            name,
            email,
            password,
        } => auth::register(&client, name, email, password).await,
        Commands::Logout => auth::logout(&client),
        Commands::Whoami => auth::whoami(&client).await,
        Commands::Groups {
            command,
        } => match command {
            GroupCommands::List {
                list,
            } => groups::list(&client, &list).await,
            GroupCommands::Create {
                name,
                kind,
                description,
            } => groups::create(&client, name, kind.into(), description).await,
            GroupCommands::Delete {
                ids,
            } => groups::delete(&client, ids).await,
        },
        Commands::Uploads {
            command,
        } => match command {
            UploadCommands::List {
                group,
                list,
            } => uploads::list(&client, &group, &list).await,
            UploadCommands::Batch {
                group,
                batch,
            } => uploads::batch(&client, &group, &batch).await,
            UploadCommands::Create {
                group,
                mode,
                batch,
                files,
                watch,
            } => {
                uploads::create(&client, &group, mode.into(), batch.clone(), &files).await?;
                if watch {
                    uploads::watch(&client, &group, batch.as_deref()).await?;
                }
                Ok(())
            },
            UploadCommands::Watch {
                group,
                batch,
            } => uploads::watch(&client, &group, batch.as_deref()).await,
            UploadCommands::Delete {
                id,
            } => uploads::delete(&client, id).await,
        },
        Commands::Pages {
            command,
        } => match command {
            PageCommands::List {
                upload,
            } => pages::list(&client, &upload).await,
            PageCommands::Show {
                upload,
                page,
            } => pages::show(&client, &upload, page).await,
            PageCommands::SetText {
                upload,
                page,
                file,
            } => pages::set_text(&client, &upload, page, &file).await,
            PageCommands::RedoOcr {
                upload,
                page,
                wait,
            } => pages::redo_ocr(&client, &upload, page, wait).await,
        },
        Commands::Schemes {
            command,
        } => match command {
            SchemeCommands::List {
                list,
            } => schemes::list(&client, &list).await,
            SchemeCommands::Show {
                id,
            } => schemes::show(&client, id).await,
            SchemeCommands::Create {
                scheme,
            } => schemes::save(&client, None, &scheme).await,
            SchemeCommands::Update {
                id,
                scheme,
            } => schemes::save(&client, Some(id), &scheme).await,
        },
        Commands::Jobs {
            command,
        } => match command {
            JobCommands::List {
                group,
            } => jobs::list(&client, &group).await,
            JobCommands::Create {
                group,
                scheme,
                model,
                watch,
            } => {
                jobs::create(&client, &group, scheme, model).await?;
                if watch {
                    jobs::watch(&client, &group).await?;
                }
                Ok(())
            },
            JobCommands::Watch {
                group,
            } => jobs::watch(&client, &group).await,
        },
        Commands::Results {
            command,
        } => match command {
            ResultCommands::List {
                job,
                list,
            } => results::list(&client, &job, &list).await,
            ResultCommands::Watch {
                job,
                page,
            } => results::watch(&client, &job, page).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(sort: Option<&str>, desc: bool) -> ListArgs {
        ListArgs {
            page: 1,
            per_page: 10,
            sort: sort.map(str::to_string),
            desc,
        }
    }

    fn by_len(row: &&str, field: &str) -> Option<SortValue> {
        (field == "len").then(|| row.len().into())
    }

    #[test]
    fn local_sort_orders_rows_and_rejects_unknown_columns() {
        let mut rows = vec!["ccc", "a", "bb"];
        sort_local(&mut rows, Some(SortState::by("len", SortDirection::Desc)), by_len).unwrap();
        assert_eq!(rows, ["ccc", "bb", "a"]);
        assert!(sort_local(&mut rows, Some(SortState::by("colour", SortDirection::Asc)), by_len).is_err());
        sort_local(&mut rows, None, by_len).unwrap();
        assert_eq!(rows, ["ccc", "bb", "a"]);
    }

    #[test]
    fn list_args_build_sort_state() {
        assert_eq!(list(None, true).sort_state(), None);
        assert_eq!(list(Some(" "), false).sort_state(), None);
        assert_eq!(
            list(Some("name"), true).sort_state(),
            Some(SortState::by("name", SortDirection::Desc))
        );
    }
}
