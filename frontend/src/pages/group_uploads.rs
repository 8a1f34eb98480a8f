use std::rc::Rc;

use markflow_shared::{
    endpoints::{CreateUploads, GetGroup, ListUploads, UploadMode},
    models::{summarize_batches, GroupKind, Upload},
    pagination::DEFAULT_PER_PAGE,
    status::any_processing,
    PageRequest, PollProfile,
};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    api::read_file_list,
    components::{
        data_table::{ColumnSpec, DataTable},
        error_banner::ErrorBanner,
        loading_spinner::LoadingSpinner,
        status_badge::StatusBadge,
    },
    hooks::{use_page_rows, use_resource, use_status_polling, LoadMode},
    notices::{use_notify, Notice},
    pages::login::input_value,
    router::Route,
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct GroupUploadsPageProps {
    pub session: Session,
    pub group_id: String,
}

pub(crate) fn upload_columns() -> Vec<ColumnSpec<Upload>> {
    vec![
        ColumnSpec::new("filename", "File", |upload: &Upload| upload.filename.clone().into())
            .sortable()
            .render(|upload| {
                html! {
                    <Link<Route> to={Route::UploadDetail { id: upload.id.clone() }} classes="font-medium hover:text-[var(--primary)]">
                        { upload.filename.clone() }
                    </Link<Route>>
                }
            }),
        ColumnSpec::new("status", "Status", |upload: &Upload| upload.status.label().into())
            .sortable()
            .render(|upload| html! { <StatusBadge status={upload.status.clone()} /> }),
        ColumnSpec::new("page_count", "Pages", |upload: &Upload| upload.page_count.into()).sortable(),
        ColumnSpec::new("error_message", "Notes", |upload: &Upload| {
            upload.error_message.clone().into()
        }),
        ColumnSpec::new("created_at", "Uploaded", |upload: &Upload| upload.created_at.clone().into())
            .sortable(),
    ]
}

/// Form state of the upload panel.
#[derive(Debug, Clone, PartialEq, Default)]
struct UploadForm {
    mode: UploadMode,
    batch_name: String,
}

/// Where to go after a successful upload.
fn follow_up_route(group_id: &str, batch_name: Option<&str>) -> Option<Route> {
    batch_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Route::Batch {
            group_id: group_id.to_string(),
            batch_name: name.to_string(),
        })
}

#[function_component(GroupUploadsPage)]
pub fn group_uploads_page(props: &GroupUploadsPageProps) -> Html {
    let page = use_state(|| 1usize);
    let form = use_state(UploadForm::default);
    let uploading = use_state(|| false);
    let file_input = use_node_ref();
    let notify = use_notify();
    let navigator = use_navigator();

    let group = {
        let client = props.session.client.clone();
        use_resource(props.group_id.clone(), move |id: String| {
            let client = client.clone();
            Box::pin(async move { client.call(&GetGroup { id }).await })
        })
    };
    let uploads = {
        let client = props.session.client.clone();
        use_resource((props.group_id.clone(), *page), move |(group_id, page): (String, usize)| {
            let client = client.clone();
            Box::pin(async move {
                client
                    .call(&ListUploads {
                        group_id,
                        page: PageRequest::new(page, DEFAULT_PER_PAGE),
                    })
                    .await
            })
        })
    };
    let (rows, page_info) = use_page_rows(uploads.data.clone());

    {
        let reload = uploads.reload.clone();
        use_status_polling(
            any_processing(rows.iter()),
            PollProfile::Uploads,
            Callback::from(move |_| reload.emit(LoadMode::Silent)),
        );
    }

    let is_batch_group = group
        .data
        .as_ref()
        .is_some_and(|group| group.group_type == GroupKind::Batch);

    let on_submit = {
        let client = props.session.client.clone();
        let group_id = props.group_id.clone();
        let form = form.clone();
        let uploading = uploading.clone();
        let file_input = file_input.clone();
        let notify = notify.clone();
        let reload = uploads.reload.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(files) = file_input
                .cast::<HtmlInputElement>()
                .and_then(|input| input.files())
            else {
                return;
            };
            if files.length() == 0 {
                notify.emit(Notice::error("Choose at least one file."));
                return;
            }
            let batch_name = is_batch_group
                .then(|| form.batch_name.trim().to_string())
                .filter(|name| !name.is_empty());
            if is_batch_group && batch_name.is_none() {
                notify.emit(Notice::error("Batch groups need a batch name."));
                return;
            }
            let client = client.clone();
            let group_id = group_id.clone();
            let mode = form.mode;
            let uploading = uploading.clone();
            let notify = notify.clone();
            let reload = reload.clone();
            let navigator = navigator.clone();
            let file_input = file_input.clone();
            uploading.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                let result = async {
                    let files = read_file_list(&files).await?;
                    let count = files.len();
                    let request = CreateUploads {
                        group_id: group_id.clone(),
                        mode,
                        batch_name: batch_name.clone(),
                        files,
                    };
                    client.call(&request).await.map(|_| count)
                }
                .await;
                uploading.set(false);
                match result {
                    Ok(count) => {
                        notify.emit(Notice::success(format!("Uploaded {count} file(s).")));
                        if let Some(input) = file_input.cast::<HtmlInputElement>() {
                            input.set_value("");
                        }
                        match (follow_up_route(&group_id, batch_name.as_deref()), navigator) {
                            (Some(route), Some(navigator)) => navigator.push(&route),
                            _ => reload.emit(LoadMode::Silent),
                        }
                    },
                    Err(err) => {
                        web_sys::console::error_1(&format!("Upload failed: {}", err).into());
                        notify.emit(Notice::error(err.user_message()));
                    },
                }
            });
        })
    };

    let on_mode = {
        let form = form.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            let mut next = (*form).clone();
            next.mode = UploadMode::parse(&value).unwrap_or_default();
            form.set(next);
        })
    };
    let on_batch_name = {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let mut next = (*form).clone();
            next.batch_name = input_value(&e);
            form.set(next);
        })
    };
    let on_page_change = {
        let page = page.clone();
        Callback::from(move |next: usize| page.set(next))
    };
    let on_retry = {
        let reload = uploads.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    let title = group
        .data
        .as_ref()
        .map(|group| group.name.clone())
        .unwrap_or_else(|| "Uploads".to_string());

    let batches = if is_batch_group {
        let summaries = summarize_batches(&rows);
        html! {
            <div class="grid gap-3 sm:grid-cols-2 lg:grid-cols-3">
                { for summaries.into_iter().map(|batch| html! {
                    <Link<Route>
                        to={Route::Batch { group_id: props.group_id.clone(), batch_name: batch.name.clone() }}
                        classes="rounded-xl border border-[var(--border)] p-4 hover:border-[var(--primary)]"
                    >
                        <p class="font-semibold">{ batch.name.clone() }</p>
                        <p class="text-sm text-[var(--muted)]">
                            { format!("{} uploads · {} processing · {} failed", batch.uploads, batch.processing, batch.failed) }
                        </p>
                    </Link<Route>>
                }) }
            </div>
        }
    } else {
        Html::default()
    };

    html! {
        <section class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-4">
                <h1 class="text-2xl font-bold">{ title }</h1>
                <Link<Route> to={Route::MarkingJobs { group_id: props.group_id.clone() }} classes="btn-secondary">
                    {"Marking jobs"}
                </Link<Route>>
            </div>
            if uploads.loading && uploads.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = uploads.error.clone().or_else(|| group.error.clone()) {
                <ErrorBanner {message} on_close={uploads.clear_error.clone()} {on_retry} />
            }
            <form class="flex flex-wrap items-end gap-3 rounded-xl border border-[var(--border)] p-4" onsubmit={on_submit}>
                <label class="space-y-1">
                    <span class="block text-sm font-medium">{"Files"}</span>
                    <input ref={file_input} type="file" multiple=true accept="image/*,application/pdf" />
                </label>
                <label class="space-y-1">
                    <span class="block text-sm font-medium">{"Mode"}</span>
                    <select class="form-select" onchange={on_mode}>
                        <option value="images" selected={form.mode == UploadMode::Images}>{"Page images"}</option>
                        <option value="pdf" selected={form.mode == UploadMode::Pdf}>{"PDF"}</option>
                    </select>
                </label>
                if is_batch_group {
                    <label class="space-y-1">
                        <span class="block text-sm font-medium">{"Batch name"}</span>
                        <input class="form-input" placeholder="e.g. Term1" value={form.batch_name.clone()} oninput={on_batch_name} />
                    </label>
                }
                <button type="submit" class="btn-primary" disabled={*uploading}>
                    { if *uploading { "Uploading..." } else { "Upload" } }
                </button>
            </form>
            { batches }
            <DataTable<Upload>
                data={Rc::clone(&rows)}
                columns={upload_columns()}
                pagination={page_info}
                {on_page_change}
                loading={uploads.loading}
                empty_text="No uploads in this group yet."
            />
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_upload_follows_up_on_the_batch_route() {
        assert_eq!(
            follow_up_route("42", Some(" Term1 ")),
            Some(Route::Batch {
                group_id: "42".to_string(),
                batch_name: "Term1".to_string()
            })
        );
        assert_eq!(follow_up_route("42", Some("")), None);
        assert_eq!(follow_up_route("42", None), None);
    }
}
