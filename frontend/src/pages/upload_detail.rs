use markflow_shared::{
    endpoints::{DeleteUpload, GetUpload, ListPages, RedoOcr, UpdatePageText},
    models::UploadPage,
    status::any_processing,
    PollProfile,
};
use web_sys::HtmlTextAreaElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        error_banner::ErrorBanner, loading_spinner::LoadingSpinner, status_badge::StatusBadge,
    },
    hooks::{use_bounded_poll, use_resource, use_status_polling, LoadMode},
    notices::{use_notify, Notice},
    router::Route,
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct UploadDetailPageProps {
    pub session: Session,
    pub id: String,
}

/// Text being edited for one page.
#[derive(Debug, Clone, PartialEq)]
struct Draft {
    page_number: u32,
    text: String,
}

impl Draft {
    fn open(page: &UploadPage) -> Self {
        Self {
            page_number: page.page_number,
            text: page.ocr_text.clone().unwrap_or_default(),
        }
    }
}

#[function_component(UploadDetailPage)]
pub fn upload_detail_page(props: &UploadDetailPageProps) -> Html {
    let draft = use_state(|| None::<Draft>);
    let saving = use_state(|| false);
    let notify = use_notify();
    let navigator = use_navigator();

    let upload = {
        let client = props.session.client.clone();
        use_resource(props.id.clone(), move |id: String| {
            let client = client.clone();
            Box::pin(async move { client.call(&GetUpload { id }).await })
        })
    };
    let pages = {
        let client = props.session.client.clone();
        use_resource(props.id.clone(), move |upload_id: String| {
            let client = client.clone();
            Box::pin(async move { client.call(&ListPages { upload_id }).await })
        })
    };

    let processing = upload
        .data
        .as_ref()
        .is_some_and(|upload| upload.status.is_processing())
        || pages
            .data
            .as_ref()
            .is_some_and(|pages| any_processing(pages.iter()));

    {
        let reload_upload = upload.reload.clone();
        let reload_pages = pages.reload.clone();
        use_status_polling(
            processing,
            PollProfile::Uploads,
            Callback::from(move |_: ()| {
                reload_upload.emit(LoadMode::Silent);
                reload_pages.emit(LoadMode::Silent);
            }),
        );
    }
    let (start_ocr_poll, ocr_polling) = {
        let reload_pages = pages.reload.clone();
        use_bounded_poll(Callback::from(move |_: ()| reload_pages.emit(LoadMode::Silent)))
    };

    let on_save = {
        let client = props.session.client.clone();
        let upload_id = props.id.clone();
        let draft = draft.clone();
        let saving = saving.clone();
        let notify = notify.clone();
        let reload_pages = pages.reload.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(current) = (*draft).clone() else {
                return;
            };
            let request = UpdatePageText {
                upload_id: upload_id.clone(),
                page_number: current.page_number,
                ocr_text: current.text,
            };
            let client = client.clone();
            let draft = draft.clone();
            let saving = saving.clone();
            let notify = notify.clone();
            let reload_pages = reload_pages.clone();
            saving.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&request).await {
                    Ok(page) => {
                        notify.emit(Notice::success(format!("Saved page {}.", page.page_number)));
                        draft.set(None);
                        reload_pages.emit(LoadMode::Silent);
                    },
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
                saving.set(false);
            });
        })
    };

    let redo_ocr = {
        let client = props.session.client.clone();
        let upload_id = props.id.clone();
        let notify = notify.clone();
        Callback::from(move |page_number: u32| {
            let request = RedoOcr {
                upload_id: upload_id.clone(),
                page_number,
            };
            let client = client.clone();
            let notify = notify.clone();
            let start_ocr_poll = start_ocr_poll.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&request).await {
                    Ok(_) => {
                        notify.emit(Notice::info(format!("OCR restarted for page {page_number}.")));
                        start_ocr_poll.emit(());
                    },
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
            });
        })
    };

    let on_delete = {
        let client = props.session.client.clone();
        let id = props.id.clone();
        let group_id = upload.data.as_ref().map(|upload| upload.group_id.clone());
        let notify = notify.clone();
        Callback::from(move |_: MouseEvent| {
            let confirmed = web_sys::window()
                .and_then(|window| window.confirm_with_message("Delete this upload?").ok())
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let client = client.clone();
            let id = id.clone();
            let group_id = group_id.clone();
            let notify = notify.clone();
            let navigator = navigator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&DeleteUpload { id }).await {
                    Ok(_) => {
                        notify.emit(Notice::success("Upload deleted."));
                        if let Some(navigator) = navigator {
                            match group_id {
                                Some(group_id) => navigator.push(&Route::GroupUploads { group_id }),
                                None => navigator.push(&Route::Groups),
                            }
                        }
                    },
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
            });
        })
    };

    let on_retry = {
        let reload_upload = upload.reload.clone();
        let reload_pages = pages.reload.clone();
        Callback::from(move |_: ()| {
            reload_upload.emit(LoadMode::Blocking);
            reload_pages.emit(LoadMode::Blocking);
        })
    };
    let on_close = {
        let clear_upload = upload.clear_error.clone();
        let clear_pages = pages.clear_error.clone();
        Callback::from(move |_: ()| {
            clear_upload.emit(());
            clear_pages.emit(());
        })
    };

    let render_page = |page: &UploadPage| {
        let editing = draft
            .as_ref()
            .filter(|draft| draft.page_number == page.page_number)
            .cloned();
        let body = match editing {
            Some(current) => {
                let oninput = {
                    let draft = draft.clone();
                    let page_number = current.page_number;
                    Callback::from(move |e: InputEvent| {
                        let text = e.target_unchecked_into::<HtmlTextAreaElement>().value();
                        draft.set(Some(Draft {
                            page_number,
                            text,
                        }));
                    })
                };
                let on_cancel = {
                    let draft = draft.clone();
                    Callback::from(move |_: MouseEvent| draft.set(None))
                };
                html! {
                    <div class="space-y-2">
                        <textarea class="form-input h-48 w-full font-mono text-sm" value={current.text} {oninput} />
                        <div class="flex gap-2">
                            <button type="button" class="btn-primary" disabled={*saving} onclick={on_save.clone()}>
                                { if *saving { "Saving..." } else { "Save" } }
                            </button>
                            <button type="button" class="btn-secondary" onclick={on_cancel}>{"Cancel"}</button>
                        </div>
                    </div>
                }
            },
            None => {
                let on_edit = {
                    let draft = draft.clone();
                    let opened = Draft::open(page);
                    Callback::from(move |_: MouseEvent| draft.set(Some(opened.clone())))
                };
                let on_redo = {
                    let redo_ocr = redo_ocr.clone();
                    let page_number = page.page_number;
                    Callback::from(move |_: MouseEvent| redo_ocr.emit(page_number))
                };
                html! {
                    <div class="space-y-2">
                        <pre class="whitespace-pre-wrap rounded-lg bg-[var(--surface)] p-3 text-sm">
                            { page.ocr_text.clone().unwrap_or_else(|| "No text recognised yet.".to_string()) }
                        </pre>
                        <div class="flex gap-2">
                            <button type="button" class="btn-secondary" onclick={on_edit}>{"Edit text"}</button>
                            <button type="button" class="btn-secondary" onclick={on_redo}>{"Redo OCR"}</button>
                        </div>
                    </div>
                }
            },
        };
        html! {
            <article key={page.id.clone()} class="space-y-3 rounded-xl border border-[var(--border)] p-4">
                <header class="flex items-center justify-between">
                    <h2 class="font-semibold">{ format!("Page {}", page.page_number) }</h2>
                    <StatusBadge status={page.status.clone()} />
                </header>
                { body }
            </article>
        }
    };

    let header = match upload.data.as_ref() {
        Some(current) => html! {
            <div class="flex flex-wrap items-center justify-between gap-4">
                <div class="space-y-1">
                    <Link<Route> to={Route::GroupUploads { group_id: current.group_id.clone() }} classes="text-sm text-[var(--primary)]">
                        {"← Back to group"}
                    </Link<Route>>
                    <h1 class="text-2xl font-bold">{ current.filename.clone() }</h1>
                    <StatusBadge status={current.status.clone()} />
                    if let Some(message) = current.error_message.clone() {
                        <p class="text-sm text-red-600">{ message }</p>
                    }
                </div>
                <button type="button" class="btn-danger" onclick={on_delete}>{"Delete upload"}</button>
            </div>
        },
        None => html! { <h1 class="text-2xl font-bold">{"Upload"}</h1> },
    };

    html! {
        <section class="space-y-6">
            { header }
            if upload.loading && upload.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = upload.error.clone().or_else(|| pages.error.clone()) {
                <ErrorBanner {message} {on_close} {on_retry} />
            }
            if ocr_polling {
                <p class="text-sm text-[var(--muted)]">{"Waiting for OCR results..."}</p>
            }
            <div class="space-y-4">
                {
                    match pages.data.as_ref() {
                        Some(list) if list.is_empty() => html! {
                            <p class="text-[var(--muted)]">{"No pages have been extracted yet."}</p>
                        },
                        Some(list) => html! { for list.iter().map(render_page) },
                        None => html! {},
                    }
                }
            </div>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use markflow_shared::ResourceStatus;

    use super::*;

    #[test]
    fn drafts_start_from_recognised_text() {
        let page = UploadPage {
            id: "p1".to_string(),
            upload_id: "u1".to_string(),
            page_number: 2,
            ocr_text: None,
            status: ResourceStatus::parse(Some("completed")),
        };
        assert_eq!(
            Draft::open(&page),
            Draft {
                page_number: 2,
                text: String::new()
            }
        );
    }
}
