use std::{borrow::Cow, rc::Rc};

use markflow_shared::{
    endpoints::ListBatchUploads, models::Upload, pagination::DEFAULT_PER_PAGE,
    status::any_processing, PageInfo, PollProfile,
};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        data_table::DataTable, error_banner::ErrorBanner, loading_spinner::LoadingSpinner,
    },
    hooks::{use_pagination, use_resource, use_status_polling, LoadMode},
    pages::group_uploads::upload_columns,
    router::Route,
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct BatchPageProps {
    pub session: Session,
    pub group_id: String,
    pub batch_name: String,
}

/// Batch names arrive percent-encoded from the path.
fn decode_batch_name(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

#[function_component(BatchPage)]
pub fn batch_page(props: &BatchPageProps) -> Html {
    let batch_name = decode_batch_name(&props.batch_name);

    let uploads = {
        let client = props.session.client.clone();
        use_resource(
            (props.group_id.clone(), batch_name.clone()),
            move |(group_id, batch_name): (String, String)| {
                let client = client.clone();
                Box::pin(async move {
                    client
                        .call(&ListBatchUploads {
                            group_id,
                            batch_name,
                        })
                        .await
                })
            },
        )
    };
    let all: Vec<Upload> = uploads
        .data
        .as_deref()
        .cloned()
        .unwrap_or_default();
    let processing = any_processing(all.iter());
    let total = all.len();
    let (visible, page, _pages, go_to_page) = use_pagination(all, DEFAULT_PER_PAGE);

    {
        let reload = uploads.reload.clone();
        use_status_polling(
            processing,
            PollProfile::Batch,
            Callback::from(move |_: ()| reload.emit(LoadMode::Silent)),
        );
    }

    let on_retry = {
        let reload = uploads.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    html! {
        <section class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-4">
                <div>
                    <Link<Route> to={Route::GroupUploads { group_id: props.group_id.clone() }} classes="text-sm text-[var(--primary)]">
                        {"← Back to group"}
                    </Link<Route>>
                    <h1 class="text-2xl font-bold">{ format!("Batch {}", batch_name) }</h1>
                </div>
                if processing {
                    <span class="text-sm text-[var(--muted)]">{"Processing, refreshing automatically..."}</span>
                }
            </div>
            if uploads.loading && uploads.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = uploads.error.clone() {
                <ErrorBanner {message} on_close={uploads.clear_error.clone()} {on_retry} />
            }
            <DataTable<Upload>
                data={Rc::new(visible)}
                columns={upload_columns()}
                pagination={Some(PageInfo::new(page, DEFAULT_PER_PAGE, total))}
                on_page_change={go_to_page}
                loading={uploads.loading}
                empty_text="This batch has no uploads."
            />
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_names_are_percent_decoded() {
        assert_eq!(decode_batch_name("Term%201"), "Term 1");
        assert_eq!(decode_batch_name("Term1"), "Term1");
    }
}
