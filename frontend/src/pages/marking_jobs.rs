use std::rc::Rc;

use markflow_shared::{
    endpoints::{CreateMarkingJob, GetGroup, ListMarkingJobs, ListSchemes},
    models::{MarkingJob, NewMarkingJob},
    status::any_processing,
    PageRequest, PollProfile, SortValue,
};
use web_sys::HtmlSelectElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        data_table::{ColumnSpec, DataTable},
        error_banner::ErrorBanner,
        loading_spinner::LoadingSpinner,
        status_badge::StatusBadge,
    },
    config::MODEL_CHOICES,
    hooks::{use_resource, use_status_polling, LoadMode},
    notices::{use_notify, Notice},
    router::Route,
    session::Session,
    storage,
};

/// Schemes offered in the picker; one request is enough for a typical account.
const SCHEME_PICKER_SIZE: usize = 100;

#[derive(Properties, PartialEq)]
pub struct MarkingJobsPageProps {
    pub session: Session,
    pub group_id: String,
}

fn initial_model() -> String {
    storage::selected_model()
        .filter(|model| MODEL_CHOICES.iter().any(|(value, _)| value == model))
        .or_else(|| MODEL_CHOICES.first().map(|(value, _)| value.to_string()))
        .unwrap_or_default()
}

fn job_columns(scheme_names: Rc<Vec<(String, String)>>) -> Vec<ColumnSpec<MarkingJob>> {
    vec![
        ColumnSpec::new("scheme", "Scheme", move |job: &MarkingJob| {
            scheme_names
                .iter()
                .find(|(id, _)| *id == job.scheme_id)
                .map_or_else(|| job.scheme_id.clone(), |(_, name)| name.clone())
                .into()
        })
        .sortable(),
        ColumnSpec::new("model", "Model", |job: &MarkingJob| job.model.clone().into()).sortable(),
        ColumnSpec::new("status", "Status", |job: &MarkingJob| job.status.label().into())
            .sortable()
            .render(|job| html! { <StatusBadge status={job.status.clone()} /> }),
        ColumnSpec::new("progress", "Progress", |job: &MarkingJob| {
            job.percent().map(u32::from).into()
        })
        .sortable()
        .render(|job| match job.percent() {
            Some(percent) => html! {
                <div class="flex items-center gap-2">
                    <div class="h-2 w-24 overflow-hidden rounded-full bg-[var(--surface)]">
                        <div class="h-full bg-[var(--primary)]" style={format!("width: {percent}%")} />
                    </div>
                    <span class="text-xs">{ format!("{percent}%") }</span>
                </div>
            },
            None => html! { <span class="text-xs text-[var(--muted)]">{"n/a"}</span> },
        }),
        ColumnSpec::new("created_at", "Started", |job: &MarkingJob| job.created_at.clone().into())
            .sortable(),
        ColumnSpec::new("results", "", |_: &MarkingJob| SortValue::Null).render(|job| {
            html! {
                <Link<Route> to={Route::Results { job_id: job.id.clone() }} classes="text-sm text-[var(--primary)]">
                    {"Results"}
                </Link<Route>>
            }
        }),
    ]
}

#[function_component(MarkingJobsPage)]
pub fn marking_jobs_page(props: &MarkingJobsPageProps) -> Html {
    let scheme_id = use_state(String::new);
    let model = use_state(initial_model);
    let busy = use_state(|| false);
    let notify = use_notify();

    let group = {
        let client = props.session.client.clone();
        use_resource(props.group_id.clone(), move |id: String| {
            let client = client.clone();
            Box::pin(async move { client.call(&GetGroup { id }).await })
        })
    };
    let jobs = {
        let client = props.session.client.clone();
        use_resource(props.group_id.clone(), move |group_id: String| {
            let client = client.clone();
            Box::pin(async move { client.call(&ListMarkingJobs { group_id }).await })
        })
    };
    let schemes = {
        let client = props.session.client.clone();
        use_resource((), move |_: ()| {
            let client = client.clone();
            Box::pin(async move {
                client
                    .call(&ListSchemes {
                        page: PageRequest::new(1, SCHEME_PICKER_SIZE),
                    })
                    .await
            })
        })
    };

    let rows: Rc<Vec<MarkingJob>> = jobs.data.clone().unwrap_or_default();
    {
        let reload = jobs.reload.clone();
        use_status_polling(
            any_processing(rows.iter()),
            PollProfile::MarkingJobs,
            Callback::from(move |_: ()| reload.emit(LoadMode::Silent)),
        );
    }

    let scheme_names: Rc<Vec<(String, String)>> = Rc::new(
        schemes
            .data
            .as_ref()
            .map(|page| {
                page.items
                    .iter()
                    .map(|scheme| (scheme.id.clone(), scheme.name.clone()))
                    .collect()
            })
            .unwrap_or_default(),
    );

    let on_scheme = {
        let scheme_id = scheme_id.clone();
        Callback::from(move |e: Event| {
            scheme_id.set(e.target_unchecked_into::<HtmlSelectElement>().value());
        })
    };
    let on_model = {
        let model = model.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            storage::set_selected_model(&value);
            model.set(value);
        })
    };

    let on_start = {
        let client = props.session.client.clone();
        let group_id = props.group_id.clone();
        let scheme_id = scheme_id.clone();
        let model = model.clone();
        let busy = busy.clone();
        let notify = notify.clone();
        let reload = jobs.reload.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if scheme_id.is_empty() {
                notify.emit(Notice::error("Pick a marking scheme first."));
                return;
            }
            let request = CreateMarkingJob {
                group_id: group_id.clone(),
                job: NewMarkingJob {
                    scheme_id: (*scheme_id).clone(),
                    model: (!model.is_empty()).then(|| (*model).clone()),
                },
            };
            let client = client.clone();
            let busy = busy.clone();
            let notify = notify.clone();
            let reload = reload.clone();
            busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&request).await {
                    Ok(_) => {
                        notify.emit(Notice::success("Marking job started."));
                        reload.emit(LoadMode::Silent);
                    },
                    Err(err) => {
                        web_sys::console::error_1(&format!("Failed to start marking: {}", err).into());
                        notify.emit(Notice::error(err.user_message()));
                    },
                }
                busy.set(false);
            });
        })
    };
    let on_retry = {
        let reload = jobs.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    let title = group
        .data
        .as_ref()
        .map(|group| format!("Marking jobs: {}", group.name))
        .unwrap_or_else(|| "Marking jobs".to_string());

    html! {
        <section class="space-y-6">
            <div class="space-y-1">
                <Link<Route> to={Route::GroupUploads { group_id: props.group_id.clone() }} classes="text-sm text-[var(--primary)]">
                    {"← Back to uploads"}
                </Link<Route>>
                <h1 class="text-2xl font-bold">{ title }</h1>
            </div>
            if jobs.loading && jobs.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = jobs.error.clone().or_else(|| schemes.error.clone()) {
                <ErrorBanner {message} on_close={jobs.clear_error.clone()} {on_retry} />
            }
            <form class="flex flex-wrap items-end gap-3 rounded-xl border border-[var(--border)] p-4" onsubmit={on_start}>
                <label class="space-y-1">
                    <span class="block text-sm font-medium">{"Scheme"}</span>
                    <select class="form-select" onchange={on_scheme}>
                        <option value="" selected={scheme_id.is_empty()}>{"Choose a scheme"}</option>
                        { for scheme_names.iter().map(|(id, name)| html! {
                            <option value={id.clone()} selected={*scheme_id == *id}>{ name.clone() }</option>
                        }) }
                    </select>
                </label>
                <label class="space-y-1">
                    <span class="block text-sm font-medium">{"Model"}</span>
                    <select class="form-select" onchange={on_model}>
                        { for MODEL_CHOICES.iter().map(|(value, label)| html! {
                            <option value={*value} selected={model.as_str() == *value}>{ *label }</option>
                        }) }
                    </select>
                </label>
                <button type="submit" class="btn-primary" disabled={*busy}>{"Start marking"}</button>
            </form>
            <DataTable<MarkingJob>
                data={rows}
                columns={job_columns(scheme_names.clone())}
                loading={jobs.loading}
                empty_text="No marking jobs for this group yet."
            />
        </section>
    }
}
