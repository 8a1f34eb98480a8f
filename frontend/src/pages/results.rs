use markflow_shared::{
    endpoints::ListResults, models::MarkResult, pagination::DEFAULT_PER_PAGE,
    status::any_processing, PageRequest, PollProfile,
};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        data_table::{ColumnSpec, DataTable},
        error_banner::ErrorBanner,
        loading_spinner::LoadingSpinner,
        status_badge::StatusBadge,
    },
    hooks::{use_page_rows, use_resource, use_status_polling, LoadMode},
    router::Route,
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct ResultsPageProps {
    pub session: Session,
    pub job_id: String,
}

fn percentage(result: &MarkResult) -> Option<f64> {
    match (result.score, result.max_score) {
        (Some(score), Some(max)) if max > 0.0 => Some(score / max * 100.0),
        _ => None,
    }
}

fn score_text(result: &MarkResult) -> String {
    match (result.score, result.max_score) {
        (Some(score), Some(max)) => format!("{score} / {max}"),
        (Some(score), None) => score.to_string(),
        _ => "Pending".to_string(),
    }
}

fn result_columns() -> Vec<ColumnSpec<MarkResult>> {
    vec![
        ColumnSpec::new("student_name", "Student", |result: &MarkResult| {
            result.student_name.clone().into()
        })
        .sortable()
        .render(|result| {
            let name = result
                .student_name
                .clone()
                .unwrap_or_else(|| "Unnamed script".to_string());
            html! {
                <Link<Route> to={Route::UploadDetail { id: result.upload_id.clone() }} classes="hover:text-[var(--primary)]">
                    { name }
                </Link<Route>>
            }
        }),
        ColumnSpec::new("score", "Score", |result: &MarkResult| result.score.into())
            .sortable()
            .render(|result| html! { { score_text(result) } }),
        ColumnSpec::new("percentage", "%", |result: &MarkResult| percentage(result).into())
            .sortable()
            .render(|result| match percentage(result) {
                Some(value) => html! { { format!("{value:.0}%") } },
                None => html! {},
            }),
        ColumnSpec::new("status", "Status", |result: &MarkResult| result.status.label().into())
            .sortable()
            .render(|result| html! { <StatusBadge status={result.status.clone()} /> }),
        ColumnSpec::new("feedback", "Feedback", |result: &MarkResult| {
            result.feedback.clone().into()
        })
        .render(|result| {
            html! {
                <p class="max-w-md truncate text-sm text-[var(--muted)]" title={result.feedback.clone().unwrap_or_default()}>
                    { result.feedback.clone().unwrap_or_default() }
                </p>
            }
        }),
    ]
}

#[function_component(ResultsPage)]
pub fn results_page(props: &ResultsPageProps) -> Html {
    let page = use_state(|| 1usize);

    let client = props.session.client.clone();
    let results = use_resource(
        (props.job_id.clone(), *page),
        move |(job_id, page): (String, usize)| {
            let client = client.clone();
            Box::pin(async move {
                client
                    .call(&ListResults {
                        job_id,
                        page: PageRequest::new(page, DEFAULT_PER_PAGE),
                    })
                    .await
            })
        },
    );
    let (rows, page_info) = use_page_rows(results.data.clone());
    let processing = any_processing(rows.iter());

    {
        let reload = results.reload.clone();
        use_status_polling(
            processing,
            PollProfile::Results,
            Callback::from(move |_: ()| reload.emit(LoadMode::Silent)),
        );
    }

    let on_page_change = {
        let page = page.clone();
        Callback::from(move |next: usize| page.set(next))
    };
    let on_retry = {
        let reload = results.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    html! {
        <section class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-4">
                <h1 class="text-2xl font-bold">{"Results"}</h1>
                if processing {
                    <span class="text-sm text-[var(--muted)]">{"Marking in progress, refreshing automatically..."}</span>
                }
            </div>
            if results.loading && results.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = results.error.clone() {
                <ErrorBanner {message} on_close={results.clear_error.clone()} {on_retry} />
            }
            <DataTable<MarkResult>
                data={rows}
                columns={result_columns()}
                pagination={page_info}
                {on_page_change}
                loading={results.loading}
                empty_text="No results yet."
            />
        </section>
    }
}

#[cfg(test)]
mod tests {
    use markflow_shared::ResourceStatus;

    use super::*;

    fn result(score: Option<f64>, max_score: Option<f64>) -> MarkResult {
        MarkResult {
            id: "r1".to_string(),
            upload_id: "u1".to_string(),
            student_name: Some("Ann".to_string()),
            score,
            max_score,
            status: ResourceStatus::Completed,
            feedback: None,
        }
    }

    #[test]
    fn percentage_needs_a_positive_maximum() {
        assert_eq!(percentage(&result(Some(15.0), Some(20.0))), Some(75.0));
        assert_eq!(percentage(&result(Some(15.0), Some(0.0))), None);
        assert_eq!(percentage(&result(None, Some(20.0))), None);
    }

    #[test]
    fn score_text_shows_pending_without_a_score() {
        assert_eq!(score_text(&result(Some(7.5), Some(10.0))), "7.5 / 10");
        assert_eq!(score_text(&result(None, None)), "Pending");
    }
}
