use anyhow::{Context, Result};
use markflow_shared::{
    endpoints::ListResults,
    models::MarkResult,
    status::any_processing,
    PageInfo, PageRequest, Paginated, PollProfile, SortValue,
};

use crate::{
    cli::ListArgs,
    commands::sort_local,
    output::{pager_line, status_cell, TextTable},
    watch::{ctrl_c, watch as watch_loop, WatchExit},
    CliClient,
};

fn percentage(result: &MarkResult) -> Option<f64> {
    match (result.score, result.max_score) {
        (Some(score), Some(max)) if max > 0.0 => Some(score / max * 100.0),
        _ => None,
    }
}

fn score_cell(result: &MarkResult) -> String {
    match (result.score, result.max_score) {
        (Some(score), Some(max)) => format!("{score} / {max}"),
        (Some(score), None) => score.to_string(),
        _ => "pending".to_string(),
    }
}

fn sort_key(result: &MarkResult, field: &str) -> Option<SortValue> {
    Some(match field {
        "student" | "student_name" => result.student_name.clone().into(),
        "score" => result.score.into(),
        "percent" | "percentage" => percentage(result).into(),
        "status" => result.status.label().into(),
        _ => return None,
    })
}

fn result_table(results: &[MarkResult]) -> TextTable {
    let mut table = TextTable::new(&["UPLOAD", "STUDENT", "SCORE", "PERCENT", "STATUS", "FEEDBACK"]);
    for result in results {
        let feedback: String = result
            .feedback
            .as_deref()
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(60)
            .collect();
        table.row(vec![
            result.upload_id.clone(),
            result
                .student_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            score_cell(result),
            percentage(result)
                .map(|percent| format!("{percent:.0}%"))
                .unwrap_or_default(),
            status_cell(&result.status),
            feedback,
        ]);
    }
    table
}

async fn fetch_page(client: &CliClient, job_id: &str, page: PageRequest) -> Result<Paginated<MarkResult>> {
    client
        .call(&ListResults {
            job_id: job_id.to_string(),
            page,
        })
        .await
        .with_context(|| format!("failed to list results of job {job_id}"))
}

fn print_page(rows: &[MarkResult], info: &PageInfo) {
    println!("{}", result_table(rows).render("No results yet."));
    println!("{}", pager_line(info));
}

pub async fn list(client: &CliClient, job_id: &str, list: &ListArgs) -> Result<()> {
    let page = fetch_page(client, job_id, PageRequest::new(list.page, list.per_page)).await?;
    let info = page.page_info();
    let mut rows = page.items;
    sort_local(&mut rows, list.sort_state(), sort_key)?;
    print_page(&rows, &info);
    Ok(())
}

/// Follow one page of results until none of its rows is still being marked.
pub async fn watch(client: &CliClient, job_id: &str, page: usize) -> Result<()> {
    let request = PageRequest::new(page, PageRequest::default().per_page);
    let exit = watch_loop(
        PollProfile::Results.period(),
        move || async move {
            let page = fetch_page(client, job_id, request).await?;
            let pending = page.items.iter().filter(|r| r.status.is_processing()).count();
            tracing::info!("{} result(s) on this page, {pending} pending", page.items.len());
            Ok::<_, anyhow::Error>(any_processing(page.items.iter()))
        },
        ctrl_c(),
    )
    .await?;

    match exit {
        WatchExit::Settled => {
            let page = fetch_page(client, job_id, request).await?;
            print_page(&page.items, &page.page_info());
            Ok(())
        },
        WatchExit::Interrupted => {
            tracing::info!("stopped watching");
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use markflow_shared::ResourceStatus;

    use super::*;

    fn result(student: Option<&str>, score: Option<f64>, max: Option<f64>) -> MarkResult {
        MarkResult {
            id: "r1".to_string(),
            upload_id: "u1".to_string(),
            student_name: student.map(str::to_string),
            score,
            max_score: max,
            status: ResourceStatus::parse(Some("completed")),
            feedback: Some("Clear argument.\nWeak conclusion.".to_string()),
        }
    }

    #[test]
    fn score_cells_show_pending_without_a_score() {
        assert_eq!(score_cell(&result(None, Some(7.5), Some(10.0))), "7.5 / 10");
        assert_eq!(score_cell(&result(None, Some(4.0), None)), "4");
        assert_eq!(score_cell(&result(None, None, Some(10.0))), "pending");
        assert_eq!(percentage(&result(None, Some(3.0), Some(0.0))), None);
    }

    #[test]
    fn results_sort_by_score_with_missing_scores_first() {
        let mut rows = vec![
            result(Some("Ada"), Some(9.0), Some(10.0)),
            result(Some("Bo"), None, None),
            result(Some("Cy"), Some(4.0), Some(10.0)),
        ];
        sort_local(
            &mut rows,
            Some(markflow_shared::SortState::by("score", markflow_shared::SortDirection::Asc)),
            sort_key,
        )
        .unwrap();
        let names: Vec<_> = rows.iter().filter_map(|r| r.student_name.as_deref()).collect();
        assert_eq!(names, ["Bo", "Cy", "Ada"]);
    }

    #[test]
    fn feedback_is_cut_to_its_first_line() {
        let rendered = result_table(&[result(Some("Ada"), Some(9.0), Some(10.0))]).render("");
        assert!(rendered.contains("Clear argument."));
        assert!(!rendered.contains("Weak conclusion."));
        assert!(rendered.contains("90%"));
    }
}
