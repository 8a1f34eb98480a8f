use anyhow::{Context, Result};
use markflow_shared::{
    endpoints::{CreateMarkingJob, ListMarkingJobs},
    models::{MarkingJob, NewMarkingJob},
    status::any_processing,
    PollProfile,
};

use crate::{
    output::{or_dash, status_cell, TextTable},
    watch::{ctrl_c, watch as watch_loop, WatchExit},
    CliClient,
};

fn progress_cell(job: &MarkingJob) -> String {
    match job.percent() {
        Some(percent) => format!("{percent}%"),
        None => "n/a".to_string(),
    }
}

fn job_table(jobs: &[MarkingJob]) -> TextTable {
    let mut table = TextTable::new(&["ID", "SCHEME", "MODEL", "STATUS", "PROGRESS", "CREATED"]);
    for job in jobs {
        table.row(vec![
            job.id.clone(),
            job.scheme_id.clone(),
            or_dash(job.model.as_deref()),
            status_cell(&job.status),
            progress_cell(job),
            or_dash(job.created_at.as_deref()),
        ]);
    }
    table
}

async fn fetch_jobs(client: &CliClient, group_id: &str) -> Result<Vec<MarkingJob>> {
    client
        .call(&ListMarkingJobs {
            group_id: group_id.to_string(),
        })
        .await
        .with_context(|| format!("failed to list marking jobs of group {group_id}"))
}

pub async fn list(client: &CliClient, group_id: &str) -> Result<()> {
    let jobs = fetch_jobs(client, group_id).await?;
    println!("{}", job_table(&jobs).render("No marking jobs for this group yet."));
    Ok(())
}

pub async fn create(
    client: &CliClient,
    group_id: &str,
    scheme_id: String,
    model: Option<String>,
) -> Result<()> {
    // An explicit model becomes the remembered choice for later runs.
    let model = match model {
        Some(model) => {
            client
                .tokens()
                .set_selected_model(&model)
                .context("failed to remember the selected model")?;
            Some(model)
        },
        None => client.tokens().selected_model(),
    };
    let job = client
        .call(&CreateMarkingJob {
            group_id: group_id.to_string(),
            job: NewMarkingJob {
                scheme_id,
                model,
            },
        })
        .await
        .context("failed to start marking job")?;
    tracing::info!(id = %job.id, "marking job started ({})", job.status.label());
    Ok(())
}

pub async fn watch(client: &CliClient, group_id: &str) -> Result<()> {
    let exit = watch_loop(
        PollProfile::MarkingJobs.period(),
        move || async move {
            let jobs = fetch_jobs(client, group_id).await?;
            for job in jobs.iter().filter(|job| job.status.is_processing()) {
                tracing::info!("job {}: {}", job.id, progress_cell(job));
            }
            Ok::<_, anyhow::Error>(any_processing(jobs.iter()))
        },
        ctrl_c(),
    )
    .await?;

    match exit {
        WatchExit::Settled => list(client, group_id).await,
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

    fn job(progress: Option<f64>) -> MarkingJob {
        MarkingJob {
            id: "j1".to_string(),
            group_id: "g1".to_string(),
            scheme_id: "s1".to_string(),
            status: ResourceStatus::parse(Some("processing")),
            progress,
            model: None,
            created_at: None,
        }
    }

    #[test]
    fn progress_shows_percent_or_placeholder() {
        assert_eq!(progress_cell(&job(Some(0.42))), "42%");
        assert_eq!(progress_cell(&job(Some(3.0))), "100%");
        assert_eq!(progress_cell(&job(None)), "n/a");
    }

    #[test]
    fn job_table_lists_every_job() {
        let table = job_table(&[job(None), job(Some(0.5))]);
        assert_eq!(table.len(), 2);
        assert!(table.render("").contains("50%"));
    }
}
