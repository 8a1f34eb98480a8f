use anyhow::{bail, Context, Result};
use markflow_shared::{
    endpoints::{CreateScheme, GetScheme, ListSchemes, UpdateScheme},
    models::{Criterion, MarkingScheme, SchemeInput},
    PageRequest, SortValue,
};

use crate::{
    cli::{ListArgs, SchemeArgs},
    commands::sort_local,
    output::{or_dash, pager_line, TextTable},
    CliClient,
};

fn total_marks(scheme: &MarkingScheme) -> f64 {
    scheme
        .total_marks
        .unwrap_or_else(|| scheme.criteria.iter().map(|criterion| criterion.max_marks).sum())
}

fn sort_key(scheme: &MarkingScheme, field: &str) -> Option<SortValue> {
    Some(match field {
        "name" => scheme.name.clone().into(),
        "criteria" => scheme.criteria.len().into(),
        "total" | "total_marks" => total_marks(scheme).into(),
        "created" | "created_at" => scheme.created_at.clone().into(),
        _ => return None,
    })
}

/// `NAME=MARKS`; the last `=` separates the two, so names may contain `=`.
pub(crate) fn parse_criterion(raw: &str) -> Result<Criterion> {
    let Some((name, marks)) = raw.rsplit_once('=') else {
        bail!("criterion `{raw}` is not NAME=MARKS");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("criterion `{raw}` has no name");
    }
    let max_marks: f64 = marks
        .trim()
        .parse()
        .with_context(|| format!("criterion `{raw}` has invalid marks"))?;
    if !max_marks.is_finite() || max_marks <= 0.0 {
        bail!("criterion `{raw}` needs positive marks");
    }
    Ok(Criterion {
        name: name.to_string(),
        description: None,
        max_marks,
    })
}

pub(crate) fn scheme_input(args: &SchemeArgs) -> Result<SchemeInput> {
    let name = args.name.trim();
    if name.is_empty() {
        bail!("the scheme needs a name");
    }
    let criteria = args
        .criteria
        .iter()
        .map(|raw| parse_criterion(raw))
        .collect::<Result<Vec<_>>>()?;
    Ok(SchemeInput {
        name: name.to_string(),
        description: args
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        criteria,
    })
}

pub async fn list(client: &CliClient, list: &ListArgs) -> Result<()> {
    let page = client
        .call(&ListSchemes {
            page: PageRequest::new(list.page, list.per_page),
        })
        .await
        .context("failed to list marking schemes")?;
    let info = page.page_info();
    let mut rows = page.items;
    sort_local(&mut rows, list.sort_state(), sort_key)?;

    let mut table = TextTable::new(&["ID", "NAME", "CRITERIA", "TOTAL", "CREATED"]);
    for scheme in &rows {
        table.row(vec![
            scheme.id.clone(),
            scheme.name.clone(),
            scheme.criteria.len().to_string(),
            total_marks(scheme).to_string(),
            or_dash(scheme.created_at.as_deref()),
        ]);
    }
    println!("{}", table.render("No marking schemes yet."));
    println!("{}", pager_line(&info));
    Ok(())
}

pub async fn show(client: &CliClient, id: String) -> Result<()> {
    let scheme = client
        .call(&GetScheme { id: id.clone() })
        .await
        .with_context(|| format!("failed to load scheme {id}"))?;
    println!("{} ({} marks)", scheme.name, total_marks(&scheme));
    if let Some(description) = scheme.description.as_deref() {
        println!("{description}");
    }
    let mut table = TextTable::new(&["CRITERION", "MARKS", "DESCRIPTION"]);
    for criterion in &scheme.criteria {
        table.row(vec![
            criterion.name.clone(),
            criterion.max_marks.to_string(),
            criterion.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table.render("No criteria."));
    Ok(())
}

pub async fn save(client: &CliClient, id: Option<String>, args: &SchemeArgs) -> Result<()> {
    let input = scheme_input(args)?;
    let total = input.total_marks();
    let scheme = match id {
        Some(id) => client
            .call(&UpdateScheme { id, input })
            .await
            .context("failed to update scheme")?,
        None => client
            .call(&CreateScheme(input))
            .await
            .context("failed to create scheme")?,
    };
    tracing::info!(id = %scheme.id, "saved scheme \"{}\" worth {total} marks", scheme.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_parse_from_name_marks_pairs() {
        let criterion = parse_criterion(" Use of x=y notation = 2.5 ").unwrap();
        assert_eq!(criterion.name, "Use of x=y notation");
        assert!((criterion.max_marks - 2.5).abs() < f64::EPSILON);

        assert!(parse_criterion("Argument").is_err());
        assert!(parse_criterion("=4").is_err());
        assert!(parse_criterion("Argument=-1").is_err());
        assert!(parse_criterion("Argument=lots").is_err());
    }

    #[test]
    fn scheme_input_sums_criteria() {
        let args = SchemeArgs {
            name: "Essay".to_string(),
            description: Some("  ".to_string()),
            criteria: vec!["Argument=10".to_string(), "Style=5".to_string()],
        };
        let input = scheme_input(&args).unwrap();
        assert_eq!(input.description, None);
        assert!((input.total_marks() - 15.0).abs() < f64::EPSILON);
    }
}
