use markflow_shared::{
    endpoints::{CreateScheme, GetScheme, ListSchemes, UpdateScheme},
    models::{Criterion, MarkingScheme, SchemeInput},
    pagination::DEFAULT_PER_PAGE,
    PageRequest, SortValue,
};
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::{
    components::{
        data_table::{ColumnSpec, DataTable},
        error_banner::ErrorBanner,
        loading_spinner::LoadingSpinner,
    },
    hooks::{use_page_rows, use_resource, LoadMode},
    notices::{use_notify, Notice},
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct SchemesPageProps {
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct CriterionDraft {
    name: String,
    description: String,
    max_marks: String,
}

/// Editor contents. `editing` holds the id of the scheme being changed.
#[derive(Debug, Clone, PartialEq)]
struct SchemeForm {
    editing: Option<String>,
    name: String,
    description: String,
    criteria: Vec<CriterionDraft>,
}

impl Default for SchemeForm {
    fn default() -> Self {
        Self {
            editing: None,
            name: String::new(),
            description: String::new(),
            criteria: vec![CriterionDraft::default()],
        }
    }
}

impl SchemeForm {
    fn from_scheme(scheme: &MarkingScheme) -> Self {
        Self {
            editing: Some(scheme.id.clone()),
            name: scheme.name.clone(),
            description: scheme.description.clone().unwrap_or_default(),
            criteria: scheme
                .criteria
                .iter()
                .map(|criterion| CriterionDraft {
                    name: criterion.name.clone(),
                    description: criterion.description.clone().unwrap_or_default(),
                    max_marks: criterion.max_marks.to_string(),
                })
                .collect(),
        }
    }

    /// Sum of the criteria that already parse; shown live while editing.
    fn running_total(&self) -> f64 {
        self.criteria
            .iter()
            .filter_map(|criterion| criterion.max_marks.trim().parse::<f64>().ok())
            .filter(|marks| marks.is_finite())
            .sum()
    }

    fn to_input(&self) -> Result<SchemeInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("The scheme needs a name.".to_string());
        }
        if self.criteria.is_empty() {
            return Err("Add at least one criterion.".to_string());
        }
        let criteria = self
            .criteria
            .iter()
            .enumerate()
            .map(|(index, draft)| {
                let row = index + 1;
                let name = draft.name.trim();
                if name.is_empty() {
                    return Err(format!("Criterion {row} needs a name."));
                }
                let max_marks = draft
                    .max_marks
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|marks| marks.is_finite() && *marks > 0.0)
                    .ok_or_else(|| format!("Criterion {row} needs a positive mark."))?;
                let description = draft.description.trim();
                Ok(Criterion {
                    name: name.to_string(),
                    description: (!description.is_empty()).then(|| description.to_string()),
                    max_marks,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let description = self.description.trim();
        Ok(SchemeInput {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            criteria,
        })
    }
}

fn scheme_columns(on_edit: Callback<String>) -> Vec<ColumnSpec<MarkingScheme>> {
    vec![
        ColumnSpec::new("name", "Name", |scheme: &MarkingScheme| scheme.name.clone().into())
            .sortable(),
        ColumnSpec::new("criteria", "Criteria", |scheme: &MarkingScheme| {
            scheme.criteria.len().into()
        })
        .sortable(),
        ColumnSpec::new("total_marks", "Total marks", |scheme: &MarkingScheme| {
            scheme
                .total_marks
                .unwrap_or_else(|| scheme.criteria.iter().map(|c| c.max_marks).sum())
                .into()
        })
        .sortable(),
        ColumnSpec::new("created_at", "Created", |scheme: &MarkingScheme| {
            scheme.created_at.clone().into()
        })
        .sortable(),
        ColumnSpec::new("edit", "", |_: &MarkingScheme| SortValue::Null).render(move |scheme| {
            let on_edit = on_edit.clone();
            let id = scheme.id.clone();
            html! {
                <button type="button" class="text-sm text-[var(--primary)]" onclick={Callback::from(move |_: MouseEvent| on_edit.emit(id.clone()))}>
                    {"Edit"}
                </button>
            }
        }),
    ]
}

fn edit_field(
    form: &UseStateHandle<SchemeForm>,
    change: impl Fn(&mut SchemeForm, String) + 'static,
) -> Callback<InputEvent> {
    let form = form.clone();
    Callback::from(move |e: InputEvent| {
        let mut next = (*form).clone();
        change(&mut next, e.target_unchecked_into::<HtmlInputElement>().value());
        form.set(next);
    })
}

#[function_component(SchemesPage)]
pub fn schemes_page(props: &SchemesPageProps) -> Html {
    let page = use_state(|| 1usize);
    let form = use_state(SchemeForm::default);
    let busy = use_state(|| false);
    let notify = use_notify();

    let client = props.session.client.clone();
    let schemes = use_resource(*page, move |page: usize| {
        let client = client.clone();
        Box::pin(async move {
            client
                .call(&ListSchemes {
                    page: PageRequest::new(page, DEFAULT_PER_PAGE),
                })
                .await
        })
    });
    let (rows, page_info) = use_page_rows(schemes.data.clone());

    // Load the full scheme before editing; list rows may omit criteria.
    let on_edit = {
        let client = props.session.client.clone();
        let form = form.clone();
        let notify = notify.clone();
        Callback::from(move |id: String| {
            let client = client.clone();
            let form = form.clone();
            let notify = notify.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&GetScheme { id }).await {
                    Ok(scheme) => form.set(SchemeForm::from_scheme(&scheme)),
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
            });
        })
    };

    let on_submit = {
        let client = props.session.client.clone();
        let form = form.clone();
        let busy = busy.clone();
        let notify = notify.clone();
        let reload = schemes.reload.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let input = match form.to_input() {
                Ok(input) => input,
                Err(message) => {
                    notify.emit(Notice::error(message));
                    return;
                },
            };
            let editing = form.editing.clone();
            let client = client.clone();
            let form = form.clone();
            let busy = busy.clone();
            let notify = notify.clone();
            let reload = reload.clone();
            busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                let result = match editing {
                    Some(id) => client.call(&UpdateScheme { id, input }).await,
                    None => client.call(&CreateScheme(input)).await,
                };
                match result {
                    Ok(scheme) => {
                        notify.emit(Notice::success(format!("Saved scheme \"{}\".", scheme.name)));
                        form.set(SchemeForm::default());
                        reload.emit(LoadMode::Silent);
                    },
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
                busy.set(false);
            });
        })
    };

    let on_add_criterion = {
        let form = form.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*form).clone();
            next.criteria.push(CriterionDraft::default());
            form.set(next);
        })
    };
    let on_reset = {
        let form = form.clone();
        Callback::from(move |_: MouseEvent| form.set(SchemeForm::default()))
    };
    let on_page_change = {
        let page = page.clone();
        Callback::from(move |next: usize| page.set(next))
    };
    let on_retry = {
        let reload = schemes.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    let criteria_rows = form.criteria.iter().enumerate().map(|(index, criterion)| {
        let on_remove = {
            let form = form.clone();
            Callback::from(move |_: MouseEvent| {
                let mut next = (*form).clone();
                if index < next.criteria.len() {
                    next.criteria.remove(index);
                }
                form.set(next);
            })
        };
        html! {
            <div key={index} class="grid grid-cols-12 gap-2">
                <input class="form-input col-span-4" placeholder="Criterion" value={criterion.name.clone()}
                    oninput={edit_field(&form, move |form, value| {
                        if let Some(row) = form.criteria.get_mut(index) {
                            row.name = value;
                        }
                    })} />
                <input class="form-input col-span-5" placeholder="Description (optional)" value={criterion.description.clone()}
                    oninput={edit_field(&form, move |form, value| {
                        if let Some(row) = form.criteria.get_mut(index) {
                            row.description = value;
                        }
                    })} />
                <input class="form-input col-span-2" type="number" min="0" step="0.5" placeholder="Marks" value={criterion.max_marks.clone()}
                    oninput={edit_field(&form, move |form, value| {
                        if let Some(row) = form.criteria.get_mut(index) {
                            row.max_marks = value;
                        }
                    })} />
                <button type="button" class="col-span-1 text-sm text-red-600" onclick={on_remove}>{"Remove"}</button>
            </div>
        }
    });

    html! {
        <section class="space-y-6">
            <h1 class="text-2xl font-bold">{"Marking schemes"}</h1>
            if schemes.loading && schemes.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = schemes.error.clone() {
                <ErrorBanner {message} on_close={schemes.clear_error.clone()} {on_retry} />
            }
            <DataTable<MarkingScheme>
                data={rows}
                columns={scheme_columns(on_edit)}
                pagination={page_info}
                {on_page_change}
                loading={schemes.loading}
                empty_text="No marking schemes yet."
            />
            <form class="space-y-3 rounded-xl border border-[var(--border)] p-4" onsubmit={on_submit}>
                <h2 class="font-semibold">
                    { if form.editing.is_some() { "Edit scheme" } else { "New scheme" } }
                </h2>
                <input class="form-input w-full" placeholder="Scheme name" value={form.name.clone()}
                    oninput={edit_field(&form, |form, value| form.name = value)} />
                <input class="form-input w-full" placeholder="Description (optional)" value={form.description.clone()}
                    oninput={edit_field(&form, |form, value| form.description = value)} />
                { for criteria_rows }
                <div class="flex flex-wrap items-center justify-between gap-3">
                    <button type="button" class="btn-secondary" onclick={on_add_criterion}>{"Add criterion"}</button>
                    <span class="text-sm">{ format!("Total: {} marks", form.running_total()) }</span>
                </div>
                <div class="flex gap-2">
                    <button type="submit" class="btn-primary" disabled={*busy}>{"Save scheme"}</button>
                    if form.editing.is_some() {
                        <button type="button" class="btn-secondary" onclick={on_reset}>{"Cancel"}</button>
                    }
                </div>
            </form>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, marks: &str) -> CriterionDraft {
        CriterionDraft {
            name: name.to_string(),
            description: String::new(),
            max_marks: marks.to_string(),
        }
    }

    #[test]
    fn form_builds_scheme_input() {
        let form = SchemeForm {
            editing: None,
            name: " Essay ".to_string(),
            description: String::new(),
            criteria: vec![draft("Argument", "10"), draft("Style", "5.5")],
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.name, "Essay");
        assert_eq!(input.description, None);
        assert_eq!(input.criteria.len(), 2);
        assert!((input.total_marks() - 15.5).abs() < f64::EPSILON);
    }

    #[test]
    fn form_rejects_bad_criteria() {
        let mut form = SchemeForm {
            name: "Essay".to_string(),
            ..SchemeForm::default()
        };
        form.criteria = vec![draft("Argument", "0")];
        assert_eq!(form.to_input().unwrap_err(), "Criterion 1 needs a positive mark.");
        form.criteria = vec![draft("", "3")];
        assert_eq!(form.to_input().unwrap_err(), "Criterion 1 needs a name.");
        form.criteria.clear();
        assert!(form.to_input().is_err());
    }

    #[test]
    fn running_total_skips_unparsed_rows() {
        let form = SchemeForm {
            criteria: vec![draft("a", "4"), draft("b", "x"), draft("c", "")],
            ..SchemeForm::default()
        };
        assert!((form.running_total() - 4.0).abs() < f64::EPSILON);
    }
}
