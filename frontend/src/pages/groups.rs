use markflow_shared::{
    endpoints::{CreateGroup, DeleteGroup, ListGroups},
    models::{Group, GroupKind, NewGroup},
    pagination::DEFAULT_PER_PAGE,
    PageRequest, SortState, SortValue,
};
use web_sys::HtmlSelectElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{
        data_table::{ColumnSpec, DataTable},
        error_banner::ErrorBanner,
        loading_spinner::LoadingSpinner,
    },
    hooks::{use_page_rows, use_resource, LoadMode},
    notices::{use_notify, Notice},
    pages::login::input_value,
    router::Route,
    session::Session,
};

#[derive(Properties, PartialEq)]
pub struct GroupsPageProps {
    pub session: Session,
}

fn group_columns() -> Vec<ColumnSpec<Group>> {
    vec![
        ColumnSpec::new("name", "Name", |group: &Group| group.name.clone().into())
            .sortable()
            .render(|group| {
                html! {
                    <Link<Route> to={Route::GroupUploads { group_id: group.id.clone() }} classes="font-semibold hover:text-[var(--primary)]">
                        { group.name.clone() }
                    </Link<Route>>
                }
            }),
        ColumnSpec::new("group_type", "Type", |group: &Group| group.group_type.as_str().into()),
        ColumnSpec::new("upload_count", "Uploads", |group: &Group| group.upload_count.into())
            .sortable(),
        ColumnSpec::new("created_at", "Created", |group: &Group| group.created_at.clone().into())
            .sortable(),
        ColumnSpec::new("jobs", "", |_: &Group| SortValue::Null).render(|group| {
            html! {
                <Link<Route> to={Route::MarkingJobs { group_id: group.id.clone() }} classes="text-sm text-[var(--primary)]">
                    {"Marking jobs"}
                </Link<Route>>
            }
        }),
    ]
}

#[function_component(GroupsPage)]
pub fn groups_page(props: &GroupsPageProps) -> Html {
    let page = use_state(|| 1usize);
    let sort = use_state(SortState::default);
    let selected = use_state(Vec::<usize>::new);
    let new_name = use_state(String::new);
    let new_kind = use_state(GroupKind::default);
    let busy = use_state(|| false);
    let notify = use_notify();

    let client = props.session.client.clone();
    let groups = use_resource((*page, (*sort).clone()), move |(page, sort): (usize, SortState)| {
        let client = client.clone();
        Box::pin(async move {
            client
                .call(&ListGroups {
                    page: PageRequest::new(page, DEFAULT_PER_PAGE),
                    sort: sort.field.is_some().then_some(sort),
                })
                .await
        })
    });
    let (rows, page_info) = use_page_rows(groups.data.clone());

    let on_page_change = {
        let page = page.clone();
        Callback::from(move |next: usize| page.set(next))
    };
    let on_sort = {
        let sort = sort.clone();
        let page = page.clone();
        Callback::from(move |field: String| {
            sort.set(sort.toggle(&field));
            page.set(1);
        })
    };
    let on_selection_change = {
        let selected = selected.clone();
        Callback::from(move |indices: Vec<usize>| selected.set(indices))
    };

    let on_create = {
        let client = props.session.client.clone();
        let new_name = new_name.clone();
        let new_kind = new_kind.clone();
        let busy = busy.clone();
        let notify = notify.clone();
        let reload = groups.reload.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let name = new_name.trim().to_string();
            if name.is_empty() {
                notify.emit(Notice::error("Give the group a name."));
                return;
            }
            let request = CreateGroup(NewGroup {
                name,
                description: None,
                group_type: *new_kind,
            });
            let client = client.clone();
            let new_name = new_name.clone();
            let busy = busy.clone();
            let notify = notify.clone();
            let reload = reload.clone();
            busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match client.call(&request).await {
                    Ok(group) => {
                        notify.emit(Notice::success(format!("Created group \"{}\".", group.name)));
                        new_name.set(String::new());
                        reload.emit(LoadMode::Silent);
                    },
                    Err(err) => notify.emit(Notice::error(err.user_message())),
                }
                busy.set(false);
            });
        })
    };

    let on_delete = {
        let client = props.session.client.clone();
        let rows = rows.clone();
        let selected = selected.clone();
        let busy = busy.clone();
        let notify = notify.clone();
        let reload = groups.reload.clone();
        Callback::from(move |_: MouseEvent| {
            let ids: Vec<String> = selected
                .iter()
                .filter_map(|index| rows.get(*index).map(|group| group.id.clone()))
                .collect();
            if ids.is_empty() {
                return;
            }
            let client = client.clone();
            let busy = busy.clone();
            let notify = notify.clone();
            let reload = reload.clone();
            busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                let mut deleted = 0;
                for id in ids {
                    match client.call(&DeleteGroup { id }).await {
                        Ok(_) => deleted += 1,
                        Err(err) => notify.emit(Notice::error(err.user_message())),
                    }
                }
                if deleted > 0 {
                    notify.emit(Notice::success(format!("Deleted {deleted} group(s).")));
                }
                busy.set(false);
                reload.emit(LoadMode::Blocking);
            });
        })
    };

    let on_name = {
        let new_name = new_name.clone();
        Callback::from(move |e: InputEvent| new_name.set(input_value(&e)))
    };
    let on_kind = {
        let new_kind = new_kind.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            new_kind.set(if value == GroupKind::Batch.as_str() {
                GroupKind::Batch
            } else {
                GroupKind::Standard
            });
        })
    };
    let on_retry = {
        let reload = groups.reload.clone();
        Callback::from(move |_: ()| reload.emit(LoadMode::Blocking))
    };

    html! {
        <section class="space-y-6">
            <div class="flex flex-wrap items-end justify-between gap-4">
                <h1 class="text-2xl font-bold">{"Groups"}</h1>
                <form class="flex flex-wrap items-end gap-2" onsubmit={on_create}>
                    <input class="form-input" placeholder="New group name" value={(*new_name).clone()} oninput={on_name} />
                    <select class="form-select" onchange={on_kind}>
                        <option value="standard" selected={*new_kind == GroupKind::Standard}>{"Standard"}</option>
                        <option value="batch" selected={*new_kind == GroupKind::Batch}>{"Batch"}</option>
                    </select>
                    <button type="submit" class="btn-primary" disabled={*busy}>{"Create"}</button>
                </form>
            </div>
            if groups.loading && groups.data.is_none() {
                <LoadingSpinner fullscreen=true />
            }
            if let Some(message) = groups.error.clone() {
                <ErrorBanner {message} on_close={groups.clear_error.clone()} {on_retry} />
            }
            if !selected.is_empty() {
                <div class="flex items-center gap-3 text-sm">
                    <span>{ format!("{} selected", selected.len()) }</span>
                    <button type="button" class="btn-danger" disabled={*busy} onclick={on_delete}>{"Delete selected"}</button>
                </div>
            }
            <DataTable<Group>
                data={rows}
                columns={group_columns()}
                pagination={page_info}
                on_page_change={on_page_change}
                on_sort={on_sort}
                sort_field={sort.field.clone()}
                sort_direction={Some(sort.direction)}
                loading={groups.loading}
                selectable=true
                on_selection_change={on_selection_change}
                empty_text="No groups yet. Create one to start uploading scripts."
            />
        </section>
    }
}
