use std::rc::Rc;

use markflow_shared::{
    table::sort_rows, PageInfo, RowSelection, SortDirection, SortState, SortValue,
};
use yew::prelude::*;

use crate::components::pagination::Pagination;

/// One column of a [`DataTable`].
pub struct ColumnSpec<T> {
    pub key: &'static str,
    pub title: &'static str,
    pub sortable: bool,
    /// Sort key; also the cell text when `render` is absent.
    pub value: Rc<dyn Fn(&T) -> SortValue>,
    pub render: Option<Rc<dyn Fn(&T) -> Html>>,
}

impl<T> ColumnSpec<T> {
    pub fn new(key: &'static str, title: &'static str, value: impl Fn(&T) -> SortValue + 'static) -> Self {
        Self {
            key,
            title,
            sortable: false,
            value: Rc::new(value),
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn render(mut self, render: impl Fn(&T) -> Html + 'static) -> Self {
        self.render = Some(Rc::new(render));
        self
    }

    fn cell(&self, row: &T) -> Html {
        match self.render.as_ref() {
            Some(render) => render(row),
            None => match (self.value)(row) {
                SortValue::Null => html! { <span class="text-[var(--muted)]">{"—"}</span> },
                SortValue::Bool(value) => html! { { if value { "Yes" } else { "No" } } },
                SortValue::Number(value) => html! { { value } },
                SortValue::Text(value) => html! { { value } },
            },
        }
    }
}

impl<T> Clone for ColumnSpec<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            title: self.title,
            sortable: self.sortable,
            value: self.value.clone(),
            render: self.render.clone(),
        }
    }
}

impl<T> PartialEq for ColumnSpec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.title == other.title && self.sortable == other.sortable
    }
}

#[derive(Properties, PartialEq)]
pub struct DataTableProps<T: PartialEq + 'static> {
    pub data: Rc<Vec<T>>,
    pub columns: Vec<ColumnSpec<T>>,
    #[prop_or_default]
    pub pagination: Option<PageInfo>,
    #[prop_or_default]
    pub on_page_change: Option<Callback<usize>>,
    /// Controlled sorting: the parent re-fetches in the emitted order.
    #[prop_or_default]
    pub on_sort: Option<Callback<String>>,
    #[prop_or_default]
    pub sort_field: Option<String>,
    #[prop_or_default]
    pub sort_direction: Option<SortDirection>,
    #[prop_or(false)]
    pub loading: bool,
    #[prop_or(false)]
    pub selectable: bool,
    #[prop_or_default]
    pub on_selection_change: Option<Callback<Vec<usize>>>,
    #[prop_or(AttrValue::from("Nothing here yet."))]
    pub empty_text: AttrValue,
}

const SKELETON_ROWS: usize = 5;

/// Row order for the uncontrolled table.
fn sorted_order<T>(data: &[T], columns: &[ColumnSpec<T>], sort: &SortState) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    let column = sort
        .field
        .as_deref()
        .and_then(|field| columns.iter().find(|column| column.key == field));
    if let Some(column) = column {
        sort_rows(&mut order, sort.direction, |index| (column.value)(&data[*index]));
    }
    order
}

#[function_component(DataTable)]
pub fn data_table<T>(props: &DataTableProps<T>) -> Html
where
    T: PartialEq + 'static,
{
    let local_sort = use_state(SortState::default);
    let selection = use_state(RowSelection::default);

    // New data identity drops the selection.
    {
        let selection = selection.clone();
        let on_selection_change = props.on_selection_change.clone();
        use_effect_with(Rc::as_ptr(&props.data) as usize, move |_| {
            if !selection.is_empty() {
                selection.set(RowSelection::default());
                if let Some(callback) = on_selection_change {
                    callback.emit(Vec::new());
                }
            }
            || ()
        });
    }

    let controlled = props.on_sort.is_some();
    let sort = if controlled {
        SortState {
            field: props.sort_field.clone(),
            direction: props.sort_direction.unwrap_or_default(),
        }
    } else {
        (*local_sort).clone()
    };

    let on_header_click = {
        let local_sort = local_sort.clone();
        let on_sort = props.on_sort.clone();
        move |field: &'static str| {
            let local_sort = local_sort.clone();
            let on_sort = on_sort.clone();
            Callback::from(move |_: MouseEvent| match on_sort.as_ref() {
                Some(on_sort) => on_sort.emit(field.to_string()),
                None => local_sort.set(local_sort.toggle(field)),
            })
        }
    };

    let update_selection = {
        let selection = selection.clone();
        let on_selection_change = props.on_selection_change.clone();
        move |next: RowSelection| {
            if let Some(callback) = on_selection_change.as_ref() {
                callback.emit(next.indices());
            }
            selection.set(next);
        }
    };

    let row_count = props.data.len();
    let toggle_all = {
        let selection = selection.clone();
        let update_selection = update_selection.clone();
        Callback::from(move |_: Event| {
            let mut next = (*selection).clone();
            next.toggle_all(row_count);
            update_selection(next);
        })
    };

    let header = html! {
        <tr>
            if props.selectable {
                <th class="w-10 px-3 py-2">
                    <input
                        type="checkbox"
                        aria-label="Select all rows"
                        checked={row_count > 0 && selection.is_all_selected(row_count)}
                        onchange={toggle_all}
                    />
                </th>
            }
            { for props.columns.iter().map(|column| {
                let indicator = match sort.direction_of(column.key) {
                    Some(SortDirection::Asc) => "▲",
                    Some(SortDirection::Desc) => "▼",
                    None => "",
                };
                if column.sortable {
                    html! {
                        <th key={column.key} class="px-3 py-2 text-left">
                            <button type="button" class="inline-flex items-center gap-1 font-semibold hover:text-[var(--primary)]" onclick={on_header_click(column.key)}>
                                { column.title }
                                <span aria-hidden="true">{ indicator }</span>
                            </button>
                        </th>
                    }
                } else {
                    html! { <th key={column.key} class="px-3 py-2 text-left font-semibold">{ column.title }</th> }
                }
            }) }
        </tr>
    };

    let column_span = props.columns.len() + usize::from(props.selectable);

    let body = if props.loading {
        html! {
            { for (0..SKELETON_ROWS).map(|row| html! {
                <tr key={row} class="animate-pulse">
                    <td colspan={column_span.to_string()} class="px-3 py-3">
                        <div class="h-4 w-full rounded bg-[var(--border)]" />
                    </td>
                </tr>
            }) }
        }
    } else if props.data.is_empty() {
        html! {
            <tr>
                <td colspan={column_span.to_string()} class="px-3 py-10 text-center text-[var(--muted)]">
                    { props.empty_text.clone() }
                </td>
            </tr>
        }
    } else {
        let order = if controlled {
            (0..props.data.len()).collect()
        } else {
            sorted_order(&props.data, &props.columns, &sort)
        };
        html! {
            { for order.into_iter().map(|index| {
                let row = &props.data[index];
                let toggle_row = {
                    let selection = selection.clone();
                    let update_selection = update_selection.clone();
                    Callback::from(move |_: Event| {
                        let mut next = (*selection).clone();
                        next.toggle(index);
                        update_selection(next);
                    })
                };
                html! {
                    <tr key={index} class="border-t border-[var(--border)] hover:bg-[var(--surface-hover)]">
                        if props.selectable {
                            <td class="px-3 py-2">
                                <input
                                    type="checkbox"
                                    aria-label="Select row"
                                    checked={selection.contains(index)}
                                    onchange={toggle_row}
                                />
                            </td>
                        }
                        { for props.columns.iter().map(|column| html! {
                            <td key={column.key} class="px-3 py-2">{ column.cell(row) }</td>
                        }) }
                    </tr>
                }
            }) }
        }
    };

    let pager = match (props.pagination, props.on_page_change.clone()) {
        (Some(info), Some(on_page_change)) => html! {
            <div class="mt-4">
                <Pagination
                    current_page={info.page}
                    total_pages={info.total_pages}
                    total={Some(info.total)}
                    on_page_change={on_page_change}
                />
            </div>
        },
        _ => Html::default(),
    };

    html! {
        <div class="w-full">
            <div class="overflow-x-auto rounded-xl border border-[var(--border)]">
                <table class="min-w-full text-sm" aria-busy={props.loading.to_string()}>
                    <thead class="bg-[var(--surface)]">{ header }</thead>
                    <tbody>{ body }</tbody>
                </table>
            </div>
            { pager }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq)]
    struct Row {
        name: &'static str,
        score: Option<f64>,
    }

    fn columns() -> Vec<ColumnSpec<Row>> {
        vec![
            ColumnSpec::new("name", "Name", |row: &Row| row.name.into()).sortable(),
            ColumnSpec::new("score", "Score", |row: &Row| row.score.into()).sortable(),
        ]
    }

    #[test]
    fn unsorted_table_keeps_server_order() {
        let rows = vec![Row { name: "b", score: None }, Row { name: "a", score: None }];
        assert_eq!(sorted_order(&rows, &columns(), &SortState::default()), vec![0, 1]);
    }

    #[test]
    fn sorting_by_column_orders_indices() {
        let rows = vec![
            Row { name: "carol", score: Some(7.0) },
            Row { name: "Alice", score: None },
            Row { name: "bob", score: Some(3.0) },
        ];
        let sort = SortState::default().toggle("name");
        assert_eq!(sorted_order(&rows, &columns(), &sort), vec![1, 2, 0]);

        let sort = SortState::by("score", SortDirection::Desc);
        assert_eq!(sorted_order(&rows, &columns(), &sort), vec![0, 2, 1]);
    }
}
