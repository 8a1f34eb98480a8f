use markflow_shared::{pagination::clamp_page, PageInfo};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct PaginationProps {
    pub current_page: usize,
    pub total_pages: usize,
    pub on_page_change: Callback<usize>,
    #[prop_or_default]
    pub total: Option<usize>,
}

#[function_component(Pagination)]
pub fn pagination(props: &PaginationProps) -> Html {
    if props.total_pages <= 1 {
        return Html::default();
    }

    let total_pages = props.total_pages;
    let info = PageInfo {
        page: clamp_page(props.current_page, total_pages),
        per_page: 0,
        total: props.total.unwrap_or_default(),
        total_pages,
    };
    let current_page = info.page;
    let controls = info.controls();

    // Every emitted page goes through the clamp, whatever the button.
    let go = {
        let on_page_change = props.on_page_change.clone();
        move |page: usize| {
            let on_page_change = on_page_change.clone();
            Callback::from(move |_: MouseEvent| {
                on_page_change.emit(clamp_page(page, total_pages));
            })
        }
    };

    let base_btn_classes = classes!(
        "inline-flex",
        "items-center",
        "justify-center",
        "min-w-[2.5rem]",
        "h-10",
        "px-3",
        "rounded-lg",
        "border",
        "border-[var(--border)]",
        "bg-[var(--surface)]",
        "text-[var(--text)]",
        "text-sm",
        "font-semibold",
        "shadow-sm",
        "transition-all",
        "duration-200",
        "hover:border-[var(--primary)]",
        "hover:text-[var(--primary)]",
        "disabled:opacity-50",
        "disabled:cursor-not-allowed"
    );

    let edge_button = |label: &'static str, aria: &'static str, enabled: bool, target: usize| {
        html! {
            <button
                type="button"
                class={base_btn_classes.clone()}
                disabled={!enabled}
                onclick={go(target)}
                aria-label={aria}
            >
                { label }
            </button>
        }
    };

    html! {
        <nav class="flex flex-wrap items-center gap-2" aria-label="Pagination">
            { edge_button("«", "First page", controls.first, 1) }
            { edge_button("‹", "Previous page", controls.prev, current_page.saturating_sub(1)) }
            { for info.window().map(|page| {
                let active = page == current_page;
                let page_classes = classes!(
                    base_btn_classes.clone(),
                    active.then_some("bg-[var(--primary)] text-white border-transparent pointer-events-none")
                );
                html! {
                    <button
                        key={format!("page-{page}")}
                        type="button"
                        class={page_classes}
                        aria-label={format!("Go to page {page}")}
                        aria-current={active.then_some(AttrValue::from("page"))}
                        disabled={active}
                        onclick={go(page)}
                    >
                        { page }
                    </button>
                }
            }) }
            { edge_button("›", "Next page", controls.next, current_page + 1) }
            { edge_button("»", "Last page", controls.last, total_pages) }
            if let Some(total) = props.total {
                <span class="ml-2 text-sm text-[var(--muted)]">
                    { format!("Page {current_page} of {total_pages} · {total} items") }
                </span>
            }
        </nav>
    }
}
