use std::{cell::RefCell, rc::Rc};

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Interval;
use markflow_shared::{
    pagination::{clamp_page, page_slice, total_pages},
    ApiError, BoundedPoll, PageInfo, Paginated, PollController, PollProfile, PollTransition, RequestSequence,
};
use yew::prelude::*;
use yew_hooks::prelude::use_interval;

/// How a fetch presents itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Initial or user-triggered load: loading overlay, errors shown in the
    /// banner.
    Blocking,
    /// Poll-driven refresh: no overlay, errors only logged.
    Silent,
}

/// State of one fetched resource.
pub struct Resource<T> {
    pub data: Option<Rc<T>>,
    pub loading: bool,
    pub error: Option<String>,
    pub reload: Callback<LoadMode>,
    pub clear_error: Callback<()>,
}

type Fetcher<D, T> = Rc<dyn Fn(D) -> LocalBoxFuture<'static, Result<T, ApiError>>>;

/// Fetch with `fetch(deps)` whenever `deps` change, keeping only the newest
/// response.
///
/// Every fetch takes a [`RequestSequence`] ticket; a response whose ticket is
/// no longer the latest (a newer page, a newer silent refresh, or an unmounted
/// component) is dropped. Silent refreshes are skipped while a blocking load
/// is pending, so a failed load still reaches the error banner.
#[hook]
pub fn use_resource<T, D, F>(deps: D, fetch: F) -> Resource<T>
where
    T: 'static,
    D: PartialEq + Clone + 'static,
    F: Fn(D) -> LocalBoxFuture<'static, Result<T, ApiError>> + 'static,
{
    let data = use_state(|| None::<Rc<T>>);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let sequence = use_request_sequence();
    let latest_deps = use_mut_ref(|| deps.clone());
    let fetcher = use_mut_ref(|| None::<Fetcher<D, T>>);
    *fetcher.borrow_mut() = Some(Rc::new(fetch));
    *latest_deps.borrow_mut() = deps.clone();

    let reload = {
        let data = data.clone();
        let loading = loading.clone();
        let error = error.clone();
        let sequence = sequence.clone();
        let fetcher = fetcher.clone();
        let latest_deps = latest_deps.clone();
        Callback::from(move |mode: LoadMode| {
            let Some(fetch) = fetcher.borrow().clone() else {
                return;
            };
            let ticket = match mode {
                LoadMode::Blocking => {
                    loading.set(true);
                    error.set(None);
                    sequence.borrow_mut().issue_blocking()
                },
                // A blocking load is pending; its outcome is what the user sees.
                LoadMode::Silent => match sequence.borrow_mut().issue_silent() {
                    Some(ticket) => ticket,
                    None => return,
                },
            };
            let future = fetch(latest_deps.borrow().clone());
            let data = data.clone();
            let loading = loading.clone();
            let error = error.clone();
            let sequence = sequence.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = future.await;
                if !sequence.borrow_mut().settle(ticket) {
                    return;
                }
                match result {
                    Ok(value) => {
                        data.set(Some(Rc::new(value)));
                        error.set(None);
                    },
                    Err(err) if mode == LoadMode::Blocking => {
                        web_sys::console::error_1(&format!("Failed to load: {}", err).into());
                        error.set(Some(err.user_message()));
                    },
                    Err(err) => {
                        web_sys::console::warn_1(&format!("Silent refresh failed: {}", err).into());
                    },
                }
                loading.set(false);
            });
        })
    };

    {
        let reload = reload.clone();
        use_effect_with(deps, move |_| {
            reload.emit(LoadMode::Blocking);
            || ()
        });
    }
    {
        let sequence = sequence.clone();
        use_effect_with((), move |_| move || sequence.borrow_mut().invalidate());
    }

    let clear_error = {
        let error = error.clone();
        Callback::from(move |_: ()| error.set(None))
    };

    Resource {
        data: (*data).clone(),
        loading: *loading,
        error: (*error).clone(),
        reload,
        clear_error,
    }
}

/// Latest-wins fence shared by a component's fetches.
#[hook]
pub fn use_request_sequence() -> Rc<RefCell<RequestSequence>> {
    use_mut_ref(RequestSequence::new)
}

/// Silent refresh while anything on screen is still processing.
///
/// Feeds `processing` into a [`PollController`] after every render and holds
/// at most one `gloo` interval. Unmounting tears the controller down and drops
/// the interval, so a response arriving later cannot re-arm it.
#[hook]
pub fn use_status_polling(processing: bool, profile: PollProfile, refetch: Callback<()>) {
    let controller = use_mut_ref(PollController::new);
    let timer = use_mut_ref(|| None::<Interval>);
    let latest_refetch = use_mut_ref(|| refetch.clone());
    *latest_refetch.borrow_mut() = refetch;

    {
        let controller = controller.clone();
        let timer = timer.clone();
        use_effect_with(processing, move |processing| {
            match controller.borrow_mut().observe_flag(*processing) {
                PollTransition::Arm => {
                    let latest_refetch = latest_refetch.clone();
                    *timer.borrow_mut() = Some(Interval::new(profile.period_ms(), move || {
                        latest_refetch.borrow().emit(());
                    }));
                },
                PollTransition::Disarm => drop(timer.borrow_mut().take()),
                PollTransition::Unchanged => {},
            }
            || ()
        });
    }

    use_effect_with((), move |_| {
        move || {
            controller.borrow_mut().teardown();
            drop(timer.borrow_mut().take());
        }
    });
}

/// Fixed-budget poll after a one-off action such as redo OCR.
///
/// Returns a callback starting (or restarting) the budget and whether the poll
/// is running. Status is ignored: the poll stops when the ticks run out.
#[hook]
pub fn use_bounded_poll(refetch: Callback<()>) -> (Callback<()>, bool) {
    let budget = use_mut_ref(|| None::<BoundedPoll>);
    let active = use_state(|| false);
    let period = budget
        .borrow()
        .as_ref()
        .map(BoundedPoll::period_ms)
        .unwrap_or_default();

    {
        let budget = budget.clone();
        let active_handle = active.clone();
        use_interval(
            move || {
                let ticked = budget.borrow_mut().as_mut().is_some_and(BoundedPoll::tick);
                if ticked {
                    refetch.emit(());
                } else {
                    budget.borrow_mut().take();
                    active_handle.set(false);
                }
            },
            if *active { period } else { 0 },
        );
    }

    let start = {
        let active = active.clone();
        Callback::from(move |_: ()| {
            *budget.borrow_mut() = Some(BoundedPoll::default());
            active.set(true);
        })
    };

    (start, *active)
}

/// Paginate a vector already held in memory.
#[hook]
pub fn use_pagination<T>(items: Vec<T>, per_page: usize) -> (Vec<T>, usize, usize, Callback<usize>)
where
    T: Clone + PartialEq + 'static,
{
    let per_page = per_page.max(1);
    let pages = total_pages(items.len(), per_page).max(1);
    let current_page = use_state(|| 1usize);

    {
        let current_page = current_page.clone();
        use_effect_with(pages, move |pages| {
            let safe_page = clamp_page(*current_page, *pages);
            if safe_page != *current_page {
                current_page.set(safe_page);
            }
            || ()
        });
    }

    let visible = {
        let page = *current_page;
        use_memo((items, page, per_page), |(items, page, per_page)| {
            page_slice(items, *page, *per_page).to_vec()
        })
    };

    let go_to_page = {
        let current_page = current_page.clone();
        Callback::from(move |page: usize| {
            let next_page = clamp_page(page, pages);
            if next_page != *current_page {
                current_page.set(next_page);
            }
        })
    };

    ((*visible).clone(), clamp_page(*current_page, pages), pages, go_to_page)
}

/// Rows and position of a fetched page. The rows keep their `Rc` identity
/// until the page content changes, so table selection survives re-renders.
#[hook]
pub fn use_page_rows<T>(page: Option<Rc<Paginated<T>>>) -> (Rc<Vec<T>>, Option<PageInfo>)
where
    T: Clone + PartialEq + 'static,
{
    let info = page.as_ref().map(|page| page.page_info());
    let rows = use_memo(page, |page| {
        page.as_ref()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    });
    (rows, info)
}
