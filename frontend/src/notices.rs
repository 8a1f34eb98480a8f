use std::rc::Rc;

use yew::prelude::*;
use yew_hooks::prelude::use_timeout;

/// Toasts stay this long unless closed.
const NOTICE_TIMEOUT_MS: u32 = 4000;
/// Older toasts are dropped beyond this many.
const MAX_NOTICES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeStack {
    next_id: u64,
    entries: Vec<(u64, Notice)>,
}

pub enum NoticeAction {
    Push(Notice),
    Dismiss(u64),
}

impl Reducible for NoticeStack {
    type Action = NoticeAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            NoticeAction::Push(notice) => {
                next.entries.push((next.next_id, notice));
                next.next_id += 1;
                if next.entries.len() > MAX_NOTICES {
                    let overflow = next.entries.len() - MAX_NOTICES;
                    next.entries.drain(..overflow);
                }
            },
            NoticeAction::Dismiss(id) => next.entries.retain(|(entry, _)| *entry != id),
        }
        Rc::new(next)
    }
}

pub type NoticeContext = UseReducerHandle<NoticeStack>;

/// Callback that pushes a toast; a no-op outside [`NoticeProvider`].
#[hook]
pub fn use_notify() -> Callback<Notice> {
    let ctx = use_context::<NoticeContext>();
    Callback::from(move |notice: Notice| {
        if let Some(ctx) = ctx.as_ref() {
            ctx.dispatch(NoticeAction::Push(notice));
        }
    })
}

#[derive(Properties, PartialEq)]
pub struct NoticeProviderProps {
    pub children: Html,
}

#[function_component(NoticeProvider)]
pub fn notice_provider(props: &NoticeProviderProps) -> Html {
    let stack = use_reducer(NoticeStack::default);
    let toasts = stack.entries.iter().map(|(id, notice)| {
        html! { <Toast key={*id} id={*id} notice={notice.clone()} stack={stack.clone()} /> }
    });

    html! {
        <ContextProvider<NoticeContext> context={stack.clone()}>
            {props.children.clone()}
            <div class="fixed bottom-4 right-4 z-50 flex flex-col gap-2" aria-live="polite">
                { for toasts }
            </div>
        </ContextProvider<NoticeContext>>
    }
}

#[derive(Properties, PartialEq)]
struct ToastProps {
    id: u64,
    notice: Notice,
    stack: NoticeContext,
}

#[function_component(Toast)]
fn toast(props: &ToastProps) -> Html {
    let dismiss = {
        let stack = props.stack.clone();
        let id = props.id;
        Callback::from(move |_: ()| stack.dispatch(NoticeAction::Dismiss(id)))
    };
    {
        let dismiss = dismiss.clone();
        use_timeout(move || dismiss.emit(()), NOTICE_TIMEOUT_MS);
    }

    let tone = match props.notice.kind {
        NoticeKind::Success => "border-emerald-500 bg-emerald-50 text-emerald-900",
        NoticeKind::Error => "border-red-500 bg-red-50 text-red-900",
        NoticeKind::Info => "border-sky-500 bg-sky-50 text-sky-900",
    };
    let onclick = Callback::from(move |_: MouseEvent| dismiss.emit(()));

    html! {
        <div class={classes!("flex", "items-start", "gap-3", "rounded-xl", "border-l-4", "px-4", "py-3", "shadow-lg", "max-w-sm", tone)} role="status">
            <p class="flex-1 text-sm">{ props.notice.text.clone() }</p>
            <button type="button" class="text-lg leading-none" aria-label="Dismiss" {onclick}>{"×"}</button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_keeps_newest_notices() {
        let mut stack = Rc::new(NoticeStack::default());
        for n in 0..6 {
            stack = stack.reduce(NoticeAction::Push(Notice::info(format!("n{n}"))));
        }
        assert_eq!(stack.entries.len(), MAX_NOTICES);
        assert_eq!(stack.entries[0].1.text, "n2");

        let first = stack.entries[0].0;
        let stack = stack.reduce(NoticeAction::Dismiss(first));
        assert_eq!(stack.entries.len(), MAX_NOTICES - 1);
        assert_eq!(stack.entries[0].1.text, "n3");
    }
}
