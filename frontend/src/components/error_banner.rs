use yew::prelude::*;
use yew::use_effect_with;
use yew_hooks::prelude::use_timeout;

#[derive(Properties, PartialEq)]
pub struct ErrorBannerProps {
    pub message: String,
    #[prop_or_default]
    pub on_close: Option<Callback<()>>,
    /// Shows a retry button; a banner with retry never auto-dismisses.
    #[prop_or_default]
    pub on_retry: Option<Callback<()>>,
    #[prop_or(true)]
    pub auto_dismiss: bool,
}

#[function_component(ErrorBanner)]
pub fn error_banner(props: &ErrorBannerProps) -> Html {
    let is_open = use_state(|| true);
    let auto_dismiss = props.auto_dismiss && props.on_retry.is_none();

    let dismiss = {
        let is_open = is_open.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_| {
            if !*is_open {
                return;
            }
            is_open.set(false);
            if let Some(cb) = on_close.as_ref() {
                cb.emit(());
            }
        })
    };

    let auto_timeout = {
        let dismiss = dismiss.clone();
        use_timeout(move || dismiss.emit(()), if auto_dismiss { 3000 } else { 0 })
    };

    {
        let is_open = is_open.clone();
        use_effect_with(props.message.clone(), move |_| {
            is_open.set(true);
        });
    }

    {
        let auto_timeout = auto_timeout.clone();
        use_effect_with(
            (*is_open, auto_dismiss, props.message.clone()),
            move |(visible, auto_dismiss, _message)| {
                if *auto_dismiss && *visible {
                    auto_timeout.reset();
                } else {
                    auto_timeout.cancel();
                }
            },
        );
    }

    if props.message.trim().is_empty() || !*is_open {
        return Html::default();
    }

    let close_button = {
        let dismiss = dismiss.clone();
        Callback::from(move |_| dismiss.emit(()))
    };

    let retry_button = props.on_retry.clone().map(|on_retry| {
        let onclick = Callback::from(move |_: MouseEvent| on_retry.emit(()));
        html! {
            <button
                type="button"
                class="mt-2 rounded-lg border border-current px-3 py-1 text-sm font-semibold hover:bg-black/5"
                {onclick}
            >
                {"Try again"}
            </button>
        }
    });

    html! {
        <div
            class={classes!(
                "error-banner", "flex", "items-start", "gap-3", "rounded-2xl", "px-5", "py-4",
                "text-sm", "shadow-xl", "w-full", "max-w-2xl", "bg-red-50", "text-red-900"
            )}
            role="alert"
            aria-live="assertive"
        >
            <span class="text-2xl" aria-hidden="true">{"⚠️"}</span>
            <div class="flex-1 space-y-1">
                <p class="font-semibold text-base">{"Something went wrong"}</p>
                <p>{ props.message.clone() }</p>
                { for retry_button }
            </div>
            <button
                type="button"
                class="ml-4 inline-flex h-8 w-8 items-center justify-center rounded-full text-lg hover:bg-black/10"
                aria-label="Dismiss error"
                onclick={close_button}
            >
                {"×"}
            </button>
        </div>
    }
}
