use yew::prelude::*;

#[derive(Clone, PartialEq)]
pub enum SpinnerSize {
    Small,
    Medium,
}

impl SpinnerSize {
    fn dimension(&self) -> u32 {
        match self {
            SpinnerSize::Small => 20,
            SpinnerSize::Medium => 40,
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct LoadingSpinnerProps {
    #[prop_or(SpinnerSize::Medium)]
    pub size: SpinnerSize,
    /// Blocking overlay over the whole page.
    #[prop_or(false)]
    pub fullscreen: bool,
}

#[function_component(LoadingSpinner)]
pub fn loading_spinner(props: &LoadingSpinnerProps) -> Html {
    let spinner_style = format!("--spinner-size:{}px;", props.size.dimension());

    let spinner = html! {
        <div
            class={classes!("flex", "items-center", "justify-center", "p-4")}
            role="status"
            aria-live="polite"
            aria-busy="true"
        >
            <div
                style={spinner_style}
                class={classes!(
                    "w-[var(--spinner-size)]",
                    "h-[var(--spinner-size)]",
                    "rounded-full",
                    "border-[3px]",
                    "border-[var(--border)]",
                    "border-t-[var(--primary)]",
                    "animate-spin"
                )}
            />
            <span class={classes!("sr-only")}>{ "Loading..." }</span>
        </div>
    };

    if props.fullscreen {
        html! {
            <div class="loading-spinner-overlay fixed inset-0 z-40 flex items-center justify-center bg-black/30">
                { spinner }
            </div>
        }
    } else {
        spinner
    }
}
