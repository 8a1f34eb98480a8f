use markflow_shared::{ResourceStatus, StatusTone};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub status: ResourceStatus,
}

fn tone_classes(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Neutral => "bg-slate-100 text-slate-700",
        StatusTone::Progress => "bg-sky-100 text-sky-800",
        StatusTone::Success => "bg-emerald-100 text-emerald-800",
        StatusTone::Warning => "bg-amber-100 text-amber-800",
        StatusTone::Danger => "bg-red-100 text-red-800",
    }
}

#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    let class = props.status.class();
    html! {
        <span class={classes!(
            "inline-flex", "items-center", "gap-1", "rounded-full", "px-2.5", "py-0.5",
            "text-xs", "font-medium", tone_classes(props.status.tone())
        )}>
            if class.is_processing {
                <span class="h-2 w-2 rounded-full bg-current animate-pulse" aria-hidden="true" />
            }
            { class.display_label }
        </span>
    }
}
