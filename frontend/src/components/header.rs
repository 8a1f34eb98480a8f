use yew::prelude::*;
use yew_router::prelude::*;

use crate::{router::Route, session::Session};

#[function_component(Header)]
pub fn header() -> Html {
    let session = use_context::<Session>();
    let navigator = use_navigator();

    let Some(session) = session else {
        return html! {};
    };

    let account = if session.is_authenticated() {
        let label = session
            .state
            .user
            .as_ref()
            .map(|user| user.display_name().to_string())
            .unwrap_or_else(|| "Signed in".to_string());
        let on_logout = {
            let session = session.clone();
            Callback::from(move |_: MouseEvent| {
                session.logout();
                if let Some(navigator) = navigator.as_ref() {
                    navigator.push(&Route::Login);
                }
            })
        };
        html! {
            <div class="flex items-center gap-3 text-sm">
                <span class="text-[var(--muted)]">{ label }</span>
                <button type="button" class="rounded-lg border border-[var(--border)] px-3 py-1 hover:border-[var(--primary)]" onclick={on_logout}>
                    {"Sign out"}
                </button>
            </div>
        }
    } else {
        html! {
            <div class="flex items-center gap-3 text-sm">
                <Link<Route> to={Route::Login}>{"Sign in"}</Link<Route>>
                <Link<Route> to={Route::Register}>{"Register"}</Link<Route>>
            </div>
        }
    };

    html! {
        <header class="sticky top-0 z-30 border-b border-[var(--border)] bg-[var(--surface)]">
            <div class="mx-auto flex max-w-6xl items-center justify-between px-4 py-3">
                <nav class="flex items-center gap-5 font-semibold">
                    <Link<Route> to={Route::Groups} classes="text-lg">{"MarkFlow"}</Link<Route>>
                    if session.is_authenticated() {
                        <Link<Route> to={Route::Groups}>{"Groups"}</Link<Route>>
                        <Link<Route> to={Route::Schemes}>{"Marking schemes"}</Link<Route>>
                    }
                </nav>
                { account }
            </div>
        </header>
    }
}
