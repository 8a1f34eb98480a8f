use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{components::error_banner::ErrorBanner, router::Route, session::Session};

pub(crate) fn input_value(e: &InputEvent) -> String {
    e.target_unchecked_into::<HtmlInputElement>().value()
}

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let session = use_context::<Session>();
    let navigator = use_navigator();
    let email = use_state(String::new);
    let password = use_state(String::new);
    let submitting = use_state(|| false);
    let error = use_state(|| None::<String>);

    if session.as_ref().is_some_and(Session::is_authenticated) {
        return html! { <Redirect<Route> to={Route::Groups} /> };
    }

    let onsubmit = {
        let email = email.clone();
        let password = password.clone();
        let submitting = submitting.clone();
        let error = error.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(session) = session.clone() else {
                return;
            };
            if email.trim().is_empty() || password.is_empty() {
                error.set(Some("Enter your email and password.".to_string()));
                return;
            }
            let email = (*email).clone();
            let password = (*password).clone();
            let submitting = submitting.clone();
            let error = error.clone();
            let navigator = navigator.clone();
            submitting.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match session.client.login(&email, &password).await {
                    Ok(payload) => {
                        session.signed_in(payload.user);
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Groups);
                        }
                    },
                    Err(err) => {
                        web_sys::console::error_1(&format!("Sign-in failed: {}", err).into());
                        error.set(Some(err.user_message()));
                    },
                }
                submitting.set(false);
            });
        })
    };

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| email.set(input_value(&e)))
    };
    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| password.set(input_value(&e)))
    };
    let on_close = {
        let error = error.clone();
        Callback::from(move |_: ()| error.set(None))
    };

    html! {
        <section class="mx-auto max-w-md space-y-6">
            <h1 class="text-2xl font-bold">{"Sign in"}</h1>
            if let Some(message) = (*error).clone() {
                <ErrorBanner {message} {on_close} auto_dismiss={false} />
            }
            <form class="space-y-4" {onsubmit}>
                <label class="block space-y-1">
                    <span class="text-sm font-medium">{"Email"}</span>
                    <input class="form-input w-full" type="email" autocomplete="email" value={(*email).clone()} oninput={on_email} />
                </label>
                <label class="block space-y-1">
                    <span class="text-sm font-medium">{"Password"}</span>
                    <input class="form-input w-full" type="password" autocomplete="current-password" value={(*password).clone()} oninput={on_password} />
                </label>
                <button type="submit" class="btn-primary w-full" disabled={*submitting}>
                    { if *submitting { "Signing in..." } else { "Sign in" } }
                </button>
            </form>
            <p class="text-sm text-[var(--muted)]">
                {"No account yet? "}
                <Link<Route> to={Route::Register}>{"Register"}</Link<Route>>
            </p>
        </section>
    }
}
