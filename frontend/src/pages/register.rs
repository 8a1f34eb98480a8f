use markflow_shared::models::RegisterRequest;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::error_banner::ErrorBanner, pages::login::input_value, router::Route,
    session::Session,
};

const MIN_PASSWORD_LEN: usize = 8;

fn validate(name: &str, email: &str, password: &str, confirm: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err("Name and email are required.");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters.");
    }
    if password != confirm {
        return Err("Passwords do not match.");
    }
    Ok(())
}

#[function_component(RegisterPage)]
pub fn register_page() -> Html {
    let session = use_context::<Session>();
    let navigator = use_navigator();
    let name = use_state(String::new);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let confirm = use_state(String::new);
    let submitting = use_state(|| false);
    let error = use_state(|| None::<String>);

    if session.as_ref().is_some_and(Session::is_authenticated) {
        return html! { <Redirect<Route> to={Route::Groups} /> };
    }

    let onsubmit = {
        let name = name.clone();
        let email = email.clone();
        let password = password.clone();
        let confirm = confirm.clone();
        let submitting = submitting.clone();
        let error = error.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(session) = session.clone() else {
                return;
            };
            if let Err(message) = validate(&name, &email, &password, &confirm) {
                error.set(Some(message.to_string()));
                return;
            }
            let request = RegisterRequest {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: (*password).clone(),
            };
            let submitting = submitting.clone();
            let error = error.clone();
            let navigator = navigator.clone();
            submitting.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match session.client.register(request).await {
                    Ok(payload) => {
                        session.signed_in(payload.user);
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Groups);
                        }
                    },
                    Err(err) => error.set(Some(err.user_message())),
                }
                submitting.set(false);
            });
        })
    };

    let field = |label: &'static str, kind: &'static str, state: &UseStateHandle<String>| {
        let oninput = {
            let state = state.clone();
            Callback::from(move |e: InputEvent| state.set(input_value(&e)))
        };
        html! {
            <label class="block space-y-1">
                <span class="text-sm font-medium">{ label }</span>
                <input class="form-input w-full" type={kind} value={(**state).clone()} {oninput} />
            </label>
        }
    };
    let on_close = {
        let error = error.clone();
        Callback::from(move |_: ()| error.set(None))
    };

    html! {
        <section class="mx-auto max-w-md space-y-6">
            <h1 class="text-2xl font-bold">{"Create an account"}</h1>
            if let Some(message) = (*error).clone() {
                <ErrorBanner {message} {on_close} auto_dismiss={false} />
            }
            <form class="space-y-4" {onsubmit}>
                { field("Name", "text", &name) }
                { field("Email", "email", &email) }
                { field("Password", "password", &password) }
                { field("Confirm password", "password", &confirm) }
                <button type="submit" class="btn-primary w-full" disabled={*submitting}>
                    { if *submitting { "Creating account..." } else { "Register" } }
                </button>
            </form>
            <p class="text-sm text-[var(--muted)]">
                {"Already registered? "}
                <Link<Route> to={Route::Login}>{"Sign in"}</Link<Route>>
            </p>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_form_checks() {
        assert!(validate("Ann", "a@b.c", "longenough", "longenough").is_ok());
        assert_eq!(
            validate("Ann", "a@b.c", "short", "short"),
            Err("Password must be at least 8 characters.")
        );
        assert_eq!(
            validate("Ann", "a@b.c", "longenough", "different"),
            Err("Passwords do not match.")
        );
        assert!(validate(" ", "a@b.c", "longenough", "longenough").is_err());
    }
}
