use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;

#[function_component(NotFoundPage)]
pub fn not_found_page() -> Html {
    html! {
        <section class="mx-auto max-w-md space-y-4 py-16 text-center">
            <h1 class="text-3xl font-bold">{"404"}</h1>
            <p class="text-[var(--muted)]">{"This page does not exist."}</p>
            <Link<Route> to={Route::Groups} classes="btn-primary">{"Back to groups"}</Link<Route>>
        </section>
    }
}
