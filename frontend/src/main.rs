//! Browser front end for MarkFlow: upload exam scripts, review OCR text,
//! manage marking schemes and follow AI marking jobs.

mod api;
mod components;
mod config;
mod hooks;
mod notices;
mod pages;
mod router;
mod session;
mod storage;

use yew::prelude::*;

#[function_component(App)]
fn app() -> Html {
    html! {
        <session::SessionProvider>
            <notices::NoticeProvider>
                <router::AppRouter />
            </notices::NoticeProvider>
        </session::SessionProvider>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
