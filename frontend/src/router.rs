use yew::prelude::*;
use yew_router::prelude::*;

use crate::{
    components::{header::Header, loading_spinner::LoadingSpinner},
    pages,
    session::{Session, SessionStatus},
};

#[derive(Routable, Clone, PartialEq, Debug)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/login")]
    Login,
    #[at("/register")]
    Register,
    #[at("/groups")]
    Groups,
    #[at("/uploads/group/:group_id")]
    GroupUploads { group_id: String },
    #[at("/uploads/group/:group_id/batch/:batch_name")]
    Batch { group_id: String, batch_name: String },
    #[at("/uploads/:id")]
    UploadDetail { id: String },
    #[at("/schemes")]
    Schemes,
    #[at("/groups/:group_id/marking-jobs")]
    MarkingJobs { group_id: String },
    #[at("/marking-jobs/:job_id/results")]
    Results { job_id: String },
    #[not_found]
    #[at("/404")]
    NotFound,
}

#[derive(Properties, PartialEq)]
struct ProtectedProps {
    render: Callback<Session, Html>,
}

/// Renders its page only for a signed-in session; otherwise sends the user to
/// the login page.
#[function_component(Protected)]
fn protected_page(props: &ProtectedProps) -> Html {
    let Some(session) = use_context::<Session>() else {
        return html! {};
    };
    match session.state.status {
        SessionStatus::Hydrating => html! { <LoadingSpinner fullscreen=true /> },
        SessionStatus::Anonymous => html! { <Redirect<Route> to={Route::Login} /> },
        SessionStatus::Authenticated => props.render.emit(session),
    }
}

fn guarded(render: impl Fn(Session) -> Html + 'static) -> Html {
    html! { <Protected render={Callback::from(render)} /> }
}

fn switch(route: Route) -> Html {
    match route {
        Route::Home => html! { <Redirect<Route> to={Route::Groups} /> },
        Route::Login => html! { <pages::login::LoginPage /> },
        Route::Register => html! { <pages::register::RegisterPage /> },
        Route::Groups => guarded(|session| html! { <pages::groups::GroupsPage {session} /> }),
        Route::GroupUploads {
            group_id,
        } => guarded(move |session| {
            html! { <pages::group_uploads::GroupUploadsPage {session} group_id={group_id.clone()} /> }
        }),
        Route::Batch {
            group_id,
            batch_name,
        } => guarded(move |session| {
            html! {
                <pages::batch::BatchPage
                    {session}
                    group_id={group_id.clone()}
                    batch_name={batch_name.clone()}
                />
            }
        }),
        Route::UploadDetail {
            id,
        } => guarded(move |session| {
            html! { <pages::upload_detail::UploadDetailPage {session} id={id.clone()} /> }
        }),
        Route::Schemes => guarded(|session| html! { <pages::schemes::SchemesPage {session} /> }),
        Route::MarkingJobs {
            group_id,
        } => guarded(move |session| {
            html! { <pages::marking_jobs::MarkingJobsPage {session} group_id={group_id.clone()} /> }
        }),
        Route::Results {
            job_id,
        } => guarded(move |session| {
            html! { <pages::results::ResultsPage {session} job_id={job_id.clone()} /> }
        }),
        Route::NotFound => html! { <pages::not_found::NotFoundPage /> },
    }
}

#[function_component(AppRouter)]
pub fn app_router() -> Html {
    html! {
        <BrowserRouter>
            <div class="flex flex-col bg-[var(--bg)]" style="min-height: 100vh; min-height: 100svh;">
                <Header />
                <main class="mx-auto w-full max-w-6xl flex-1 px-4 py-6">
                    <Switch<Route> render={switch} />
                </main>
            </div>
        </BrowserRouter>
    }
}
