use std::rc::Rc;

use markflow_shared::{endpoints::CurrentUser, models::User, ApiError};
use yew::prelude::*;

use crate::api::{new_client, FrontendClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Stored token found, `/auth/me` in flight.
    Hydrating,
    Anonymous,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub status: SessionStatus,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            status: SessionStatus::Hydrating,
        }
    }
}

pub enum SessionAction {
    /// Startup check finished; `None` user with a token still counts as
    /// signed in (e.g. `/auth/me` unreachable).
    Hydrated {
        signed_in: bool,
        user: Option<User>,
    },
    SignedIn(Option<User>),
    /// Refresh failed or the user logged out.
    SignedOut,
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let next = match action {
            SessionAction::Hydrated {
                signed_in,
                user,
            } => {
                // Ignore a late hydration once the user already signed in or out.
                if self.status != SessionStatus::Hydrating {
                    return self;
                }
                SessionState {
                    user,
                    status: if signed_in {
                        SessionStatus::Authenticated
                    } else {
                        SessionStatus::Anonymous
                    },
                }
            },
            SessionAction::SignedIn(user) => SessionState {
                user,
                status: SessionStatus::Authenticated,
            },
            SessionAction::SignedOut => SessionState {
                user: None,
                status: SessionStatus::Anonymous,
            },
        };
        Rc::new(next)
    }
}

/// API client plus the reducible session state, handed to every page.
#[derive(Clone)]
pub struct Session {
    pub client: Rc<FrontendClient>,
    pub state: UseReducerHandle<SessionState>,
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.client, &other.client) && self.state == other.state
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.state.status == SessionStatus::Authenticated
    }

    pub fn signed_in(&self, user: Option<User>) {
        self.state.dispatch(SessionAction::SignedIn(user));
    }

    pub fn logout(&self) {
        self.client.logout();
        self.state.dispatch(SessionAction::SignedOut);
    }
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub children: Html,
}

#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let state = use_reducer(SessionState::default);
    let client = {
        let dispatcher = state.dispatcher();
        use_memo((), move |_| {
            new_client(move || {
                web_sys::console::warn_1(&"session expired, signing out".into());
                dispatcher.dispatch(SessionAction::SignedOut);
            })
        })
    };

    {
        let client = client.clone();
        let dispatcher = state.dispatcher();
        use_effect_with((), move |_| {
            if client.is_authenticated() {
                wasm_bindgen_futures::spawn_local(async move {
                    match client.call(&CurrentUser).await {
                        Ok(user) => dispatcher.dispatch(SessionAction::Hydrated {
                            signed_in: true,
                            user: Some(user),
                        }),
                        // The expiry hook already signed the session out.
                        Err(ApiError::Unauthorized) => {},
                        Err(err) => {
                            web_sys::console::error_1(
                                &format!("Failed to load account: {}", err).into(),
                            );
                            dispatcher.dispatch(SessionAction::Hydrated {
                                signed_in: true,
                                user: None,
                            });
                        },
                    }
                });
            } else {
                dispatcher.dispatch(SessionAction::Hydrated {
                    signed_in: false,
                    user: None,
                });
            }
            || ()
        });
    }

    let session = Session {
        client,
        state,
    };

    html! {
        <ContextProvider<Session> context={session}>
            {props.children.clone()}
        </ContextProvider<Session>>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "1".to_string(),
            email: "t@example.com".to_string(),
            name: None,
        }
    }

    #[test]
    fn late_hydration_does_not_undo_sign_out() {
        let state = Rc::new(SessionState::default());
        let state = state.reduce(SessionAction::SignedOut);
        let state = state.reduce(SessionAction::Hydrated {
            signed_in: true,
            user: Some(user()),
        });
        assert_eq!(state.status, SessionStatus::Anonymous);
        assert!(state.user.is_none());
    }

    #[test]
    fn hydration_without_user_still_authenticates() {
        let state = Rc::new(SessionState::default()).reduce(SessionAction::Hydrated {
            signed_in: true,
            user: None,
        });
        assert_eq!(state.status, SessionStatus::Authenticated);
    }
}
