//! API client with bearer injection and one-shot token refresh.

use futures::lock::Mutex;

use crate::{
    endpoints::{decode, Endpoint, Login, Refresh, Register},
    error::ApiError,
    models::{AuthPayload, LoginRequest, RefreshRequest, RegisterRequest, TokenPair},
    session::TokenStore,
    transport::{ApiRequest, ApiResponse, Transport},
};

/// Versioned API root below a host base URL.
pub fn api_root(base: &str) -> String {
    format!("{}/api/v1", base.trim().trim_end_matches('/'))
}

type ExpiryHook = Box<dyn Fn()>;

/// Talks to the marking API over any [`Transport`], keeping credentials in a
/// [`TokenStore`].
///
/// A 401 on an authenticated request triggers exactly one refresh and one
/// replay. Concurrent 401s share a single refresh: the refresh path is
/// serialized, and a caller that finds the stored token already rotated
/// replays without refreshing again.
pub struct ApiClient<T, S> {
    root: String,
    transport: T,
    tokens: S,
    refresh_gate: Mutex<()>,
    on_session_expired: Option<ExpiryHook>,
}

impl<T, S> ApiClient<T, S>
where
    T: Transport,
    S: TokenStore,
{
    /// Client for the API under `root` (see [`api_root`]).
    pub fn new(root: impl Into<String>, transport: T, tokens: S) -> Self {
        Self {
            root: root.into(),
            transport,
            tokens,
            refresh_gate: Mutex::new(()),
            on_session_expired: None,
        }
    }

    /// Run `hook` whenever the session is dropped because refresh failed.
    pub fn with_session_expired_hook(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_session_expired = Some(Box::new(hook));
        self
    }

    /// API root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Underlying token store.
    pub fn tokens(&self) -> &S {
        &self.tokens
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True while a bearer token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.access_token().is_some()
    }

    /// Perform `endpoint` and decode its payload.
    pub async fn call<E: Endpoint>(&self, endpoint: &E) -> Result<E::Output, ApiError> {
        let request = endpoint.request()?;
        let response = self.execute(request).await?;
        decode::<E>(response.status, &response.body)
    }

    /// Sign in and store the returned tokens.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        let payload = self
            .call(&Login(LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            }))
            .await?;
        self.tokens.save(&payload.tokens());
        tracing::info!("signed in");
        Ok(payload)
    }

    /// Create an account and store the returned tokens.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthPayload, ApiError> {
        let payload = self.call(&Register(request)).await?;
        self.tokens.save(&payload.tokens());
        tracing::info!("account registered");
        Ok(payload)
    }

    /// Forget the stored tokens.
    pub fn logout(&self) {
        self.tokens.clear();
        tracing::info!("signed out");
    }

    async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = request.url(&self.root);
        loop {
            let bearer = if request.authenticated {
                self.tokens.access_token()
            } else {
                None
            };
            tracing::debug!(method = request.method.as_str(), %url, retried = request.retried, "api request");
            let response = self
                .transport
                .send(&url, bearer.as_deref(), &request)
                .await?;

            if response.is_success() {
                return Ok(response);
            }
            if response.status != 401 {
                return Err(ApiError::from_status(response.status, &response.body));
            }
            if !request.authenticated {
                return Err(ApiError::credentials_rejected(&response.body));
            }
            if request.retried {
                tracing::warn!(%url, "still unauthorized after refresh");
                self.expire_session();
                return Err(ApiError::Unauthorized);
            }

            self.refresh_after_unauthorized(bearer.as_deref()).await?;
            request.retried = true;
        }
    }

    async fn refresh_after_unauthorized(&self, rejected: Option<&str>) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.tokens.access_token();
        if current.is_some() && current.as_deref() != rejected {
            tracing::debug!("token already rotated by a concurrent refresh");
            return Ok(());
        }
        if current.is_none() && rejected.is_some() {
            // Cleared by a concurrent failed refresh, which already fired the hook.
            tracing::debug!("session already expired by a concurrent refresh");
            return Err(ApiError::Unauthorized);
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            tracing::warn!("unauthorized and no refresh token stored");
            self.expire_session();
            return Err(ApiError::Unauthorized);
        };

        match self.send_refresh(&refresh_token).await {
            Ok(payload) => {
                self.tokens.save(&TokenPair {
                    token: payload.token,
                    refresh_token: payload.refresh_token.or(Some(refresh_token)),
                });
                tracing::info!("access token refreshed");
                Ok(())
            },
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed");
                self.expire_session();
                Err(ApiError::Unauthorized)
            },
        }
    }

    async fn send_refresh(&self, refresh_token: &str) -> Result<AuthPayload, ApiError> {
        let endpoint = Refresh(RefreshRequest {
            refresh_token: refresh_token.to_string(),
        });
        let request = endpoint.request()?;
        let response = self
            .transport
            .send(&request.url(&self.root), None, &request)
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        decode::<Refresh>(response.status, &response.body)
    }

    fn expire_session(&self) {
        self.tokens.clear();
        if let Some(hook) = self.on_session_expired.as_ref() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        endpoints::{CreateUploads, GetGroup, UploadMode},
        session::MemoryTokenStore,
        transport::{FilePart, Method, RequestBody},
    };

    const ROOT: &str = "http://api.test/api/v1";
    const GROUP_BODY: &str = r#"{"success":true,"data":{"id":"g1","name":"Year 9"}}"#;

    #[derive(Debug, Clone)]
    struct Sent {
        url: String,
        bearer: Option<String>,
        request: ApiRequest,
    }

    /// Answers from a closure and records every exchange. Each send yields
    /// once so concurrent callers interleave.
    struct ScriptedTransport {
        sent: RefCell<Vec<Sent>>,
        respond: Box<dyn Fn(&str, Option<&str>) -> ApiResponse>,
    }

    impl ScriptedTransport {
        fn new(respond: impl Fn(&str, Option<&str>) -> ApiResponse + 'static) -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        fn refresh_calls(&self) -> usize {
            self.sent
                .borrow()
                .iter()
                .filter(|sent| sent.url.ends_with("/auth/refresh"))
                .count()
        }

        fn calls_to(&self, suffix: &str) -> Vec<Sent> {
            self.sent
                .borrow()
                .iter()
                .filter(|sent| sent.url.ends_with(suffix))
                .cloned()
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            url: &str,
            bearer: Option<&str>,
            request: &ApiRequest,
        ) -> Result<ApiResponse, ApiError> {
            self.sent.borrow_mut().push(Sent {
                url: url.to_string(),
                bearer: bearer.map(str::to_string),
                request: request.clone(),
            });
            tokio::task::yield_now().await;
            Ok((self.respond)(url, bearer))
        }
    }

    fn tokens(token: &str, refresh: Option<&str>) -> MemoryTokenStore {
        MemoryTokenStore::with_tokens(TokenPair {
            token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
        })
    }

    /// `stale` is rejected, `fresh` accepted, refresh mints `fresh`.
    fn rotating_backend(url: &str, bearer: Option<&str>) -> ApiResponse {
        if url.ends_with("/auth/refresh") {
            return ApiResponse::new(
                200,
                r#"{"success":true,"data":{"token":"fresh","refresh_token":"r2"}}"#,
            );
        }
        match bearer {
            Some("fresh") => ApiResponse::new(200, GROUP_BODY),
            _ => ApiResponse::new(401, r#"{"message":"expired"}"#),
        }
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| ApiResponse::new(200, GROUP_BODY)),
            tokens("abc", None),
        );
        let group = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect("fetch group");
        assert_eq!(group.id, "g1");
        let sent = client.transport().calls_to("/groups/g1");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn single_401_refreshes_once_and_replays_once() {
        let client =
            ApiClient::new(ROOT, ScriptedTransport::new(rotating_backend), tokens("stale", Some("r1")));
        let group = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect("replayed request succeeds");
        assert_eq!(group.name, "Year 9");

        let transport = client.transport();
        assert_eq!(transport.refresh_calls(), 1);
        let attempts = transport.calls_to("/groups/g1");
        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].request.retried);
        assert!(attempts[1].request.retried);
        assert_eq!(attempts[1].bearer.as_deref(), Some("fresh"));
        assert_eq!(
            client.tokens().load(),
            Some(TokenPair {
                token: "fresh".to_string(),
                refresh_token: Some("r2".to_string())
            })
        );
    }

    #[tokio::test]
    async fn second_401_does_not_refresh_again() {
        let expired = Rc::new(Cell::new(0));
        let hook_count = expired.clone();
        let transport = ScriptedTransport::new(|url, _| {
            if url.ends_with("/auth/refresh") {
                ApiResponse::new(200, r#"{"success":true,"data":{"token":"fresh"}}"#)
            } else {
                ApiResponse::new(401, "")
            }
        });
        let client = ApiClient::new(ROOT, transport, tokens("stale", Some("r1")))
            .with_session_expired_hook(move || hook_count.set(hook_count.get() + 1));

        let err = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect_err("second 401 propagates");
        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(client.transport().refresh_calls(), 1);
        assert_eq!(client.transport().calls_to("/groups/g1").len(), 2);
        assert_eq!(client.tokens().load(), None);
        assert_eq!(expired.get(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_clears_tokens_and_fires_hook() {
        let expired = Rc::new(Cell::new(false));
        let flag = expired.clone();
        let transport = ScriptedTransport::new(|url, _| {
            if url.ends_with("/auth/refresh") {
                ApiResponse::new(401, r#"{"message":"refresh token revoked"}"#)
            } else {
                ApiResponse::new(401, "")
            }
        });
        let client = ApiClient::new(ROOT, transport, tokens("stale", Some("r1")))
            .with_session_expired_hook(move || flag.set(true));

        let err = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect_err("refresh failure propagates");
        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(client.transport().calls_to("/groups/g1").len(), 1);
        assert!(client.tokens().load().is_none());
        assert!(expired.get());
    }

    #[tokio::test]
    async fn missing_refresh_token_expires_without_refresh_call() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| ApiResponse::new(401, "")),
            tokens("stale", None),
        );
        let err = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect_err("no refresh token");
        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(client.transport().refresh_calls(), 0);
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn concurrent_401s_share_one_refresh() {
        let client =
            ApiClient::new(ROOT, ScriptedTransport::new(rotating_backend), tokens("stale", Some("r1")));
        let first = GetGroup { id: "g1".to_string() };
        let second = GetGroup { id: "g1".to_string() };

        let (a, b) = futures::join!(client.call(&first), client.call(&second));
        assert!(a.is_ok());
        assert!(b.is_ok());

        let transport = client.transport();
        assert_eq!(transport.refresh_calls(), 1);
        let attempts = transport.calls_to("/groups/g1");
        assert_eq!(attempts.len(), 4);
        assert_eq!(
            attempts
                .iter()
                .filter(|sent| sent.bearer.as_deref() == Some("stale"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn concurrent_401s_with_failed_refresh_expire_once() {
        let expired = Rc::new(Cell::new(0));
        let hook_count = expired.clone();
        let transport = ScriptedTransport::new(|url, _| {
            if url.ends_with("/auth/refresh") {
                ApiResponse::new(401, r#"{"message":"refresh token revoked"}"#)
            } else {
                ApiResponse::new(401, "")
            }
        });
        let client = ApiClient::new(ROOT, transport, tokens("stale", Some("r1")))
            .with_session_expired_hook(move || hook_count.set(hook_count.get() + 1));
        let first = GetGroup { id: "g1".to_string() };
        let second = GetGroup { id: "g1".to_string() };

        let (a, b) = futures::join!(client.call(&first), client.call(&second));
        assert_eq!(a, Err(ApiError::Unauthorized));
        assert_eq!(b, Err(ApiError::Unauthorized));
        assert_eq!(client.transport().refresh_calls(), 1);
        assert_eq!(client.transport().calls_to("/groups/g1").len(), 2);
        assert_eq!(expired.get(), 1);
        assert!(client.tokens().load().is_none());
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| ApiResponse::new(500, "")),
            tokens("abc", Some("r1")),
        );
        let err = client
            .call(&GetGroup { id: "g1".to_string() })
            .await
            .expect_err("server error");
        assert_eq!(err, ApiError::Server { status: 500 });
        assert_eq!(client.transport().sent.borrow().len(), 1);
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn wrong_password_is_a_validation_error_not_a_refresh() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| {
                ApiResponse::new(401, r#"{"success":false,"message":"Invalid email or password"}"#)
            }),
            MemoryTokenStore::new(),
        );
        let err = client.login("t@example.com", "nope").await.expect_err("rejected");
        assert_eq!(
            err,
            ApiError::Validation {
                status: 401,
                message: "Invalid email or password".to_string()
            }
        );
        assert_eq!(client.transport().refresh_calls(), 0);
        let sent = client.transport().calls_to("/auth/login");
        assert_eq!(sent[0].bearer, None);
    }

    #[tokio::test]
    async fn login_stores_tokens() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| {
                ApiResponse::new(
                    200,
                    r#"{"success":true,"data":{"token":"t1","refresh_token":"r1"}}"#,
                )
            }),
            MemoryTokenStore::new(),
        );
        client.login(" t@example.com ", "pw").await.expect("login");
        assert_eq!(client.tokens().access_token().as_deref(), Some("t1"));
        assert_eq!(client.tokens().refresh_token().as_deref(), Some("r1"));
        client.logout();
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn batch_upload_posts_three_files() {
        let client = ApiClient::new(
            ROOT,
            ScriptedTransport::new(|_, _| ApiResponse::new(201, r#"{"success":true,"data":[]}"#)),
            tokens("abc", None),
        );
        let files = ["p1.jpg", "p2.jpg", "p3.jpg"]
            .into_iter()
            .map(|name| FilePart {
                field: String::new(),
                file_name: name.to_string(),
                content_type: Some("image/jpeg".to_string()),
                bytes: vec![1, 2, 3],
            })
            .collect();
        let upload = CreateUploads {
            group_id: "g1".to_string(),
            mode: UploadMode::Images,
            batch_name: Some("Term1".to_string()),
            files,
        };
        let created = client.call(&upload).await.expect("upload");
        assert!(created.is_empty());

        let sent = client.transport().sent.borrow().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, format!("{ROOT}/groups/g1/uploads?mode=images&batch_name=Term1"));
        assert_eq!(sent[0].request.method, Method::Post);
        match &sent[0].request.body {
            RequestBody::Multipart(form) => assert_eq!(form.files.len(), 3),
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(upload.follow_up_path(), "/uploads/group/g1/batch/Term1");
    }

    #[test]
    fn api_root_appends_version() {
        assert_eq!(api_root("http://localhost:8000/"), "http://localhost:8000/api/v1");
    }
}
