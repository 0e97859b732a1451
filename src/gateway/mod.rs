//! Authenticated request gateway.
//!
//! Every request leaves with `Authorization: Bearer <access token>` when one is
//! stored. A 401 starts the recovery protocol: the first request to see it
//! claims the refresh through the [`RefreshCoordinator`] and performs one
//! refresh exchange straight on the transport; requests that hit 401 while
//! that exchange is in flight park on the coordinator's queue. When the
//! exchange settles, the new token (or the failure) is fanned out to everyone
//! and each affected request is replayed once.
//!
//! A request is never replayed twice. A second 401, a missing refresh token or
//! a failed exchange clears the stored credentials and surfaces the error, so
//! later requests fail fast until the user signs in again.
//!
//! The gateway imposes no timeout of its own; the transport's per-request
//! timeout bounds the refresh exchange and therefore every parked waiter.

pub mod coordinator;
pub mod store;
#[cfg(test)]
pub(crate) mod stub;
pub mod transport;

pub use coordinator::{RefreshCoordinator, RefreshLease, Ticket, Waiter};
pub use store::{Credentials, FileStore, KeyValueStore, MemoryStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, AUTHORIZATION};

use crate::{
    api::{error_from_response, Envelope},
    errors::AppError,
    features::auth::types::{RefreshRequest, RefreshedTokens, TokenPair},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Endpoint exchanging a refresh token for a new token pair.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Sends requests with the stored bearer token and recovers from expiry.
pub struct Gateway<T> {
    transport: T,
    credentials: Credentials,
    coordinator: Arc<RefreshCoordinator>,
}

impl<T: Transport> Gateway<T> {
    #[must_use]
    pub fn new(transport: T, credentials: Credentials) -> Self {
        Self::with_coordinator(transport, credentials, Arc::new(RefreshCoordinator::new()))
    }

    /// Builds a gateway around an existing coordinator, so several gateways
    /// over the same store still share one refresh episode.
    #[must_use]
    pub fn with_coordinator(
        transport: T,
        credentials: Credentials,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            credentials,
            coordinator,
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` with the stored access token and recovers from a 401.
    ///
    /// Every non-401 response is returned as is, error statuses included.
    ///
    /// # Errors
    /// Transport failures are returned unchanged. An unrecoverable 401 returns
    /// the authentication failure (or the refresh failure) after the stored
    /// credentials have been cleared.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, AppError> {
        let token = self.credentials.access_token()?;
        let mut response = self.transmit(&request, token.as_ref()).await?;

        while response.is_unauthorized() {
            let failure = error_from_response(&response);
            let token = self.recover(&mut request, failure).await?;

            debug!("replaying request with refreshed token");
            response = self.transmit(&request, Some(&token)).await?;
        }

        Ok(response)
    }

    /// Sends `request` without credentials and without recovery, for public
    /// endpoints such as login where a 401 means rejected input.
    ///
    /// # Errors
    /// Transport failures only; error statuses are returned as responses.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn exchange(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        self.transport.execute(&request).await
    }

    async fn transmit(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<ApiResponse, AppError> {
        match token {
            Some(token) => self.transport.execute(&request.with_bearer(token)).await,
            None => self.transport.execute(request).await,
        }
    }

    /// Recovery protocol for one request that received a 401. Returns the
    /// token to replay with, or the error to surface.
    async fn recover(
        &self,
        request: &mut ApiRequest,
        failure: AppError,
    ) -> Result<SecretString, AppError> {
        if request.is_retried() {
            warn!("request rejected again after refresh");
            self.clear_credentials();
            return Err(failure);
        }
        request.mark_retried();

        let Some(refresh_token) = self.credentials.refresh_token()? else {
            info!("no refresh token stored");
            self.clear_credentials();
            return Err(failure);
        };

        match self.coordinator.begin() {
            Ticket::Waiter(waiter) => waiter.wait().await,
            Ticket::Leader(lease) => self.refresh(lease, &refresh_token, failure).await,
        }
    }

    /// Runs the refresh exchange for the current episode and settles `lease`.
    async fn refresh(
        &self,
        lease: RefreshLease<'_>,
        refresh_token: &SecretString,
        failure: AppError,
    ) -> Result<SecretString, AppError> {
        let outcome = match self.refresh_exchange(refresh_token, &failure).await {
            Ok(pair) => self
                .credentials
                .save_tokens(&pair.access_token, &pair.refresh_token)
                .map(|()| pair.access_token),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(access_token) => {
                let resumed = lease.succeed(&access_token);
                info!(resumed, "access token refreshed");
                Ok(access_token)
            }
            Err(err) => {
                self.clear_credentials();
                let resumed = lease.fail(&err);
                warn!(resumed, "token refresh failed: {}", err);
                Err(err)
            }
        }
    }

    /// POSTs the refresh token on the bare transport so the exchange itself
    /// never re-enters recovery. A 2xx without both tokens counts as the
    /// original authentication failure.
    async fn refresh_exchange(
        &self,
        refresh_token: &SecretString,
        failure: &AppError,
    ) -> Result<TokenPair, AppError> {
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest {
            refresh_token: refresh_token.expose_secret(),
        })?;

        let response = self.transport.execute(&request).await?;
        if !response.is_success() {
            return Err(error_from_response(&response));
        }

        serde_json::from_str::<Envelope<RefreshedTokens>>(&response.body)
            .ok()
            .and_then(|envelope| envelope.data.into_pair())
            .ok_or_else(|| failure.clone())
    }

    fn clear_credentials(&self) {
        if let Err(err) = self.credentials.clear() {
            error!("Failed to clear stored credentials: {}", err);
        } else {
            info!("stored credentials cleared");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::auth::types::{Role, User};
    use serde_json::json;
    use std::{sync::Mutex, time::Duration};
    use tokio::{sync::Semaphore, task::yield_now, time::timeout};

    /// In-memory API: protected paths accept exactly one bearer token, the
    /// refresh endpoint rotates it when given the expected refresh token.
    pub(crate) struct FakeApi {
        state: Mutex<FakeState>,
        refresh_gate: Option<Arc<Semaphore>>,
    }

    struct FakeState {
        accepted: Option<String>,
        refresh: Option<(String, String, String)>,
        accept_refreshed: bool,
        refresh_body: Option<String>,
        calls: Vec<ApiRequest>,
    }

    impl FakeApi {
        pub(crate) fn accepting(token: &str) -> Self {
            Self {
                state: Mutex::new(FakeState {
                    accepted: Some(token.to_string()),
                    refresh: None,
                    accept_refreshed: true,
                    refresh_body: None,
                    calls: Vec::new(),
                }),
                refresh_gate: None,
            }
        }

        /// `expected` refresh token is exchanged for (`access`, `refresh`).
        pub(crate) fn rotating(mut self, expected: &str, access: &str, refresh: &str) -> Self {
            self.state_mut().refresh = Some((
                expected.to_string(),
                access.to_string(),
                refresh.to_string(),
            ));
            self
        }

        fn rejecting_refreshed_tokens(mut self) -> Self {
            self.state_mut().accept_refreshed = false;
            self
        }

        fn with_refresh_body(mut self, body: &str) -> Self {
            self.state_mut().refresh_body = Some(body.to_string());
            self
        }

        /// Refresh calls block until the returned semaphore gets a permit.
        fn gated(mut self) -> (Self, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            self.refresh_gate = Some(gate.clone());
            (self, gate)
        }

        fn state_mut(&mut self) -> &mut FakeState {
            self.state
                .get_mut()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        pub(crate) fn calls(&self) -> Vec<ApiRequest> {
            self.lock().calls.clone()
        }

        pub(crate) fn refresh_calls(&self) -> Vec<ApiRequest> {
            self.calls()
                .into_iter()
                .filter(|call| call.path() == REFRESH_PATH)
                .collect()
        }

        pub(crate) fn protected_calls(&self) -> Vec<ApiRequest> {
            self.calls()
                .into_iter()
                .filter(|call| call.path() != REFRESH_PATH)
                .collect()
        }
    }

    impl Transport for FakeApi {
        async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
            self.lock().calls.push(request.clone());

            if request.path() == "/down" {
                return Err(AppError::Network("connection refused".to_string()));
            }

            if request.path() == REFRESH_PATH {
                if let Some(gate) = &self.refresh_gate {
                    let _permit = gate.acquire().await;
                }
                return Ok(self.answer_refresh(request));
            }

            yield_now().await;
            Ok(self.answer_protected(request))
        }
    }

    impl FakeApi {
        fn answer_refresh(&self, request: &ApiRequest) -> ApiResponse {
            let mut state = self.lock();
            if let Some(body) = state.refresh_body.clone() {
                return ApiResponse::new(200, body);
            }

            let presented = request
                .body()
                .and_then(|body| body.get("refreshToken"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);

            match state.refresh.clone() {
                Some((expected, access, refresh)) if presented.as_deref() == Some(&expected) => {
                    if state.accept_refreshed {
                        state.accepted = Some(access.clone());
                    }
                    ApiResponse::new(
                        200,
                        json!({"data": {"accessToken": access, "refreshToken": refresh}})
                            .to_string(),
                    )
                }
                _ => ApiResponse::new(401, json!({"message": "Invalid refresh token"}).to_string()),
            }
        }

        fn answer_protected(&self, request: &ApiRequest) -> ApiResponse {
            let state = self.lock();
            let expected = state.accepted.as_ref().map(|token| format!("Bearer {token}"));

            if request.path() == "/broken" {
                return ApiResponse::new(500, json!({"message": "boom"}).to_string());
            }

            if expected.is_some() && request.header_value(AUTHORIZATION) == expected.as_deref() {
                ApiResponse::new(200, json!({"data": {"path": request.path()}}).to_string())
            } else {
                ApiResponse::new(401, json!({"message": "jwt expired"}).to_string())
            }
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    pub(crate) fn signed_in(access: &str, refresh: &str) -> Credentials {
        let credentials = Credentials::in_memory();
        credentials
            .save_session(
                &secret(access),
                &secret(refresh),
                &User {
                    id: Some("u1".to_string()),
                    object_id: None,
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    role: Role::Admin,
                    created_at: None,
                },
            )
            .unwrap();
        credentials
    }

    fn assert_cleared(credentials: &Credentials) {
        assert!(credentials.access_token().unwrap().is_none());
        assert!(credentials.refresh_token().unwrap().is_none());
        assert!(credentials.user().unwrap().is_none());
    }

    async fn wait_for_waiters<T: Transport>(gateway: &Gateway<T>, count: usize) {
        timeout(Duration::from_secs(5), async {
            while gateway.coordinator().pending_waiters() < count {
                yield_now().await;
            }
        })
        .await
        .expect("requests never queued behind the refresh");
    }

    #[tokio::test]
    async fn attaches_stored_bearer_token() {
        let gateway = Gateway::new(FakeApi::accepting("a1"), signed_in("a1", "r1"));

        let response = gateway.send(ApiRequest::get("/api/v1/admin")).await.unwrap();

        assert_eq!(response.status, 200);
        let calls = gateway.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].header_value(AUTHORIZATION), Some("Bearer a1"));
    }

    #[tokio::test]
    async fn non_auth_errors_are_returned_verbatim() {
        let gateway = Gateway::new(FakeApi::accepting("a1"), signed_in("a1", "r1"));

        let response = gateway.send(ApiRequest::get("/broken")).await.unwrap();

        assert_eq!(response.status, 500);
        assert!(gateway.transport().refresh_calls().is_empty());
        assert!(gateway.credentials().access_token().unwrap().is_some());
    }

    #[tokio::test]
    async fn transport_failures_propagate_unchanged() {
        let gateway = Gateway::new(FakeApi::accepting("a1"), signed_in("a1", "r1"));

        let err = gateway.send(ApiRequest::get("/down")).await.unwrap_err();

        assert_eq!(err, AppError::Network("connection refused".to_string()));
        assert_eq!(gateway.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_replayed() {
        let api = FakeApi::accepting("a2").rotating("r1", "a2", "r2");
        let gateway = Gateway::new(api, signed_in("a1", "r1"));

        let response = gateway.send(ApiRequest::get("/api/v1/admin")).await.unwrap();

        assert_eq!(response.status, 200);
        let protected = gateway.transport().protected_calls();
        assert_eq!(protected.len(), 2);
        assert_eq!(protected[0].header_value(AUTHORIZATION), Some("Bearer a1"));
        assert_eq!(protected[1].header_value(AUTHORIZATION), Some("Bearer a2"));

        let refresh = gateway.transport().refresh_calls();
        assert_eq!(refresh.len(), 1);
        assert_eq!(refresh[0].header_value(AUTHORIZATION), None);
        assert_eq!(refresh[0].body(), Some(&json!({"refreshToken": "r1"})));

        let credentials = gateway.credentials();
        assert_eq!(credentials.access_token().unwrap().unwrap().expose_secret(), "a2");
        assert_eq!(credentials.refresh_token().unwrap().unwrap().expose_secret(), "r2");
        assert!(credentials.user().unwrap().is_some());
        assert!(!gateway.coordinator().is_refreshing());
    }

    #[tokio::test]
    async fn two_racing_requests_share_one_refresh() {
        let (api, gate) = FakeApi::accepting("a2").rotating("r1", "a2", "r2").gated();
        let gateway = Arc::new(Gateway::new(api, signed_in("a1", "r1")));

        let a = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.send(ApiRequest::get("/a")).await }
        });
        let b = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.send(ApiRequest::get("/b")).await }
        });

        wait_for_waiters(&gateway, 1).await;
        assert!(gateway.coordinator().is_refreshing());
        gate.add_permits(1);

        assert_eq!(a.await.unwrap().unwrap().status, 200);
        assert_eq!(b.await.unwrap().unwrap().status, 200);

        let refresh = gateway.transport().refresh_calls();
        assert_eq!(refresh.len(), 1);
        assert_eq!(refresh[0].body(), Some(&json!({"refreshToken": "r1"})));

        for path in ["/a", "/b"] {
            let replayed: Vec<_> = gateway
                .transport()
                .protected_calls()
                .into_iter()
                .filter(|call| call.path() == path)
                .map(|call| call.header_value(AUTHORIZATION).map(str::to_string))
                .collect();
            assert_eq!(
                replayed,
                vec![Some("Bearer a1".to_string()), Some("Bearer a2".to_string())],
                "unexpected attempts for {path}"
            );
        }

        let credentials = gateway.credentials();
        assert_eq!(credentials.access_token().unwrap().unwrap().expose_secret(), "a2");
        assert_eq!(credentials.refresh_token().unwrap().unwrap().expose_secret(), "r2");
        assert!(!gateway.coordinator().is_refreshing());
        assert_eq!(gateway.coordinator().pending_waiters(), 0);
    }

    #[tokio::test]
    async fn many_concurrent_expiries_send_exactly_one_refresh() {
        const REQUESTS: usize = 8;

        let (api, gate) = FakeApi::accepting("a2").rotating("r1", "a2", "r2").gated();
        let gateway = Arc::new(Gateway::new(api, signed_in("a1", "r1")));

        let mut tasks = tokio::task::JoinSet::new();
        for index in 0..REQUESTS {
            let gateway = gateway.clone();
            tasks.spawn(async move { gateway.send(ApiRequest::get(format!("/item/{index}"))).await });
        }

        wait_for_waiters(&gateway, REQUESTS - 1).await;
        gate.add_permits(1);

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().status, 200);
        }

        assert_eq!(gateway.transport().refresh_calls().len(), 1);
        let replays = gateway
            .transport()
            .protected_calls()
            .into_iter()
            .filter(|call| call.header_value(AUTHORIZATION) == Some("Bearer a2"))
            .count();
        assert_eq!(replays, REQUESTS);
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_refresh_call() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_many(&[(store::ACCESS_TOKEN_KEY, "a1"), (store::USER_KEY, "{}")])
            .unwrap();
        let gateway = Gateway::new(
            FakeApi::accepting("a2").rotating("r1", "a2", "r2"),
            Credentials::new(store),
        );

        let err = gateway.send(ApiRequest::get("/api/v1/admin")).await.unwrap_err();

        assert_eq!(
            err,
            AppError::Http {
                status: 401,
                message: "jwt expired".to_string()
            }
        );
        assert!(gateway.transport().refresh_calls().is_empty());
        assert_cleared(gateway.credentials());
    }

    #[tokio::test]
    async fn second_rejection_is_never_retried_again() {
        let api = FakeApi::accepting("a1")
            .rotating("r1", "a2", "r2")
            .rejecting_refreshed_tokens();
        let gateway = Gateway::new(api, signed_in("expired", "r1"));

        let err = gateway.send(ApiRequest::get("/api/v1/admin")).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(gateway.transport().protected_calls().len(), 2);
        assert_eq!(gateway.transport().refresh_calls().len(), 1);
        assert_cleared(gateway.credentials());
    }

    #[tokio::test]
    async fn failed_refresh_fails_every_waiter_without_stale_retry() {
        let (api, gate) = FakeApi::accepting("a2").rotating("r1", "a2", "r2").gated();
        let gateway = Arc::new(Gateway::new(api, signed_in("a1", "revoked")));

        let a = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.send(ApiRequest::get("/a")).await }
        });
        let b = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.send(ApiRequest::get("/b")).await }
        });

        wait_for_waiters(&gateway, 1).await;
        gate.add_permits(1);

        let expected = AppError::Http {
            status: 401,
            message: "Invalid refresh token".to_string(),
        };
        assert_eq!(a.await.unwrap().unwrap_err(), expected);
        assert_eq!(b.await.unwrap().unwrap_err(), expected);

        assert_eq!(gateway.transport().refresh_calls().len(), 1);
        // one attempt each, no replay with the stale token
        assert_eq!(gateway.transport().protected_calls().len(), 2);
        assert_cleared(gateway.credentials());
        assert!(!gateway.coordinator().is_refreshing());
    }

    #[tokio::test]
    async fn refresh_without_tokens_surfaces_original_failure() {
        let api = FakeApi::accepting("a2")
            .rotating("r1", "a2", "r2")
            .with_refresh_body(r#"{"data":{"accessToken":"a2"}}"#);
        let gateway = Gateway::new(api, signed_in("a1", "r1"));

        let err = gateway.send(ApiRequest::get("/api/v1/admin")).await.unwrap_err();

        assert_eq!(
            err,
            AppError::Http {
                status: 401,
                message: "jwt expired".to_string()
            }
        );
        assert_cleared(gateway.credentials());
    }

    #[tokio::test]
    async fn requests_after_unrecoverable_failure_fail_fast() {
        let gateway = Gateway::new(
            FakeApi::accepting("a2").rotating("r1", "a2", "r2"),
            signed_in("a1", "revoked"),
        );

        assert!(gateway.send(ApiRequest::get("/a")).await.is_err());
        let err = gateway.send(ApiRequest::get("/b")).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(gateway.transport().refresh_calls().len(), 1);
        let last = gateway.transport().calls().pop().unwrap();
        assert_eq!(last.path(), "/b");
        assert_eq!(last.header_value(AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn exchange_skips_credentials_and_recovery() {
        let gateway = Gateway::new(
            FakeApi::accepting("a2").rotating("r1", "a2", "r2"),
            signed_in("a1", "r1"),
        );

        let response = gateway.exchange(ApiRequest::post("/api/v1/auth/login")).await.unwrap();

        assert_eq!(response.status, 401);
        let calls = gateway.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].header_value(AUTHORIZATION), None);
        assert!(gateway.credentials().refresh_token().unwrap().is_some());
    }

    #[tokio::test]
    async fn shared_coordinator_spans_gateways() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let credentials = signed_in("a1", "r1");
        let first = Gateway::with_coordinator(
            FakeApi::accepting("a1"),
            credentials.clone(),
            coordinator.clone(),
        );
        let second = Gateway::with_coordinator(FakeApi::accepting("a1"), credentials, coordinator);

        let lease = match first.coordinator().begin() {
            Ticket::Leader(lease) => lease,
            Ticket::Waiter(_) => panic!("expected to lead"),
        };
        assert!(second.coordinator().is_refreshing());
        drop(lease);
        assert!(!second.coordinator().is_refreshing());
    }
}
