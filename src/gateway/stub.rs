//! Scripted transport for feature client tests: responses are queued per
//! method and path, and every request is recorded.

use super::{ApiRequest, ApiResponse, Transport};
use crate::errors::AppError;
use reqwest::Method;
use serde_json::{json, Value};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

#[derive(Default)]
pub(crate) struct StubApi {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl StubApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        lock(&self.routes)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        lock(&self.calls).clone()
    }
}

impl Transport for StubApi {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
        lock(&self.calls).push(request.clone());

        let scripted = lock(&self.routes)
            .get_mut(&(request.method().clone(), request.path().to_string()))
            .and_then(VecDeque::pop_front);

        Ok(scripted.unwrap_or_else(|| {
            ApiResponse::new(
                404,
                json!({"message": format!("no stub for {} {}", request.method(), request.path())})
                    .to_string(),
            )
        }))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
