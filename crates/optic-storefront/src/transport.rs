//! Outbound HTTP transports.
//!
//! Natively requests go through a blocking `ureq` agent on the tokio blocking
//! pool. Inside a Spin component they go through the host's outbound HTTP.

use async_trait::async_trait;

use crate::{FetchError, RequestBuilder, Response};

/// Sends one prepared request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError>;
}

/// Blocking `ureq` agent driven from `spawn_blocking`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    fn call(agent: &ureq::Agent, request: RequestBuilder) -> Result<Response, FetchError> {
        use crate::Method;

        let result = match request.method {
            Method::Get => {
                let mut builder = agent.get(&request.url);
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post => {
                let mut builder = agent.post(&request.url);
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.send(request.body.unwrap_or_default())
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) => {
                return Err(FetchError::HttpError {
                    status,
                    message: format!("{} {}", request.method.as_str(), request.url),
                })
            }
            Err(e) => return Err(FetchError::RequestError(e.to_string())),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .into_body()
            .read_to_vec()
            .map_err(|e| FetchError::RequestError(e.to_string()))?;
        Ok(Response::new(status, headers, body))
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl HttpTransport for UreqTransport {
    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::call(&agent, request))
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?
    }
}

/// Spin outbound HTTP.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinTransport;

#[cfg(target_arch = "wasm32")]
#[async_trait]
impl HttpTransport for SpinTransport {
    async fn send(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        use crate::Method;
        use spin_sdk::http::{Method as SpinMethod, Request};

        let method = match request.method {
            Method::Get => SpinMethod::Get,
            Method::Post => SpinMethod::Post,
        };

        let mut builder = Request::builder();
        builder.method(method).uri(request.url.as_str());
        for (key, value) in &request.headers {
            builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder.body(body);
        }

        let response: spin_sdk::http::Response = spin_sdk::http::send(builder.build())
            .await
            .map_err(|e| FetchError::RequestError(e.to_string()))?;

        let status = *response.status();
        let headers = response
            .headers()
            .map(|(k, v)| (k.to_string(), v.as_str().unwrap_or("").to_string()))
            .collect();
        Ok(Response::new(status, headers, response.into_body()))
    }
}
