use anyhow::Context;
use serde::Deserialize;
use smol_str::SmolStr;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::Notify;

pub mod hub;
pub mod implementations;
pub mod printer;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerContext {
    pub name: SmolStr,
    pub server: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub default_context: Option<SmolStr>,
    #[serde(default)]
    pub contexts: Vec<ServerContext>,
}

impl Config {
    pub fn default_context(&self) -> anyhow::Result<Option<&ServerContext>> {
        let Some(name) = &self.default_context else {
            return Ok(None);
        };

        self.contexts
            .iter()
            .find(|c| c.name == *name)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Default context \"{name}\" is not defined"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub server: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl ServerEndpoint {
    /// Picks the server from the explicit flag first, then the default context of the config.
    /// The context token is only reused when the server also comes from the context.
    pub fn resolve(
        server: Option<&str>,
        token: Option<&str>,
        timeout: Option<Duration>,
        config: &Config,
    ) -> anyhow::Result<ServerEndpoint> {
        let (server, context_token) = match server {
            Some(server) => (server.to_string(), None),
            None => {
                let context = config.default_context()?.ok_or_else(|| {
                    anyhow::anyhow!(
                        "No Hub server configured, pass --server or set a default context"
                    )
                })?;
                (context.server.clone(), context.token.clone())
            }
        };

        Ok(ServerEndpoint {
            server,
            token: token.map(str::to_string).or(context_token),
            timeout,
        })
    }
}

pub struct HttpClient {
    endpoint: ServerEndpoint,
    client_inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(endpoint: ServerEndpoint) -> anyhow::Result<HttpClient> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = endpoint.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpClient {
            endpoint,
            client_inner: builder.build().context("Failed to create HTTP client")?,
        })
    }

    pub fn server(&self) -> &str {
        &self.endpoint.server
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.endpoint.server.trim_end_matches('/'), path);
        log::debug!("POST {}", url);
        let request = self.client_inner.post(url);
        match &self.endpoint.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Cancellation signal raised by Ctrl-C.
#[derive(Default)]
pub struct Cancellation {
    cancelled: AtomicBool,
    notify: Notify,
}

impl Cancellation {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Resolves to `None` as soon as [`Cancellation::cancel`] is called, even while `fut` is pending.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        // Registered before the flag check so a concurrent `cancel` is not missed.
        let cancelled = self.notify.notified();
        if self.is_cancelled() {
            return None;
        }

        tokio::select! {
            _ = cancelled => None,
            output = fut => Some(output),
        }
    }
}

pub fn cancellation() -> &'static Cancellation {
    static CANCELLATION: OnceLock<Cancellation> = OnceLock::new();
    CANCELLATION.get_or_init(Cancellation::default)
}

pub fn set_cancelled() {
    cancellation().cancel();
}
