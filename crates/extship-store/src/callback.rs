//! One-shot listener for the OAuth redirect
//!
//! The listener resolves exactly once: the first request to `/` either
//! carries a `code` (handed to the caller, who later settles the browser
//! response) or an error. Later requests get `410 Gone`. There is no timeout;
//! [`CallbackListener::next_code`] waits until the browser comes back.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Result, StoreError};

/// Fixed local port registered as the OAuth redirect target
pub const REDIRECT_PORT: u16 = 8818;

const SUCCESS_PAGE: &str = "<!doctype html>
<html>
  <head><title>extship</title></head>
  <body>
    <h1>Authorization complete</h1>
    <p>extship received the authorization. You can close this tab.</p>
  </body>
</html>
";

/// What the browser is told once the code has been used
#[derive(Debug)]
enum Reply {
    Success,
    Failure(String),
}

/// An authorization code waiting for its browser response
#[derive(Debug)]
pub struct AuthorizationCallback {
    code: String,
    reply: oneshot::Sender<Reply>,
}

impl AuthorizationCallback {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Show the confirmation page
    pub fn succeed(self) {
        let _ = self.reply.send(Reply::Success);
    }

    /// Show a plain-text error page
    pub fn fail(self, message: impl Into<String>) {
        let _ = self.reply.send(Reply::Failure(message.into()));
    }
}

type Delivery = std::result::Result<AuthorizationCallback, String>;

#[derive(Clone)]
struct ListenerState {
    pending: Arc<Mutex<Option<oneshot::Sender<Delivery>>>>,
}

impl ListenerState {
    fn take(&self) -> Option<oneshot::Sender<Delivery>> {
        self.pending.lock().ok().and_then(|mut pending| pending.take())
    }
}

#[derive(Debug, Deserialize)]
struct RedirectParams {
    code: Option<String>,
    error: Option<String>,
}

async fn receive(
    State(state): State<ListenerState>,
    Query(params): Query<RedirectParams>,
) -> Response {
    let Some(sender) = state.take() else {
        return (
            StatusCode::GONE,
            "This authorization request was already handled.",
        )
            .into_response();
    };

    match params.code.filter(|code| !code.is_empty()) {
        Some(code) => {
            let (reply, outcome) = oneshot::channel();
            if sender.send(Ok(AuthorizationCallback { code, reply })).is_err() {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "extship stopped waiting for the authorization.",
                )
                    .into_response();
            }
            match outcome.await {
                Ok(Reply::Success) => Html(SUCCESS_PAGE).into_response(),
                Ok(Reply::Failure(message)) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Authorization failed: {}", message),
                )
                    .into_response(),
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authorization was abandoned.",
                )
                    .into_response(),
            }
        }
        None => {
            let message = params
                .error
                .unwrap_or_else(|| "redirect carried no authorization code".to_string());
            let _ = sender.send(Err(message.clone()));
            (
                StatusCode::BAD_REQUEST,
                format!("Authorization failed: {}", message),
            )
                .into_response()
        }
    }
}

/// Local HTTP endpoint receiving a single OAuth redirect
pub struct CallbackListener {
    local_addr: SocketAddr,
    delivery: Option<oneshot::Receiver<Delivery>>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl CallbackListener {
    /// Bind and start serving
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| StoreError::Callback {
                message: format!("cannot listen on {}: {}", addr, e),
            })?;
        let local_addr = listener.local_addr()?;

        let (deliver, delivery) = oneshot::channel();
        let (shutdown, stop) = oneshot::channel::<()>();
        let state = ListenerState {
            pending: Arc::new(Mutex::new(Some(deliver))),
        };
        let router = Router::new().route("/", get(receive)).with_state(state);

        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = stop.await;
                })
                .await
        });
        tracing::debug!(%local_addr, "redirect listener started");

        Ok(Self {
            local_addr,
            delivery: Some(delivery),
            shutdown: Some(shutdown),
            server: Some(server),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Redirect URI matching the bound port
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.local_addr.port())
    }

    /// Wait for the redirect
    pub async fn next_code(&mut self) -> Result<AuthorizationCallback> {
        let delivery = self.delivery.take().ok_or_else(|| StoreError::Callback {
            message: "the redirect was already received".to_string(),
        })?;

        match delivery.await {
            Ok(Ok(callback)) => Ok(callback),
            Ok(Err(message)) => Err(StoreError::AuthorizationFailed { message }),
            Err(_) => Err(StoreError::Callback {
                message: "listener closed before the redirect arrived".to_string(),
            }),
        }
    }

    /// Stop serving and wait for in-flight responses to finish
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(server) = self.server.take() {
            match server.await {
                Ok(Err(e)) => tracing::warn!("redirect listener stopped with an error: {}", e),
                Err(e) => tracing::warn!("redirect listener task failed: {}", e),
                Ok(Ok(())) => tracing::debug!("redirect listener closed"),
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
