//! Interactive browser consent

use async_trait::async_trait;
use std::io::BufRead;
use std::net::SocketAddr;
use std::process::{Command, Stdio};

use crate::callback::{CallbackListener, REDIRECT_PORT};
use crate::credentials::OAuthCredentials;
use crate::error::{Result, StoreError};
use crate::oauth::{Authorizer, OAuthClient};

/// Authorizes through the user's browser and a local redirect listener
///
/// The consent URL is printed first and the flow waits for Enter, so it also
/// works where no browser can be launched. The listener is only bound after
/// that, and closed as soon as the code has been exchanged.
#[derive(Debug, Clone, Copy)]
pub struct BrowserAuthorizer {
    port: u16,
}

impl Default for BrowserAuthorizer {
    fn default() -> Self {
        Self {
            port: REDIRECT_PORT,
        }
    }
}

impl BrowserAuthorizer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

#[async_trait]
impl Authorizer for BrowserAuthorizer {
    async fn authorize(
        &self,
        client: &OAuthClient,
        credentials: &OAuthCredentials,
    ) -> Result<String> {
        let redirect_uri = self.redirect_uri();
        let url = client.authorization_url(&credentials.client_id, &redirect_uri)?;

        println!();
        println!("Authorize extship to publish to the store:");
        println!();
        println!("  {}", url);
        println!();
        println!("Press Enter to open this page in your browser...");
        wait_for_enter().await?;

        let listener =
            CallbackListener::bind(SocketAddr::from(([127, 0, 0, 1], self.port))).await?;

        if let Err(e) = open_in_browser(url.as_str()) {
            tracing::warn!("could not launch a browser ({}), open the URL above manually", e);
        }

        complete_authorization(client, credentials, listener, &redirect_uri).await
    }
}

/// Wait for the redirect, trade its code for a refresh token and close
///
/// The browser is shown the confirmation page only when the exchange
/// succeeded, otherwise the exchange error.
async fn complete_authorization(
    client: &OAuthClient,
    credentials: &OAuthCredentials,
    mut listener: CallbackListener,
    redirect_uri: &str,
) -> Result<String> {
    let result = match listener.next_code().await {
        Ok(callback) => {
            let exchanged = client
                .exchange_code(credentials, callback.code(), redirect_uri)
                .await;
            match &exchanged {
                Ok(_) => callback.succeed(),
                Err(e) => callback.fail(e.to_string()),
            }
            exchanged
        }
        Err(e) => Err(e),
    };

    listener.close().await;
    result
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map(|_| ())
    })
    .await
    .map_err(|e| StoreError::AuthorizationFailed {
        message: format!("interrupted while waiting for input: {}", e),
    })??;
    Ok(())
}

/// Open a URL with the platform's default handler
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::StoreEndpoints;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn local_listener() -> CallbackListener {
        CallbackListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap()
    }

    fn client(server: &MockServer) -> OAuthClient {
        OAuthClient::new(StoreEndpoints::with_base(&server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_code_is_exchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"refresh_token": "1//issued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let listener = local_listener().await;
        let redirect_uri = listener.redirect_uri();
        let browser = tokio::spawn({
            let url = format!("http://{}/?code=abc", listener.local_addr());
            async move { reqwest::get(url).await.unwrap() }
        });

        let credentials = OAuthCredentials::new("client.apps", "secret");
        let token =
            complete_authorization(&client(&server), &credentials, listener, &redirect_uri)
                .await
                .unwrap();
        assert_eq!(token, "1//issued");

        let response = browser.await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.text().await.unwrap().contains("Authorization complete"));
    }

    #[tokio::test]
    async fn test_rejected_code_fails_in_browser() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let listener = local_listener().await;
        let redirect_uri = listener.redirect_uri();
        let addr = listener.local_addr();
        let browser = tokio::spawn(async move {
            reqwest::get(format!("http://{}/?code=stale", addr)).await.unwrap()
        });

        let credentials = OAuthCredentials::new("client.apps", "secret");
        let err = complete_authorization(&client(&server), &credentials, listener, &redirect_uri)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TokenRequest { status: 400, .. }));

        let response = browser.await.unwrap();
        assert_eq!(response.status(), 500);
        assert!(response.text().await.unwrap().starts_with("Authorization failed:"));

        // The listener is closed once the flow is over
        assert!(reqwest::get(format!("http://{}/?code=again", addr)).await.is_err());
    }

    #[test]
    fn test_default_port() {
        let authorizer = BrowserAuthorizer::default();
        assert_eq!(authorizer.redirect_uri(), "http://localhost:8818");
        assert_eq!(BrowserAuthorizer::new(9000).redirect_uri(), "http://localhost:9000");
    }
}
