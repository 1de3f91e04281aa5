//! HTTP client for the external request-intake API.
//!
//! The intake API takes a JSON body per request type and answers with an HTTP status; any
//! 2xx is success. No authentication header, versioning or retry is involved.

use crate::config::CoreConfig;
use crate::constants::{APPOINTMENT_ENDPOINT_PATH, PRESCRIPTION_ENDPOINT_PATH};
use crate::{PortalError, PortalResult};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Intake endpoints, one per request flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeEndpoint {
    Prescription,
    Appointment,
}

impl IntakeEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            IntakeEndpoint::Prescription => PRESCRIPTION_ENDPOINT_PATH,
            IntakeEndpoint::Appointment => APPOINTMENT_ENDPOINT_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    /// The intake API answered with a non-2xx status.
    #[error("intake API responded with status {0}")]
    Rejected(u16),
    /// The request never produced a response (DNS, connect, timeout, body encoding).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Sends request bodies to the intake API.
pub trait IntakeClient {
    fn post<P>(
        &self,
        endpoint: IntakeEndpoint,
        payload: &P,
    ) -> impl Future<Output = Result<(), IntakeError>> + Send
    where
        P: Serialize + Sync;
}

/// [`IntakeClient`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpIntakeClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIntakeClient {
    /// Create a client for `base_url`.
    ///
    /// `timeout` is applied to whole requests when given; otherwise reqwest's defaults apply.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> PortalResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(PortalError::HttpClient)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> PortalResult<Self> {
        Self::new(cfg.intake_base_url(), cfg.intake_timeout())
    }

    pub fn endpoint_url(&self, endpoint: IntakeEndpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

impl IntakeClient for HttpIntakeClient {
    fn post<P>(
        &self,
        endpoint: IntakeEndpoint,
        payload: &P,
    ) -> impl Future<Output = Result<(), IntakeError>> + Send
    where
        P: Serialize + Sync,
    {
        let url = self.endpoint_url(endpoint);
        let body = serde_json::to_vec(payload);
        let client = self.client.clone();

        async move {
            let body = body.map_err(|e| IntakeError::Transport(e.to_string()))?;
            let response = client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| IntakeError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                tracing::info!(endpoint = endpoint.path(), %status, "intake request accepted");
                Ok(())
            } else {
                tracing::warn!(endpoint = endpoint.path(), %status, "intake request rejected");
                Err(IntakeError::Rejected(status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_intake(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();

        async fn record(
            State((received, status, path)): State<(Received, StatusCode, String)>,
            Json(body): Json<Value>,
        ) -> StatusCode {
            received.lock().unwrap().push((path, body));
            status
        }

        let app = Router::new()
            .route(
                "/api/enviar-receta",
                post(record).with_state((received.clone(), status, "enviar-receta".to_string())),
            )
            .route(
                "/api/enviar-turno",
                post(record).with_state((received.clone(), status, "enviar-turno".to_string())),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/api/"), received)
    }

    #[test]
    fn endpoint_urls_join_with_single_slash() {
        let client = HttpIntakeClient::new("https://intake.example.com/api/", None).unwrap();
        assert_eq!(
            client.endpoint_url(IntakeEndpoint::Prescription),
            "https://intake.example.com/api/enviar-receta"
        );
        assert_eq!(
            client.endpoint_url(IntakeEndpoint::Appointment),
            "https://intake.example.com/api/enviar-turno"
        );
    }

    #[tokio::test]
    async fn posts_json_body_to_endpoint() {
        let (base, received) = spawn_intake(StatusCode::OK).await;
        let client = HttpIntakeClient::new(&base, Some(Duration::from_secs(5))).unwrap();

        client
            .post(IntakeEndpoint::Appointment, &json!({ "tipoConsulta": "Pediatría" }))
            .await
            .expect("2xx should be success");

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "enviar-turno");
        assert_eq!(received[0].1, json!({ "tipoConsulta": "Pediatría" }));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, received) = spawn_intake(StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = HttpIntakeClient::new(&base, None).unwrap();

        let err = client
            .post(IntakeEndpoint::Prescription, &json!({}))
            .await
            .expect_err("500 should be rejected");

        assert_eq!(err, IntakeError::Rejected(500));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            HttpIntakeClient::new(&format!("http://{addr}"), Some(Duration::from_secs(2))).unwrap();
        let err = client
            .post(IntakeEndpoint::Prescription, &json!({}))
            .await
            .expect_err("closed port should fail");

        assert!(matches!(err, IntakeError::Transport(_)));
    }
}
