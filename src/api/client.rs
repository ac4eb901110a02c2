//! Endpoint wrappers for the 7SIGNAL Eyeris API.
//!
//! Thin layer mapping typed operations onto `RequestExecutor` calls:
//! authentication, the agents inventory, analysis submission, and result
//! polling. URL and body shapes live here and nowhere else.

use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::executor::RequestExecutor;
use crate::api::transport::ApiRequest;
use crate::models::{
    AgentRecord, AgentsResponse, AnalysisKind, AnalysisPayload, AnalysisWindow, JobHandle,
    SubmissionResponse, Token,
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// API client bound to one environment base URL.
pub struct EyerisClient {
    executor: RequestExecutor,
    base_url: String,
}

impl EyerisClient {
    pub fn new(executor: RequestExecutor, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { executor, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// OAuth2 client-credentials grant; yields the bearer token for the run.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Token, ApiError> {
        let request = ApiRequest::post_form(
            self.url("/oauth2/token"),
            vec![
                ("client_id".to_string(), client_id.to_string()),
                ("client_secret".to_string(), client_secret.to_string()),
                ("grant_type".to_string(), "client_credentials".to_string()),
            ],
        );

        let response: TokenResponse = self.executor.execute(request).await?;
        response
            .access_token
            .filter(|token| !token.is_empty())
            .map(Token::new)
            .ok_or(ApiError::MissingToken)
    }

    /// Fetch the organization's monitored device inventory.
    pub async fn fetch_agents(&self, token: &Token) -> Result<Vec<AgentRecord>, ApiError> {
        let request = ApiRequest::get(self.url("/eyes/agents")).with_bearer(token.as_str());
        let response: AgentsResponse = self.executor.execute(request).await?;
        Ok(response.results)
    }

    /// Submit one (device, kind, window) analysis job.
    ///
    /// A 2xx reply is returned as-is; deciding whether the correlation ids
    /// are complete is the pipeline's call.
    pub async fn submit_analysis(
        &self,
        token: &Token,
        device_id: &str,
        kind: AnalysisKind,
        window: &AnalysisWindow,
    ) -> Result<SubmissionResponse, ApiError> {
        let request = ApiRequest::post_json(
            self.url("/eyeris/agents/client-analysis"),
            json!({
                "agentId": device_id,
                "type": kind.api_type(),
                "from": window.from_param(),
                "to": window.to_param(),
            }),
        )
        .with_bearer(token.as_str());

        self.executor.execute(request).await
    }

    /// Retrieve the completed result for a previously submitted job.
    pub async fn fetch_analysis_result(
        &self,
        token: &Token,
        handle: &JobHandle,
    ) -> Result<AnalysisPayload, ApiError> {
        let url = format!(
            "{}/eyeris/agents/client-analysis/{}?requestQueueId={}",
            self.base_url, handle.request_id, handle.request_queue_id
        );
        let request = ApiRequest::get(url).with_bearer(token.as_str());
        self.executor.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::limiter::RateLimiter;
    use crate::api::transport::testing::{ok_json, status, StubTransport};
    use crate::api::transport::{Method, RequestBody};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(transport: Arc<StubTransport>) -> EyerisClient {
        let limiter = Arc::new(RateLimiter::with_pacing(1000.0, 1000.0, Duration::ZERO));
        let executor = RequestExecutor::new(transport, limiter);
        EyerisClient::new(executor, "https://api-v2.7signal.com/")
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let transport = Arc::new(StubTransport::new(|_, _| {
            ok_json(json!({"access_token": "abc123"}))
        }));
        let client = client(transport.clone());

        let token = client.authenticate("id", "secret").await.unwrap();
        assert_eq!(token.as_str(), "abc123");

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].url, "https://api-v2.7signal.com/oauth2/token");
        match sent[0].body {
            Some(RequestBody::Form(ref fields)) => {
                assert!(fields
                    .iter()
                    .any(|(k, v)| k == "grant_type" && v == "client_credentials"));
            }
            _ => panic!("expected form body"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_missing_token() {
        let transport = Arc::new(StubTransport::new(|_, _| ok_json(json!({}))));
        let client = client(transport);

        let err = client.authenticate("id", "secret").await.unwrap_err();
        assert_eq!(err.to_string(), "No token received");
    }

    #[tokio::test]
    async fn test_authenticate_surfaces_http_error() {
        let transport = Arc::new(StubTransport::new(|_, _| status(401, "bad credentials")));
        let client = client(transport);

        let err = client.authenticate("id", "secret").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 401: bad credentials");
    }

    #[tokio::test]
    async fn test_fetch_agents_parses_results() {
        let transport = Arc::new(StubTransport::new(|_, _| {
            ok_json(json!({
                "results": [
                    {"id": "d1", "name": "lobby-sensor", "isLicensed": true},
                    {"id": "d2", "nickname": "warehouse", "isLicensed": false}
                ]
            }))
        }));
        let client = client(transport.clone());

        let agents = client
            .fetch_agents(&Token::new("tok"))
            .await
            .unwrap();

        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].id, "d1");
        assert!(agents[0].is_licensed);
        assert_eq!(agents[1].nickname.as_deref(), Some("warehouse"));

        let sent = transport.requests();
        assert_eq!(sent[0].url, "https://api-v2.7signal.com/eyes/agents");
        assert_eq!(sent[0].bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_submit_analysis_body_shape() {
        let transport = Arc::new(StubTransport::new(|_, _| {
            ok_json(json!({"requestId": "r1", "requestQueueId": "q1"}))
        }));
        let client = client(transport.clone());
        let window = AnalysisWindow {
            from: 1_000,
            to: 8_200_000,
        };

        let submission = client
            .submit_analysis(&Token::new("tok"), "dev-9", AnalysisKind::Congestion, &window)
            .await
            .unwrap();

        assert_eq!(submission.request_id.as_deref(), Some("r1"));

        let sent = transport.requests();
        match sent[0].body {
            Some(RequestBody::Json(ref body)) => {
                assert_eq!(body["agentId"], "dev-9");
                assert_eq!(body["type"], "CONGESTION");
                // Window bounds travel as millisecond strings
                assert_eq!(body["from"], "1000");
                assert_eq!(body["to"], "8200000");
            }
            _ => panic!("expected json body"),
        }
    }

    #[tokio::test]
    async fn test_fetch_analysis_result_url() {
        let transport = Arc::new(StubTransport::new(|_, _| {
            ok_json(json!({"response": "Number of Issues: 0"}))
        }));
        let client = client(transport.clone());
        let handle = JobHandle {
            request_id: "r42".to_string(),
            request_queue_id: "q7".to_string(),
        };

        let payload = client
            .fetch_analysis_result(&Token::new("tok"), &handle)
            .await
            .unwrap();

        assert_eq!(payload.response, "Number of Issues: 0");
        assert_eq!(
            transport.requests()[0].url,
            "https://api-v2.7signal.com/eyeris/agents/client-analysis/r42?requestQueueId=q7"
        );
    }
}
