//! High level login orchestration.
//!
//! Wires the envelope builder, the SOAP transport and the reply interpreter
//! into one stateless call: build, send, interpret. Every path ends in a
//! [`LoginOutcome`]; nothing past construction returns an error.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{ConfigError, ServiceConfig};
use crate::interpreter::ResponseInterpreter;
use crate::modules::events::{
    EventDispatcher, EventHandler, LoggingHandler, LoginEvent, OutcomeEvent, RequestEvent,
    ResponseEvent, TransportFailureEvent,
};
use crate::outcome::{LoginOutcome, NON_XML_REPLY, OutcomeKind};
use crate::soap::{Credentials, EnvelopeBuilder, SoapVersion};
use crate::transport::{ReqwestSoapHttpClient, SoapHttpClient, SoapTransport, TransportResult};

/// Detail reported when a call is cancelled before the reply arrives.
pub const CANCELLED_DETAIL: &str = "request cancelled";

/// Result alias used by client construction.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while building a [`LoginClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client initialisation failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Which form handler the caller triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Login,
    Register,
}

impl FormAction {
    /// `login` (any case) or an empty handler means login; anything else is
    /// treated as a registration attempt.
    pub fn from_handler(handler: &str) -> Self {
        let handler = handler.trim();
        if handler.is_empty() || handler.eq_ignore_ascii_case("login") {
            Self::Login
        } else {
            Self::Register
        }
    }
}

/// Fluent builder for [`LoginClient`].
pub struct LoginClientBuilder {
    config: ServiceConfig,
    http_client: Option<Arc<dyn SoapHttpClient>>,
    interpreter: ResponseInterpreter,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl LoginClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            http_client: None,
            interpreter: ResponseInterpreter::new(),
            handlers: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn with_service_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.service_namespace = namespace.into();
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.config.operation = operation.into();
        self
    }

    pub fn with_soap_version(mut self, version: SoapVersion) -> Self {
        self.config.soap_version = version;
        self
    }

    /// Whole-request timeout, rounded down to seconds (at least one).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_default_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.config.default_client_ip = ip.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    /// Replace the reqwest transport, e.g. with a stub in tests.
    pub fn with_http_client(mut self, client: Arc<dyn SoapHttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_interpreter(mut self, interpreter: ResponseInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> ClientResult<LoginClient> {
        LoginClient::from_parts(self)
    }
}

impl Default for LoginClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless login client. Safe to share between tasks; calls never
/// influence each other.
pub struct LoginClient {
    config: ServiceConfig,
    action: String,
    envelopes: EnvelopeBuilder,
    transport: SoapTransport,
    interpreter: ResponseInterpreter,
    events: Arc<EventDispatcher>,
}

impl LoginClient {
    /// Construct a client for the default service configuration.
    pub fn new() -> ClientResult<Self> {
        LoginClientBuilder::new().build()
    }

    /// Obtain a builder to customise the client instance.
    pub fn builder() -> LoginClientBuilder {
        LoginClientBuilder::new()
    }

    fn from_parts(parts: LoginClientBuilder) -> ClientResult<Self> {
        let LoginClientBuilder {
            config,
            http_client,
            interpreter,
            handlers,
        } = parts;

        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let http_client: Arc<dyn SoapHttpClient> = match http_client {
            Some(client) => client,
            None => Arc::new(ReqwestSoapHttpClient::new(
                config.timeout(),
                config.connect_timeout(),
                config.user_agent.as_deref(),
            )?),
        };

        let mut events = EventDispatcher::new();
        events.register_handler(Arc::new(LoggingHandler));
        for handler in handlers {
            events.register_handler(handler);
        }

        let envelopes = EnvelopeBuilder::new(&config.service_namespace, &config.operation)
            .with_version(config.soap_version);

        Ok(Self {
            action: config.soap_action(),
            envelopes,
            transport: SoapTransport::new(http_client, endpoint),
            interpreter,
            events: Arc::new(events),
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn soap_action(&self) -> &str {
        &self.action
    }

    /// Assemble credentials, falling back to the configured client address
    /// when `client_ip` is absent or blank.
    pub fn credentials(&self, username: &str, password: &str, client_ip: Option<&str>) -> Credentials {
        let ip = client_ip
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(&self.config.default_client_ip);
        Credentials::new(username, password, ip)
    }

    /// Log in with the configured SOAP version.
    pub async fn login(&self, username: &str, password: &str, client_ip: Option<&str>) -> LoginOutcome {
        let credentials = self.credentials(username, password, client_ip);
        self.login_with(credentials, self.config.soap_version).await
    }

    /// Log in using an explicit transport strategy for this call only.
    pub async fn login_with(&self, credentials: Credentials, version: SoapVersion) -> LoginOutcome {
        self.login_until(credentials, version, std::future::pending::<()>())
            .await
    }

    /// Log in, aborting the in-flight request as soon as `cancel` resolves.
    ///
    /// A cancelled call still completes with a connection-failure outcome.
    pub async fn login_until<F>(
        &self,
        credentials: Credentials,
        version: SoapVersion,
        cancel: F,
    ) -> LoginOutcome
    where
        F: Future<Output = ()>,
    {
        if !credentials.is_complete() {
            let outcome = LoginOutcome::missing_credentials();
            self.emit_outcome(&outcome, None, None);
            return outcome;
        }

        let envelope = self
            .envelopes
            .clone()
            .with_version(version)
            .build(&credentials);

        self.events.dispatch(LoginEvent::RequestSent(RequestEvent {
            endpoint: self.transport.endpoint().clone(),
            action: self.action.clone(),
            version,
            username: credentials.username.clone(),
            timestamp: chrono::Utc::now(),
        }));

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel => TransportResult::ConnectionFailed {
                detail: CANCELLED_DETAIL.to_string(),
            },
            result = self.transport.send(&envelope, &self.action) => result,
        };

        self.settle(result, started.elapsed())
    }

    /// Registration is switched off; always answers with a fixed failure.
    pub fn register(&self) -> LoginOutcome {
        let outcome = LoginOutcome::registration_disabled();
        self.emit_outcome(&outcome, None, None);
        outcome
    }

    /// Route a form submission to login or to the disabled registration.
    pub async fn handle(
        &self,
        action: FormAction,
        username: &str,
        password: &str,
        client_ip: Option<&str>,
    ) -> LoginOutcome {
        match action {
            FormAction::Login => self.login(username, password, client_ip).await,
            FormAction::Register => self.register(),
        }
    }

    fn settle(&self, result: TransportResult, latency: Duration) -> LoginOutcome {
        let kind = result.label();

        match result {
            TransportResult::Delivered {
                status_code,
                content_type,
                body,
            } => {
                self.events.dispatch(LoginEvent::ResponseReceived(ResponseEvent {
                    endpoint: self.transport.endpoint().clone(),
                    status: status_code,
                    content_type,
                    latency,
                    timestamp: chrono::Utc::now(),
                }));

                let interpretation = self.interpreter.interpret_detailed(&body);
                self.emit_outcome(
                    &interpretation.outcome,
                    Some(interpretation.path),
                    interpretation.signature,
                );
                interpretation.outcome
            }
            TransportResult::ConnectionFailed { detail } => {
                self.transport_failed(kind, None, &detail, latency);
                self.finish(LoginOutcome::failure(
                    OutcomeKind::ConnectionFailure,
                    format!("Connection error: {detail}"),
                    detail,
                ))
            }
            TransportResult::NonSuccessStatus { status_code, body } => {
                self.transport_failed(kind, Some(status_code), "non-success status", latency);
                self.finish(LoginOutcome::failure(
                    OutcomeKind::ProtocolFailure,
                    format!("HTTP {status_code}"),
                    body,
                ))
            }
            TransportResult::NonXmlBody { body } => {
                self.transport_failed(kind, None, "reply is not XML", latency);
                self.finish(LoginOutcome::failure(
                    OutcomeKind::ProtocolFailure,
                    NON_XML_REPLY,
                    body,
                ))
            }
        }
    }

    fn finish(&self, outcome: LoginOutcome) -> LoginOutcome {
        self.emit_outcome(&outcome, None, None);
        outcome
    }

    fn transport_failed(&self, kind: &'static str, status: Option<u16>, detail: &str, latency: Duration) {
        self.events.dispatch(LoginEvent::TransportFailed(TransportFailureEvent {
            endpoint: self.transport.endpoint().clone(),
            kind,
            status,
            detail: detail.to_string(),
            latency,
            timestamp: chrono::Utc::now(),
        }));
    }

    fn emit_outcome(
        &self,
        outcome: &LoginOutcome,
        path: Option<crate::interpreter::DecisionPath>,
        signature: Option<String>,
    ) {
        self.events.dispatch(LoginEvent::Classified(OutcomeEvent {
            kind: outcome.kind,
            success: outcome.success,
            path,
            signature,
            timestamp: chrono::Utc::now(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::DecisionPath;
    use crate::outcome::{MISSING_CREDENTIALS, REGISTRATION_DISABLED, RESPONSE_RECEIVED, SERVICE_UNAVAILABLE};
    use crate::transport::{SoapHttpClientError, SoapHttpResponse};
    use async_trait::async_trait;
    use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use std::sync::Mutex;
    use url::Url;

    #[derive(Default)]
    struct StubClient {
        responses: Mutex<Vec<Result<SoapHttpResponse, SoapHttpClientError>>>,
        requests: Mutex<Vec<(HeaderMap, String)>>,
        hang: bool,
    }

    impl StubClient {
        fn replying(responses: Vec<Result<SoapHttpResponse, SoapHttpClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                ..Default::default()
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                hang: true,
                ..Default::default()
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_body(&self) -> String {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|(_, body)| body.clone())
                .expect("no request recorded")
        }

        fn last_headers(&self) -> HeaderMap {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|(headers, _)| headers.clone())
                .expect("no request recorded")
        }
    }

    #[async_trait]
    impl SoapHttpClient for StubClient {
        async fn post(
            &self,
            _url: &Url,
            headers: &HeaderMap,
            body: Vec<u8>,
        ) -> Result<SoapHttpResponse, SoapHttpClientError> {
            self.requests
                .lock()
                .unwrap()
                .push((headers.clone(), String::from_utf8(body).unwrap()));
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("no more stub responses")
        }
    }

    struct RecordingHandler(Mutex<Vec<LoginEvent>>);

    impl EventHandler for RecordingHandler {
        fn handle(&self, event: &LoginEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn soap_reply(status: u16, inner: &str) -> Result<SoapHttpResponse, SoapHttpClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/soap+xml; charset=utf-8"),
        );
        let body = format!(
            r#"<?xml version="1.0"?><SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"><SOAP-ENV:Body><NS1:LoginResponse xmlns:NS1="urn:ICUTech.Intf-IICUTech">{inner}</NS1:LoginResponse></SOAP-ENV:Body></SOAP-ENV:Envelope>"#
        );
        Ok(SoapHttpResponse {
            status,
            headers,
            body: body.into_bytes(),
        })
    }

    fn raw_reply(status: u16, content_type: &'static str, body: &str) -> Result<SoapHttpResponse, SoapHttpClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Ok(SoapHttpResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        })
    }

    fn client(stub: Arc<StubClient>) -> LoginClient {
        LoginClient::builder()
            .with_endpoint("http://soap.test/service")
            .with_http_client(stub)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn structured_success_round_trip() {
        let stub = StubClient::replying(vec![soap_reply(
            200,
            r#"<return>{"ResultCode":0,"ResultMessage":"ok"}</return>"#,
        )]);
        let outcome = client(stub.clone()).login("alice", "secret", Some("10.1.2.3")).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, "ok");
        assert!(outcome.raw_body.contains("LoginResponse"));

        let sent = stub.last_body();
        assert!(sent.contains("<UserName>alice</UserName>"));
        assert!(sent.contains("<IPs>10.1.2.3</IPs>"));
        assert_eq!(
            stub.last_headers().get(CONTENT_TYPE).unwrap(),
            r#"application/soap+xml; charset=utf-8; action="http://tempuri.org/Login""#
        );
    }

    #[tokio::test]
    async fn structured_rejection_round_trip() {
        let stub = StubClient::replying(vec![soap_reply(
            200,
            r#"<return>{"ResultCode":5,"ResultMessage":"bad password"}</return>"#,
        )]);
        let outcome = client(stub).login("alice", "wrong", None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "bad password");
        assert_eq!(outcome.kind, OutcomeKind::Rejected);
    }

    #[tokio::test]
    async fn provider_fault_round_trip() {
        let stub = StubClient::replying(vec![soap_reply(
            200,
            "<LoginResult>Cannot open file via FileZilla</LoginResult>",
        )]);
        let outcome = client(stub).login("alice", "secret", None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, SERVICE_UNAVAILABLE);
        assert_eq!(outcome.kind, OutcomeKind::RemoteInfrastructureFault);
    }

    #[tokio::test]
    async fn missing_client_ip_uses_configured_default() {
        let stub = StubClient::replying(vec![soap_reply(200, "<return></return>")]);
        let outcome = client(stub.clone()).login("alice", "secret", Some("   ")).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, RESPONSE_RECEIVED);
        assert!(stub.last_body().contains("<IPs>0.0.0.0</IPs>"));
    }

    #[tokio::test]
    async fn non_success_status_preserves_body() {
        let stub = StubClient::replying(vec![
            raw_reply(503, "text/html", "<html>maintenance</html>"),
            raw_reply(500, "text/plain", ""),
        ]);
        let client = client(stub);

        let first = client.login("alice", "secret", None).await;
        assert!(!first.success);
        assert_eq!(first.message, "HTTP 503");
        assert_eq!(first.raw_body, "<html>maintenance</html>");
        assert_eq!(first.kind, OutcomeKind::ProtocolFailure);

        let second = client.login("alice", "secret", None).await;
        assert!(!second.success);
        assert_eq!(second.raw_body, "");
    }

    #[tokio::test]
    async fn html_reply_is_a_protocol_failure() {
        let stub = StubClient::replying(vec![raw_reply(
            200,
            "text/html",
            "<html><body>Error</body></html>",
        )]);
        let outcome = client(stub).login("alice", "secret", None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, NON_XML_REPLY);
        assert_eq!(outcome.raw_body, "<html><body>Error</body></html>");
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        let stub = StubClient::replying(vec![Err(SoapHttpClientError::Timeout(
            "operation timed out".into(),
        ))]);
        let outcome = client(stub).login("alice", "secret", None).await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind, OutcomeKind::ConnectionFailure);
        assert_eq!(
            outcome.message,
            "Connection error: request timed out: operation timed out"
        );
        assert_eq!(outcome.raw_body, "request timed out: operation timed out");
    }

    #[tokio::test]
    async fn blank_credentials_never_hit_the_network() {
        let stub = StubClient::replying(Vec::new());
        let client = client(stub.clone());

        let outcome = client.login("  ", "secret", None).await;
        assert_eq!(outcome.message, MISSING_CREDENTIALS);
        assert_eq!(outcome.kind, OutcomeKind::InvalidInput);

        let outcome = client.login("alice", "", None).await;
        assert!(!outcome.success);
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test]
    async fn per_call_strategy_switches_headers() {
        let stub = StubClient::replying(vec![soap_reply(200, "<return>ok</return>")]);
        let client = client(stub.clone());
        let credentials = client.credentials("alice", "secret", None);

        let outcome = client.login_with(credentials, SoapVersion::Soap11).await;
        assert!(outcome.success);

        let headers = stub.last_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/xml; charset=utf-8");
        assert_eq!(headers.get("soapaction").unwrap(), r#""http://tempuri.org/Login""#);
        assert!(stub.last_body().contains(crate::soap::SOAP_11_NS));
    }

    #[tokio::test]
    async fn cancellation_resolves_to_connection_failure() {
        let stub = StubClient::hanging();
        let client = client(stub);
        let credentials = client.credentials("alice", "secret", None);

        let outcome = client
            .login_until(
                credentials,
                SoapVersion::Soap12,
                tokio::time::sleep(Duration::from_millis(20)),
            )
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind, OutcomeKind::ConnectionFailure);
        assert_eq!(outcome.raw_body, CANCELLED_DETAIL);
    }

    #[tokio::test]
    async fn registration_is_disabled() {
        let stub = StubClient::replying(Vec::new());
        let client = client(stub.clone());

        let outcome = client
            .handle(FormAction::from_handler("register"), "alice", "secret", None)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, REGISTRATION_DISABLED);
        assert_eq!(outcome.kind, OutcomeKind::Disabled);
        assert_eq!(stub.request_count(), 0);
    }

    #[test]
    fn form_action_parsing() {
        assert_eq!(FormAction::from_handler(""), FormAction::Login);
        assert_eq!(FormAction::from_handler(" LOGIN "), FormAction::Login);
        assert_eq!(FormAction::from_handler("signup"), FormAction::Register);
    }

    #[tokio::test]
    async fn events_follow_the_call() {
        let recorder = Arc::new(RecordingHandler(Mutex::new(Vec::new())));
        let stub = StubClient::replying(vec![soap_reply(200, "<return>Invalid session exception</return>")]);
        let client = LoginClient::builder()
            .with_endpoint("http://soap.test/service")
            .with_http_client(stub)
            .with_event_handler(recorder.clone())
            .build()
            .unwrap();

        let outcome = client.login("alice", "top-secret", None).await;
        assert_eq!(outcome.message, "Invalid session exception");

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], LoginEvent::RequestSent(req) if req.username == "alice"));
        assert!(matches!(&events[1], LoginEvent::ResponseReceived(resp) if resp.status == 200));
        assert!(matches!(
            &events[2],
            LoginEvent::Classified(OutcomeEvent { path: Some(DecisionPath::ErrorText), success: false, .. })
        ));
        assert!(!format!("{events:?}").contains("top-secret"));
    }

    #[test]
    fn invalid_configuration_fails_the_build() {
        let result = LoginClient::builder()
            .with_endpoint("mailto:someone@example.com")
            .with_http_client(StubClient::replying(Vec::new()))
            .build();
        assert!(matches!(result, Err(ClientError::Config(ConfigError::UnsupportedScheme(_)))));

        let result = LoginClient::builder()
            .with_operation("bad name")
            .with_http_client(StubClient::replying(Vec::new()))
            .build();
        assert!(matches!(result, Err(ClientError::Config(ConfigError::Invalid(_)))));
    }
}
