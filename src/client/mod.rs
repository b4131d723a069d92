//! Client layer: owns the session and the HTTP transport, maps transport ↔ domain.

mod error;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{
    Endpoint, EntryField, ModuleCatalog, Password, SessionId, UserInfo, Username,
};
use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, decode_json_body, decode_login_result,
    encode_call_form, encode_login_form,
};

pub use error::{CrmError, ErrorKind};

/// Overall request timeout used unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Connect timeout used unless overridden.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);
/// Maximum number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
/// `User-Agent` sent unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("1CRM Rust client version ", env!("CARGO_PKG_VERSION"));

const WIRE_TARGET: &str = "onecrm::wire";

type BoxError = Box<dyn StdError + Send + Sync>;

trait HttpTransport: Send {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

type Connector =
    Arc<dyn Fn(&TransportSettings) -> Result<Box<dyn HttpTransport>, BoxError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TransportSettings {
    timeout: Duration,
    connect_timeout: Duration,
    max_redirects: usize,
    user_agent: String,
    verbose: bool,
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    fn connect(settings: &TransportSettings) -> Result<Box<dyn HttpTransport>, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .cookie_store(true)
            .connection_verbose(settings.verbose)
            .build()?;
        Ok(Box::new(Self { client }))
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let builder = match request.method {
            HttpMethod::Get => {
                let mut url = url::Url::parse(&request.url)?;
                if !request.params.is_empty() {
                    url.query_pairs_mut().extend_pairs(&request.params);
                }
                self.client.get(url)
            }
            HttpMethod::Post => self.client.post(&request.url).form(&request.params),
            HttpMethod::Put => self.client.put(&request.url).form(&request.params),
            HttpMethod::Delete => self.client.delete(&request.url).form(&request.params),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.text()?;
        Ok(HttpResponse {
            status: Some(status),
            headers,
            body,
        })
    }
}

#[derive(Debug, Clone)]
/// Builder for [`CrmClient`].
///
/// Use this when you need to customize timeouts, redirects or the user-agent.
pub struct CrmClientBuilder {
    endpoint: String,
    debug: bool,
    timeout: Duration,
    connect_timeout: Duration,
    max_redirects: usize,
    user_agent: String,
}

impl CrmClientBuilder {
    /// Create a builder with default settings (120 s timeouts, 10 redirects).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Log request parameters, decoded results and connection traces.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the timeout applied to each entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout for establishing a connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set how many redirects a single request may follow.
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the endpoint and build a [`CrmClient`]. No connection is opened.
    pub fn build(self) -> Result<CrmClient, CrmError> {
        let endpoint = Endpoint::new(self.endpoint).map_err(CrmError::invalid_endpoint)?;
        Ok(CrmClient {
            endpoint,
            debug: self.debug,
            settings: TransportSettings {
                timeout: self.timeout,
                connect_timeout: self.connect_timeout,
                max_redirects: self.max_redirects,
                user_agent: self.user_agent,
                verbose: self.debug,
            },
            connector: Arc::new(ReqwestTransport::connect),
            transport: None,
            session_id: None,
            credentials: None,
            modules: ModuleCatalog::new(),
            user_info: UserInfo::new(),
            last_request: None,
        })
    }
}

/// Blocking client for the 1CRM / SugarCRM REST+JSON API.
///
/// One client holds one session against one endpoint:
///
/// 1. [`CrmClient::login`] authenticates and loads the module catalog,
/// 2. [`CrmClient::call`] invokes `method` on a module any number of times,
/// 3. [`CrmClient::close`] (or dropping the client) releases the connection.
///
/// The HTTP connection and its cookie jar are created on the first request and
/// reused until [`CrmClient::close`].
pub struct CrmClient {
    endpoint: Endpoint,
    debug: bool,
    settings: TransportSettings,
    connector: Connector,
    transport: Option<Box<dyn HttpTransport>>,
    session_id: Option<SessionId>,
    credentials: Option<(Username, Password)>,
    modules: ModuleCatalog,
    user_info: UserInfo,
    last_request: Option<Duration>,
}

impl CrmClient {
    /// Create a client for `endpoint`, e.g. `https://crm.example.com/service/v4/rest.php`.
    ///
    /// Fails with [`CrmError::Connection`] if the endpoint is not an absolute
    /// URL with a path. For more customization, use [`CrmClient::builder`].
    pub fn new(endpoint: impl Into<String>, debug: bool) -> Result<Self, CrmError> {
        Self::builder(endpoint).debug(debug).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(endpoint: impl Into<String>) -> CrmClientBuilder {
        CrmClientBuilder::new(endpoint)
    }

    /// Log in, replacing any previous session.
    ///
    /// The password is sent as an unsalted MD5 digest because the API demands
    /// it; that is not a meaningful protection, so only use `https` endpoints.
    ///
    /// Returns the decoded login response without its `available_modules`
    /// list, which is available through [`CrmClient::modules`] instead.
    ///
    /// Errors:
    /// - [`CrmError::Auth`] when the server rejects the credentials,
    /// - [`CrmError::Module`] when the response carries no module information,
    /// - [`CrmError::Connection`] / [`CrmError::Data`] for transport and decoding failures.
    ///
    /// After any failure the client is logged out.
    pub fn login(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Value, CrmError> {
        self.login_with(Username::new(username), Password::new(password))
    }

    /// Log in again with the credentials of the last successful login.
    pub fn relogin(&mut self) -> Result<Value, CrmError> {
        let (username, password) = self
            .credentials
            .clone()
            .ok_or_else(|| CrmError::auth("No stored credentials."))?;
        self.login_with(username, password)
    }

    fn login_with(&mut self, username: Username, password: Password) -> Result<Value, CrmError> {
        self.close();
        self.modules = ModuleCatalog::new();
        self.user_info = UserInfo::new();

        let result = self.request(HttpMethod::Post, encode_login_form(&username, &password))?;
        let outcome = match decode_login_result(result) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.close();
                warn!(endpoint = %self.endpoint, user = username.as_str(), "{err}");
                return Err(err.into());
            }
        };

        debug!(
            endpoint = %self.endpoint,
            user = username.as_str(),
            modules = outcome.modules.len(),
            "logged in"
        );
        self.session_id = Some(outcome.session_id);
        self.credentials = Some((username, password));
        self.modules = outcome.modules;
        self.user_info = outcome.user_info;
        Ok(outcome.result)
    }

    /// One `"{label} ({name})\n"` line per available module, in catalog order.
    pub fn list_modules(&self) -> Result<String, CrmError> {
        if self.modules.is_empty() {
            return Err(CrmError::module("No module information available"));
        }
        Ok(self
            .modules
            .iter()
            .map(|module| format!("{} ({})\n", module.label, module.name))
            .collect())
    }

    /// Whether `module` (the module name, not its label) is available.
    pub fn module_exists(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    /// Call `method` on `module` and return the decoded response as-is.
    ///
    /// `module_name` and `session` are added to `params` before sending.
    ///
    /// Errors:
    /// - [`CrmError::Auth`] when not logged in,
    /// - [`CrmError::Module`] when the module is not in the catalog (nothing is sent),
    /// - [`CrmError::Connection`] / [`CrmError::Data`] for transport and decoding failures.
    pub fn call(
        &mut self,
        module: &str,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, CrmError> {
        let session = self
            .session_id
            .as_ref()
            .ok_or_else(|| CrmError::auth("Not logged in."))?;
        if !self.modules.contains(module) {
            return Err(CrmError::module("Requested non-existent module."));
        }

        let form = encode_call_form(module, method, session, params);
        self.request(HttpMethod::Post, form)
    }

    /// Drop the HTTP connection (and its cookies) and forget the session.
    ///
    /// Safe to call repeatedly; also runs when the client is dropped.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(endpoint = %self.endpoint, "closed HTTP transport");
        }
        self.session_id = None;
    }

    /// The validated endpoint this client talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether request params and decoded responses are logged.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Session id of the current login, `None` when logged out.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether a session is active.
    pub fn is_logged_in(&self) -> bool {
        self.session_id.is_some()
    }

    /// User name of the last successful login.
    pub fn username(&self) -> Option<&Username> {
        self.credentials.as_ref().map(|(username, _)| username)
    }

    /// User details returned by the last successful login.
    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    /// Modules available to the logged-in user, in server order.
    pub fn modules(&self) -> &ModuleCatalog {
        &self.modules
    }

    /// Wall-clock duration of the most recent HTTP exchange.
    pub fn last_request_duration(&self) -> Option<Duration> {
        self.last_request
    }

    /// [`CrmClient::last_request_duration`] in seconds, `0.0` before any request.
    pub fn last_request_secs(&self) -> f64 {
        self.last_request.map_or(0.0, |it| it.as_secs_f64())
    }

    fn request(
        &mut self,
        method: HttpMethod,
        params: Vec<(String, String)>,
    ) -> Result<Value, CrmError> {
        if self.debug {
            debug!(target: WIRE_TARGET, ?params, "request params");
        }

        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => {
                let transport = (self.connector)(&self.settings).map_err(CrmError::transport)?;
                debug!(endpoint = %self.endpoint, "opened HTTP transport");
                transport
            }
        };

        let request = HttpRequest {
            method,
            url: self.endpoint.as_str().to_owned(),
            params,
        };
        let started = Instant::now();
        let response = transport.send(request);
        self.last_request = Some(started.elapsed());
        self.transport = Some(transport);

        let result = decode_json_body(&response.map_err(CrmError::transport)?)?;
        if self.debug {
            debug!(target: WIRE_TARGET, %result, "decoded response");
        }
        Ok(result)
    }
}

impl Drop for CrmClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CrmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmClient")
            .field("endpoint", &self.endpoint)
            .field("debug", &self.debug)
            .field("connected", &self.transport.is_some())
            .field("session_id", &self.session_id)
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}

/// Flatten a `get_entry_list`-style response into its `{name, value}` fields.
///
/// Fails with [`CrmError::Data`] when the response has no `entry_list` array
/// or a field lacks a name.
pub fn decode_entry_list(response: &Value) -> Result<Vec<EntryField>, CrmError> {
    Ok(crate::transport::decode_entry_list(response)?)
}
