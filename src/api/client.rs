use crate::api::response::{decode_table, extract_count};
use crate::api::routes;
use crate::config::api_config::ApiConfig;
use crate::data::datatable::ResultTable;
use crate::error::{FunifierError, Result};
use crate::query::pipelines::{self, NamedQuery};
use crate::query::template::QueryContext;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RANGE};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Verbs the Funifier client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = FunifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(FunifierError::validation(format!(
                "unsupported HTTP method '{}'",
                other
            ))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// `Basic base64("{api_key}:{app_secret}")`
pub fn basic_auth_header(api_key: &str, app_secret: &str) -> String {
    let credentials = format!("{}:{}", api_key, app_secret);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

/// Client for the Funifier REST API.
///
/// Holds only the immutable configuration and a pooled HTTP client, so one
/// instance can be shared by reference across threads.
pub struct FunifierApi {
    config: ApiConfig,
    client: reqwest::blocking::Client,
    headers: HeaderMap,
}

impl FunifierApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: ApiConfig, timeout: Duration) -> Result<Self> {
        info!(target: "funifier_api", "Initializing Funifier API for {}", config.base_url());

        let headers = build_headers(&config)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FunifierError::Connectivity {
                url: config.base_url().to_string(),
                source: e,
            })?;

        Ok(Self {
            config,
            client,
            headers,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Absolute URL of `route`. Hosts without a scheme are reached over https.
    pub fn url_for(&self, route: &str) -> String {
        let base = self.config.base_url();
        let base = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("https://{}", base)
        };
        format!("{}/{}{}", base, self.config.version(), route)
    }

    /// Send one request and return the response body as text
    pub fn request(&self, method: HttpMethod, route: &str, body: Option<&str>) -> Result<String> {
        let url = self.url_for(route);
        info!(target: "funifier_api", "{} /{}{}", method, self.config.version(), route);

        let mut request = self
            .client
            .request(method.into(), &url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.body(body.as_bytes().to_vec());
        }

        let started = Instant::now();
        let response = request
            .send()
            .map_err(|e| FunifierError::Connectivity {
                url: url.clone(),
                source: e,
            })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| FunifierError::Connectivity {
                url: url.clone(),
                source: e,
            })?;

        debug!(
            target: "funifier_api",
            "{} {} -> {} ({} bytes, {} ms)",
            method,
            route,
            status,
            bytes.len(),
            started.elapsed().as_millis()
        );

        String::from_utf8(bytes.to_vec())
            .map_err(|e| FunifierError::decode(format!("response is not UTF-8: {}", e)))
    }

    pub fn get(&self, route: &str) -> Result<String> {
        self.request(HttpMethod::Get, route, None)
    }

    pub fn post(&self, route: &str, body: &str) -> Result<String> {
        self.request(HttpMethod::Post, route, Some(body))
    }

    /// Render `query` with `ctx`, post it and decode the answer
    pub fn run_query(&self, query: NamedQuery, ctx: &QueryContext) -> Result<ResultTable> {
        let body = query.template().render_pipeline(ctx)?;
        let response = self.post(query.route(), &body)?;
        decode_table(&response, query.name())
    }

    pub fn run_count(&self, query: NamedQuery, ctx: &QueryContext) -> Result<i64> {
        let table = self.run_query(query, ctx)?;
        extract_count(&table)
    }

    /// Number of players holding the given lottery ticket
    pub fn count_lottery_participants(&self, ticket_uid: &str) -> Result<i64> {
        let ctx = QueryContext::new().with_ticket_uid(ticket_uid);
        self.run_count(NamedQuery::CountLotteryParticipants, &ctx)
    }

    /// Winners of a lottery joined with the contact data they entered when
    /// buying the matching ticket
    pub fn get_lottery_winners_with_address(
        &self,
        lottery_uid: &str,
        ticket_uid: &str,
    ) -> Result<ResultTable> {
        info!("Getting lottery winners for lottery «{}»", lottery_uid);
        let ctx = QueryContext::new()
            .with_lottery_uid(lottery_uid)
            .with_ticket_uid(ticket_uid);
        self.run_query(NamedQuery::LotteryWinnersWithAddress, &ctx)
    }

    pub fn count_lottery_winners(&self, lottery_uid: &str, n_days: Option<u32>) -> Result<i64> {
        let ctx = QueryContext::new()
            .with_lottery_uid(lottery_uid)
            .with_n_days(n_days);
        self.run_count(NamedQuery::CountLotteryWinners, &ctx)
    }

    pub fn get_lottery_participants(
        &self,
        ticket_uid: &str,
        n_days: Option<u32>,
    ) -> Result<ResultTable> {
        let ctx = QueryContext::new()
            .with_ticket_uid(ticket_uid)
            .with_n_days(n_days);
        self.run_query(NamedQuery::LotteryParticipants, &ctx)
    }

    pub fn count_player_tickets(&self, player_uid: &str, ticket_uid: &str) -> Result<i64> {
        let ctx = QueryContext::new()
            .with_player_uid(player_uid)
            .with_ticket_uid(ticket_uid);
        self.run_count(NamedQuery::CountPlayerTickets, &ctx)
    }

    pub fn get_lottery_uids_by_last_n_entries(&self, n_entries: u32) -> Result<ResultTable> {
        let ctx = QueryContext::new().with_n_entries(n_entries);
        self.run_query(NamedQuery::LotteryUidsByLastEntries, &ctx)
    }

    pub fn get_all_lottery_in_date_range(&self, from_date: &str, to_date: &str) -> Result<ResultTable> {
        let body = pipelines::lotteries_in_date_range(from_date, to_date)?;
        let response = self.post(routes::DB_LOTTERY_AGGR, &body)?;
        decode_table(&response, "get_all_lottery_in_date_range")
    }
}

fn build_headers(config: &ApiConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    insert_header(
        &mut headers,
        AUTHORIZATION,
        &basic_auth_header(config.api_key(), config.app_secret()),
    )?;

    let header = config.header();
    let optional = [
        (CONTENT_TYPE, &header.content_type),
        (ACCEPT, &header.accept),
        (RANGE, &header.range),
    ];
    for (name, value) in optional {
        match value.as_deref() {
            Some(value) if !value.trim().is_empty() => insert_header(&mut headers, name, value)?,
            _ => debug!(target: "funifier_api", "Header {} not set, omitted", name),
        }
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<()> {
    let mut header_value = HeaderValue::from_str(value).map_err(|_| {
        FunifierError::validation(format!("value for header {} contains invalid characters", name))
    })?;
    if name == AUTHORIZATION {
        header_value.set_sensitive(true);
    }
    headers.insert(name, header_value);
    Ok(())
}
