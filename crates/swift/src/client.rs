//! Swift client implementation
//!
//! Speaks the Swift v1 object API over reqwest and implements the
//! ObjectBackend trait from zs-core.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use jiff::tz::TimeZone;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap, LAST_MODIFIED};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use zs_core::{
    ContainerInfo, Credentials, Error, ListEntry, ListOptions, ListPage, ObjectBackend,
    ObjectInfo, Result, TimeoutConfig, DEFAULT_LISTING_LIMIT,
};

use crate::auth;

/// Header carrying the session token
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Container read ACL header
pub const CONTAINER_READ_HEADER: &str = "X-Container-Read";

const CONTAINER_OBJECT_COUNT_HEADER: &str = "X-Container-Object-Count";
const CONTAINER_BYTES_USED_HEADER: &str = "X-Container-Bytes-Used";

/// Build the HTTP client for a timeout configuration
pub(crate) fn http_client(timeout: &TimeoutConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_millis(timeout.connect_ms))
        .read_timeout(Duration::from_millis(timeout.read_ms))
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))
}

/// Send a request and turn non-success statuses into errors
pub(crate) async fn send(request: RequestBuilder, context: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Network(format!("Request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_error(status, context, &body))
}

/// Map HTTP status codes to appropriate errors
pub(crate) fn map_error(status: StatusCode, context: &str, body: &str) -> Error {
    let detail = match body.trim() {
        "" => format!("{context} (HTTP {})", status.as_u16()),
        body => format!("{context} (HTTP {}): {body}", status.as_u16()),
    };

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(context.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(detail),
        s if s.is_server_error() => Error::Network(detail),
        _ => Error::General(detail),
    }
}

/// Decode a JSON listing body; Swift answers empty listings with no content
async fn read_json<T: DeserializeOwned + Default>(response: Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;

    if text.trim().is_empty() {
        Ok(T::default())
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> u64 {
    header_str(headers, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Listing timestamps are UTC without an offset, e.g. `2016-03-03T23:35:13.123450`
fn parse_listing_timestamp(value: &str) -> Option<Timestamp> {
    let datetime: jiff::civil::DateTime = value.parse().ok()?;
    datetime.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp())
}

/// `Last-Modified` headers use the HTTP date format
fn parse_http_date(value: &str) -> Option<Timestamp> {
    jiff::fmt::rfc2822::parse(value).ok().map(|z| z.timestamp())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Subdir {
        subdir: String,
    },
    Object {
        name: String,
        #[serde(default)]
        bytes: u64,
        #[serde(default)]
        hash: Option<String>,
        #[serde(default)]
        content_type: Option<String>,
        #[serde(default)]
        last_modified: Option<String>,
    },
}

impl From<RawEntry> for ListEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Subdir { subdir } => ListEntry::Subdir { prefix: subdir },
            RawEntry::Object {
                name,
                bytes,
                hash,
                content_type,
                last_modified,
            } => {
                let mut info = ObjectInfo::new(name, bytes);
                info.hash = hash;
                info.content_type = content_type;
                info.last_modified = last_modified.as_deref().and_then(parse_listing_timestamp);
                ListEntry::Object(info)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawContainer {
    name: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    bytes: u64,
}

impl From<RawContainer> for ContainerInfo {
    fn from(raw: RawContainer) -> Self {
        Self {
            name: raw.name,
            object_count: raw.count,
            bytes_used: raw.bytes,
            read_acl: None,
        }
    }
}

/// Swift client bound to one account
pub struct SwiftClient {
    http: Client,
    storage_url: Url,
    token: String,
    credentials: Credentials,
    timeout: TimeoutConfig,
}

impl SwiftClient {
    /// Connect with resolved credentials
    ///
    /// Password credentials are exchanged for a token first.
    pub async fn connect(credentials: Credentials, timeout: TimeoutConfig) -> Result<Self> {
        let http = http_client(&timeout)?;

        let (storage_url, token) = match &credentials {
            Credentials::PreAuthenticated { storage_url, token } => {
                (storage_url.clone(), token.clone())
            }
            Credentials::Password {
                auth_url,
                user,
                key,
            } => {
                let acquired = auth::request_token(&http, auth_url, user, key).await?;
                (acquired.storage_url, acquired.token)
            }
        };

        let storage_url = Url::parse(&storage_url)?;
        if storage_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Storage URL is not a valid base URL: {storage_url}"
            )));
        }

        tracing::debug!(storage_url = %storage_url, "Connected to Swift");
        Ok(Self {
            http,
            storage_url,
            token,
            credentials,
            timeout,
        })
    }

    /// Account storage URL
    pub fn storage_url(&self) -> &str {
        self.storage_url.as_str()
    }

    /// Session token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Credentials this client was connected with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Timeouts applied to every request
    pub fn timeout(&self) -> &TimeoutConfig {
        &self.timeout
    }

    /// Replace the container read ACL
    pub async fn set_read_acl(&self, container: &str, acl: &str) -> Result<()> {
        let request = self
            .request(Method::POST, self.container_url(container))
            .header(CONTAINER_READ_HEADER, acl);
        send(request, container).await?;
        Ok(())
    }

    fn container_url(&self, container: &str) -> Url {
        let mut url = self.storage_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(container);
        }
        url
    }

    fn object_url(&self, container: &str, name: &str) -> Url {
        let mut url = self.container_url(container);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(name.split('/'));
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "Swift request");
        self.http
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &self.token)
    }
}

#[async_trait]
impl ObjectBackend for SwiftClient {
    async fn get_account(&self) -> Result<Vec<ContainerInfo>> {
        let mut containers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut url = self.storage_url.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("format", "json");
                query.append_pair("limit", &DEFAULT_LISTING_LIMIT.to_string());
                if let Some(marker) = &marker {
                    query.append_pair("marker", marker);
                }
            }

            let response = send(self.request(Method::GET, url), "account").await?;
            let page: Vec<RawContainer> = read_json(response).await?;
            let full = page.len() >= DEFAULT_LISTING_LIMIT;
            marker = page.last().map(|c| c.name.clone());
            containers.extend(page.into_iter().map(ContainerInfo::from));

            if !full {
                break;
            }
        }

        Ok(containers)
    }

    async fn put_container(&self, container: &str) -> Result<()> {
        send(self.request(Method::PUT, self.container_url(container)), container).await?;
        Ok(())
    }

    async fn get_container(&self, container: &str, options: ListOptions) -> Result<ListPage> {
        let limit = options.limit.unwrap_or(DEFAULT_LISTING_LIMIT).max(1);

        let mut url = self.container_url(container);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "json");
            query.append_pair("limit", &limit.to_string());
            if let Some(prefix) = &options.prefix {
                query.append_pair("prefix", prefix);
            }
            if let Some(delimiter) = options.delimiter {
                query.append_pair("delimiter", delimiter.encode_utf8(&mut [0; 4]));
            }
            if let Some(marker) = &options.marker {
                query.append_pair("marker", marker);
            }
        }

        let response = send(self.request(Method::GET, url), container).await?;
        let raw: Vec<RawEntry> = read_json(response).await?;
        let entries: Vec<ListEntry> = raw.into_iter().map(ListEntry::from).collect();

        // Swift does not flag truncation; a full page may have a successor
        let next_marker = if entries.len() >= limit {
            entries.last().map(|entry| entry.name().to_string())
        } else {
            None
        };

        Ok(ListPage {
            entries,
            next_marker,
        })
    }

    async fn head_container(&self, container: &str) -> Result<ContainerInfo> {
        let response = send(self.request(Method::HEAD, self.container_url(container)), container).await?;
        let headers = response.headers();

        Ok(ContainerInfo {
            name: container.to_string(),
            object_count: header_u64(headers, CONTAINER_OBJECT_COUNT_HEADER),
            bytes_used: header_u64(headers, CONTAINER_BYTES_USED_HEADER),
            read_acl: header_str(headers, CONTAINER_READ_HEADER).map(str::to_string),
        })
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let context = format!("{container}/{name}");
        let response = send(
            self.request(Method::GET, self.object_url(container, name)),
            &context,
        )
        .await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read object body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn put_object(&self, container: &str, name: &str, data: Vec<u8>) -> Result<()> {
        let context = format!("{container}/{name}");
        let request = self
            .request(Method::PUT, self.object_url(container, name))
            .body(data);
        send(request, &context).await?;
        Ok(())
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        let context = format!("{container}/{name}");
        send(
            self.request(Method::DELETE, self.object_url(container, name)),
            &context,
        )
        .await?;
        Ok(())
    }

    async fn head_object(&self, container: &str, name: &str) -> Result<ObjectInfo> {
        let context = format!("{container}/{name}");
        let response = send(
            self.request(Method::HEAD, self.object_url(container, name)),
            &context,
        )
        .await?;
        let headers = response.headers();

        let mut info = ObjectInfo::new(name, header_u64(headers, CONTENT_LENGTH));
        info.hash = header_str(headers, ETAG).map(|v| v.trim_matches('"').to_string());
        info.content_type = header_str(headers, CONTENT_TYPE).map(str::to_string);
        info.last_modified = header_str(headers, LAST_MODIFIED).and_then(parse_http_date);
        Ok(info)
    }
}

impl std::fmt::Debug for SwiftClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwiftClient")
            .field("storage_url", &self.storage_url.as_str())
            .field("token", &"***")
            .finish()
    }
}
