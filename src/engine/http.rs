use std::{io::Read, time::Duration};

use super::{ImageMetadata, ImageSource};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Environment variable with the address of the engine.
const HOST_VARIABLE: &str = "DOCKER_HOST";

/// Address used when `DOCKER_HOST` is not set.
const DEFAULT_HOST: &str = "tcp://127.0.0.1:2375";

/// Port used by the engine for TLS connections.
const TLS_PORT: &str = ":2376";

/// Timeout to establish a connection.
///
/// There is no timeout for reading responses, since exporting a large
/// image may take a long time.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported engine address: {0}")]
    InvalidHost(String),
}

impl From<ureq::Error> for EngineError {
    fn from(value: ureq::Error) -> Self {
        EngineError::Http(Box::new(value))
    }
}

/// Client for the HTTP API of a Docker Engine.
///
/// Only TCP connections are supported.
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
}

impl Client {
    /// Create a client for the engine at `host`.
    ///
    /// `host` can be a URL (`tcp://`, `http://`, or `https://`), or an
    /// address like `127.0.0.1:2375`. The scheme for addresses is `https://`
    /// if the port is `2376`, or `http://` in any other case.
    pub fn new(host: &str) -> Result<Self, EngineError> {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout_connect(CONNECT_TIMEOUT)
            .build();

        Ok(Client {
            agent,
            base_url: base_url(host)?,
        })
    }

    /// Create a client for the engine in the `DOCKER_HOST` environment
    /// variable.
    pub fn from_env() -> Result<Self, EngineError> {
        match std::env::var(HOST_VARIABLE) {
            Ok(host) if !host.is_empty() => Self::new(&host),
            _ => Self::new(DEFAULT_HOST),
        }
    }

    /// Send requests to a specific version of the API, like `1.43`.
    pub fn api_version(mut self, version: &str) -> Self {
        let version = version.strip_prefix('v').unwrap_or(version);
        self.base_url = format!("{}/v{}", self.base_url, version);
        self
    }

    /// URL of the API, including the version, if any.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a `GET` request to the engine.
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ureq::Response, EngineError> {
        let url = format!("{}/{}", self.base_url, path);

        let request = query
            .iter()
            .fold(self.agent.get(&url), |r, (k, v)| r.query(k, v));

        log::debug!("GET {}", request.url());

        Ok(request.call()?)
    }
}

impl ImageSource for Client {
    type Export = Box<dyn Read + Send + Sync + 'static>;

    type Error = EngineError;

    fn inspect(&self, image_id: &str) -> Result<ImageMetadata, EngineError> {
        #[derive(serde::Deserialize, Debug)]
        #[serde(rename_all = "PascalCase")]
        struct Image {
            id: String,

            #[serde(rename = "RootFS")]
            root_fs: RootFs,
        }

        #[derive(serde::Deserialize, Debug)]
        #[serde(rename_all = "PascalCase")]
        struct RootFs {
            #[serde(default)]
            layers: Vec<String>,
        }

        let response = self.get(&format!("images/{image_id}/json"), &[])?;
        let image: Image = serde_json::from_reader(response.into_reader())?;

        Ok(ImageMetadata {
            id: image.id,
            layers: image.root_fs.layers,
        })
    }

    fn engine_version(&self) -> Result<String, EngineError> {
        #[derive(serde::Deserialize, Debug)]
        #[serde(rename_all = "PascalCase")]
        struct Version {
            version: String,
        }

        let response = self.get("version", &[])?;
        let version: Version = serde_json::from_reader(response.into_reader())?;

        Ok(version.version)
    }

    fn export(&self, image_id: &str) -> Result<Self::Export, EngineError> {
        let response = self.get("images/get", &[("names", image_id)])?;
        Ok(response.into_reader())
    }
}

/// Build the base URL for the API from the address in `host`.
fn base_url(host: &str) -> Result<String, EngineError> {
    const HTTP: &str = "http://";
    const HTTPS: &str = "https://";

    let host = host.trim_end_matches('/');

    let url = if let Some(address) = host.strip_prefix("tcp://") {
        let scheme = if address.ends_with(TLS_PORT) { HTTPS } else { HTTP };
        format!("{scheme}{address}")
    } else if host.starts_with(HTTP) || host.starts_with(HTTPS) {
        host.to_owned()
    } else if host.contains("://") || host.is_empty() {
        return Err(EngineError::InvalidHost(host.to_owned()));
    } else {
        let scheme = if host.ends_with(TLS_PORT) { HTTPS } else { HTTP };
        format!("{scheme}{host}")
    };

    Ok(url)
}

#[test]
fn engine_base_urls() {
    let cases = [
        ("tcp://127.0.0.1:2375", "http://127.0.0.1:2375"),
        ("tcp://docker.example.com:2376/", "https://docker.example.com:2376"),
        ("http://10.0.0.1:2375", "http://10.0.0.1:2375"),
        ("https://10.0.0.1", "https://10.0.0.1"),
        ("localhost:2375", "http://localhost:2375"),
        ("engine:2376", "https://engine:2376"),
    ];

    for (host, expected) in cases {
        assert_eq!(base_url(host).unwrap(), expected, "{host}");
    }

    for host in ["unix:///var/run/docker.sock", "npipe:////./pipe/docker", ""] {
        assert!(matches!(base_url(host), Err(EngineError::InvalidHost(_))));
    }
}
