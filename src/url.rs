use crate::error::{ClientError, Result};
use std::net::SocketAddr;

/// Parsed pieces of an `rtsp://host:port/path` URL, plus the original
/// string used verbatim in control requests.
#[derive(Debug, Clone)]
pub struct RtspUrl {
    pub raw: String,
    pub host: String,
    pub port: u16,
}

impl RtspUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed = url::Url::parse(raw).map_err(|e| ClientError::UrlMalformed {
            url: raw.to_string(),
            detail: e.to_string(),
        })?;

        if parsed.scheme() != "rtsp" {
            return Err(ClientError::UrlMalformed {
                url: raw.to_string(),
                detail: format!("expected scheme rtsp, got {}", parsed.scheme()),
            });
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ClientError::UrlMalformed {
                url: raw.to_string(),
                detail: "missing host".to_string(),
            })?
            .to_string();

        let port = parsed.port().unwrap_or(554);

        Ok(RtspUrl {
            raw: raw.to_string(),
            host,
            port,
        })
    }

    pub async fn resolve(&self) -> Result<SocketAddr> {
        use tokio::net::lookup_host;

        let addr = format!("{}:{}", self.host, self.port);
        lookup_host(&addr)
            .await
            .map_err(|e| ClientError::ConnectFailed {
                addr: addr.clone(),
                source: e,
            })?
            .next()
            .ok_or_else(|| ClientError::UrlMalformed {
                url: self.raw.clone(),
                detail: format!("could not resolve {addr}"),
            })
    }
}
