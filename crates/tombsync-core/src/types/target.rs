//! Remote deletion targets

use crate::config::TargetConfig;
use crate::{Error, Result};
use std::fmt;
use url::Url;

/// A validated remote site. Built once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub name: String,
    pub endpoint: Url,
    pub access_key: String,
    pub secret_key: String,
    pub insecure_tls: bool,
    pub region: String,
}

impl RemoteTarget {
    /// Validate one configured site. `default_insecure` applies when the
    /// site carries no override of its own.
    pub fn from_config(name: &str, config: &TargetConfig, default_insecure: bool) -> Result<Self> {
        if config.access_key.is_empty() {
            return Err(Error::MissingCredential {
                target: name.to_string(),
                field: "ACCESS",
            });
        }
        if config.secret_key.is_empty() {
            return Err(Error::MissingCredential {
                target: name.to_string(),
                field: "SECRET",
            });
        }

        let endpoint = parse_endpoint(name, &config.endpoint)?;

        Ok(Self {
            name: name.to_string(),
            endpoint,
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            insecure_tls: config.insecure.unwrap_or(default_insecure),
            region: config
                .region
                .clone()
                .unwrap_or_else(|| crate::DEFAULT_REGION.to_string()),
        })
    }

    /// `host[:port]` of the endpoint, for log lines
    pub fn host(&self) -> String {
        match (self.endpoint.host_str(), self.endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => self.endpoint.to_string(),
        }
    }
}

fn parse_endpoint(name: &str, raw: &str) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        target: name.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(invalid("endpoint is empty".into()));
    }

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("endpoint has no host".into()));
    }

    Ok(url)
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("insecure_tls", &self.insecure_tls)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str, access: &str, secret: &str) -> TargetConfig {
        TargetConfig {
            endpoint: endpoint.into(),
            access_key: access.into(),
            secret_key: secret.into(),
            insecure: None,
            region: None,
        }
    }

    #[test]
    fn test_valid_target() {
        let target =
            RemoteTarget::from_config("site2", &config("https://s2.example.com:9000", "ak", "sk"), false)
                .unwrap();

        assert_eq!(target.host(), "s2.example.com:9000");
        assert_eq!(target.endpoint.scheme(), "https");
        assert!(!target.insecure_tls);
        assert_eq!(target.region, "us-east-1");
    }

    #[test]
    fn test_missing_access_key() {
        let err = RemoteTarget::from_config("site2", &config("http://s2", "", "sk"), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "REMOTE_ACCESS_site2 not set");
    }

    #[test]
    fn test_missing_secret_key() {
        let err = RemoteTarget::from_config("site2", &config("http://s2", "ak", ""), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "REMOTE_SECRET_site2 not set");
    }

    #[test]
    fn test_bad_endpoints() {
        for endpoint in ["", "not a url", "ftp://s2.example.com"] {
            let err = RemoteTarget::from_config("s", &config(endpoint, "ak", "sk"), false)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidEndpoint { .. }), "{}", endpoint);
        }
    }

    #[test]
    fn test_insecure_override() {
        let mut cfg = config("https://s2", "ak", "sk");
        assert!(RemoteTarget::from_config("s", &cfg, true).unwrap().insecure_tls);

        cfg.insecure = Some(false);
        assert!(!RemoteTarget::from_config("s", &cfg, true).unwrap().insecure_tls);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let target =
            RemoteTarget::from_config("s", &config("http://s2", "ak", "hunter2"), false).unwrap();
        assert!(!format!("{:?}", target).contains("hunter2"));
    }
}
