//! Service base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::InvalidInputError;

/// A validated service base URL.
///
/// Must use HTTPS, or HTTP for localhost. Relative feed URIs resolve against
/// it; absolute URIs, such as the next link of a feed, pass through as-is.
///
/// # Example
///
/// ```
/// use gdata_core::ServiceUrl;
///
/// let base = ServiceUrl::new("https://docs.google.com/feeds/").unwrap();
/// assert_eq!(base.resolve("default/private/full"),
///            "https://docs.google.com/feeds/default/private/full");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceUrl(Url);

impl ServiceUrl {
    /// Parse and validate a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::ServiceUrl`] if the URL is relative, has
    /// no host, or uses plain HTTP for a remote host.
    pub fn new(s: impl AsRef<str>) -> Result<Self, InvalidInputError> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ServiceUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;
        Ok(Self(url))
    }

    /// `uri` unchanged if absolute, otherwise appended to the base path.
    pub fn resolve(&self, uri: &str) -> String {
        let absolute = uri.split_once("://").is_some_and(|(scheme, _)| {
            scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("http")
        });
        if absolute {
            return uri.to_string();
        }
        // Url always gives a root path a trailing slash
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, uri.trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), InvalidInputError> {
        let invalid = |reason: &str| InvalidInputError::ServiceUrl {
            value: original.to_string(),
            reason: reason.to_string(),
        };

        if url.cannot_be_a_base() {
            return Err(invalid("must be an absolute URL"));
        }

        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");
        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(invalid("must use HTTPS (HTTP allowed only for localhost)"));
        }

        if url.host_str().is_none() {
            return Err(invalid("must have a host"));
        }

        Ok(())
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServiceUrl {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ServiceUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ServiceUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ServiceUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let url = ServiceUrl::new("https://picasaweb.google.com/data").unwrap();
        assert_eq!(url.host(), Some("picasaweb.google.com"));
    }

    #[test]
    fn valid_localhost_http() {
        let url = ServiceUrl::new("http://localhost:8080").unwrap();
        assert_eq!(url.host(), Some("localhost"));
        assert!(ServiceUrl::new("http://127.0.0.1:9").is_ok());
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(matches!(
            ServiceUrl::new("http://docs.google.com"),
            Err(InvalidInputError::ServiceUrl { .. })
        ));
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ServiceUrl::new("/feeds/default").is_err());
    }

    #[test]
    fn resolves_relative_uris() {
        let root = ServiceUrl::new("https://docs.google.com").unwrap();
        assert_eq!(root.resolve("/feeds/x"), "https://docs.google.com/feeds/x");

        let nested = ServiceUrl::new("https://docs.google.com/feeds").unwrap();
        assert_eq!(nested.resolve("x"), "https://docs.google.com/feeds/x");
    }

    #[test]
    fn absolute_uris_pass_through() {
        let base = ServiceUrl::new("https://docs.google.com").unwrap();
        let next = "https://other.example.com/feed?start-index=11";
        assert_eq!(base.resolve(next), next);
        assert_eq!(base.resolve("HTTPS://other.example.com/a"), "HTTPS://other.example.com/a");
        assert_eq!(base.resolve("Http://localhost/a"), "Http://localhost/a");
    }
}
