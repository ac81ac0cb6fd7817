// Keymerge - Signon realm decomposition
//
// A signon realm such as `https://example.com:8443/Members Area` is stored in
// the keychain as separate attributes: protocol, server, port and security
// domain. Realms that are not URLs are carried verbatim as the server.

use std::fmt;

use url::Url;

use super::Scheme;

/// The keychain-facing components of a signon realm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmParts {
    pub protocol: Option<String>,
    pub server: String,
    pub port: Option<u16>,
    /// The HTTP auth realm name. Always `None` for HTML form logins.
    pub security_domain: Option<String>,
}

impl RealmParts {
    /// Split `signon_realm` into keychain attributes.
    pub fn parse(signon_realm: &str, scheme: Scheme) -> Self {
        let url = match Url::parse(signon_realm) {
            Ok(url) => url,
            Err(_) => return Self::verbatim(signon_realm),
        };
        let Some(host) = url.host_str() else {
            return Self::verbatim(signon_realm);
        };

        let security_domain = if scheme == Scheme::Html {
            None
        } else {
            let path = url.path().trim_start_matches('/');
            (!path.is_empty()).then(|| {
                urlencoding::decode(path)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| path.to_string())
            })
        };

        Self {
            protocol: Some(url.scheme().to_string()),
            server: host.to_string(),
            port: url.port(),
            security_domain,
        }
    }

    fn verbatim(signon_realm: &str) -> Self {
        Self {
            server: signon_realm.to_string(),
            ..Self::default()
        }
    }

    /// Rebuild an origin URL from these parts and an item path.
    pub fn origin(&self, path: Option<&str>) -> String {
        let Some(protocol) = &self.protocol else {
            return self.server.clone();
        };
        let path = path.filter(|p| !p.is_empty()).unwrap_or("/");
        let separator = if path.starts_with('/') { "" } else { "/" };
        match self.port {
            Some(port) => format!("{}://{}:{}{}{}", protocol, self.server, port, separator, path),
            None => format!("{}://{}{}{}", protocol, self.server, separator, path),
        }
    }
}

/// Formats back to the signon realm string.
impl fmt::Display for RealmParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(protocol) = &self.protocol else {
            return f.write_str(&self.server);
        };
        write!(f, "{}://{}", protocol, self.server)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        f.write_str("/")?;
        if let Some(domain) = &self.security_domain {
            f.write_str(domain)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_realm_has_no_security_domain() {
        let parts = RealmParts::parse("https://accounts.example.com/", Scheme::Html);
        assert_eq!(parts.protocol.as_deref(), Some("https"));
        assert_eq!(parts.server, "accounts.example.com");
        assert_eq!(parts.port, None);
        assert_eq!(parts.security_domain, None);
        assert_eq!(parts.to_string(), "https://accounts.example.com/");
    }

    #[test]
    fn test_http_auth_realm_keeps_port_and_domain() {
        let realm = "http://intranet.example.com:8080/Members Area";
        let parts = RealmParts::parse(realm, Scheme::Basic);

        assert_eq!(parts.protocol.as_deref(), Some("http"));
        assert_eq!(parts.server, "intranet.example.com");
        assert_eq!(parts.port, Some(8080));
        assert_eq!(parts.security_domain.as_deref(), Some("Members Area"));
        assert_eq!(parts.to_string(), realm);
    }

    #[test]
    fn test_non_url_realm_is_verbatim() {
        for realm in ["example.com", "a.com", "localhost:3000"] {
            let parts = RealmParts::parse(realm, Scheme::Basic);
            assert_eq!(parts.server, realm);
            assert!(parts.protocol.is_none());
            assert_eq!(parts.to_string(), realm);
        }
    }

    #[test]
    fn test_origin_uses_item_path() {
        let parts = RealmParts::parse("https://example.com:8443/", Scheme::Html);
        assert_eq!(parts.origin(Some("/login")), "https://example.com:8443/login");
        assert_eq!(parts.origin(None), "https://example.com:8443/");
    }
}
