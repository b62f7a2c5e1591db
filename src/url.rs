//! Splitting of `http(s)://host[:port][/path]` service URLs.

/// A URL split into scheme (with the `://`), bare domain, port and path.
/// The port defaults per scheme when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUrl {
    pub scheme: String,
    pub domain: String,
    pub port: u16,
    pub path: String,
}

impl SplitUrl {
    pub fn is_https(&self) -> bool {
        self.scheme == "https://"
    }
}

/// Split a URL. Scheme matching is exact and case-sensitive; anything
/// other than `http://` or `https://` is rejected.
pub fn split_url(url: &str) -> Result<SplitUrl, String> {
    let (scheme, rest, default_port) = if let Some(rest) = url.strip_prefix("https://") {
        ("https://", rest, 443)
    } else if let Some(rest) = url.strip_prefix("http://") {
        ("http://", rest, 80)
    } else {
        return Err(format!("unrecognized scheme in URL \"{}\"", url));
    };

    if let Some(colon) = rest.find(':') {
        let domain = &rest[..colon];
        let after = &rest[colon + 1..];

        if !after.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Err(format!("invalid port in URL \"{}\"", rest));
        }

        let path_start = after.find('/').unwrap_or(after.len());
        let port: u16 = after[..path_start]
            .parse()
            .map_err(|_| format!("invalid port in URL \"{}\"", rest))?;

        Ok(SplitUrl {
            scheme: scheme.to_string(),
            domain: domain.to_string(),
            port,
            path: after[path_start..].to_string(),
        })
    } else if let Some(slash) = rest.find('/') {
        Ok(SplitUrl {
            scheme: scheme.to_string(),
            domain: rest[..slash].to_string(),
            port: default_port,
            path: rest[slash..].to_string(),
        })
    } else {
        Ok(SplitUrl {
            scheme: scheme.to_string(),
            domain: rest.to_string(),
            port: default_port,
            path: String::new(),
        })
    }
}
