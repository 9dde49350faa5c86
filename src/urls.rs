//! URL helpers behind the href extraction rules

use indexmap::IndexMap;
use url::{Host, Url};

use crate::error::{ExtractError, Result};

// Relative hrefs are joined onto this so paths and queries can still be read.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// A parsed href that remembers whether it was absolute
#[derive(Debug, Clone)]
pub struct Href {
    url: Url,
    absolute: bool,
}

impl Href {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = |error: url::ParseError| ExtractError::InvalidHref {
            href: raw.to_string(),
            error,
        };

        match Url::parse(raw) {
            Ok(url) => Ok(Self {
                url,
                absolute: true,
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(RELATIVE_BASE).map_err(invalid)?;
                let url = base.join(raw).map_err(invalid)?;
                Ok(Self {
                    url,
                    absolute: false,
                })
            }
            Err(error) => Err(invalid(error)),
        }
    }

    /// Full host name, `None` for relative hrefs
    pub fn domain(&self) -> Option<String> {
        if !self.absolute {
            return None;
        }
        self.url.host_str().map(str::to_lowercase)
    }

    /// Registrable domain, e.g. `openai.com` for `chat.openai.com`
    pub fn base_domain(&self) -> Option<String> {
        if !self.absolute {
            return None;
        }
        match self.url.host()? {
            Host::Domain(domain) => Some(registrable_domain(&domain.to_lowercase())),
            Host::Ipv4(ip) => Some(ip.to_string()),
            Host::Ipv6(ip) => Some(ip.to_string()),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> &str {
        self.url.query().unwrap_or("")
    }

    pub fn endpoint_with_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Query parameters grouped by key, repeated keys kept in order
    pub fn query_params(&self) -> IndexMap<String, Vec<String>> {
        let mut params: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, value) in self.url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        params
    }
}

// Hosts with no registrable part (`localhost`, a bare suffix) are kept whole.
fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.');
    psl::domain_str(host).unwrap_or(host).to_string()
}
