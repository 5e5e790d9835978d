//! Content API providers the site has been backed by.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// REST API answering `{ "data": [...] }`.
    Strapi,
    /// Query API answering `{ "result": [...] }`.
    Sanity,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Strapi => "strapi",
            Provider::Sanity => "sanity",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strapi" => Ok(Provider::Strapi),
            "sanity" => Ok(Provider::Sanity),
            other => Err(format!("unknown provider `{other}` (expected strapi or sanity)")),
        }
    }
}
