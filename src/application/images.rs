//! Image URL normalization.

use tracing::warn;
use url::Url;

use crate::config::{ApiSettings, ImageSettings};
use crate::domain::provider::Provider;

/// Turns the image references a CMS hands back into URLs a client can load.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    base_url: Url,
    placeholder: String,
    optimization: Vec<(&'static str, String)>,
    preferred_format: Option<String>,
}

impl ImagePolicy {
    pub fn new(base_url: Url, placeholder: impl Into<String>) -> Self {
        Self {
            base_url: as_directory(base_url),
            placeholder: placeholder.into(),
            optimization: Vec::new(),
            preferred_format: None,
        }
    }

    pub fn from_settings(api: &ApiSettings, images: &ImageSettings) -> Self {
        let mut policy = Self::new(api.base_url.clone(), images.placeholder.clone());
        if images.optimize {
            policy.optimization = optimization_params(api.provider, images);
        }
        policy.preferred_format = images.preferred_format.clone();
        policy
    }

    /// Query parameters appended to absolute URLs.
    pub fn with_optimization(mut self, params: Vec<(&'static str, String)>) -> Self {
        self.optimization = params;
        self
    }

    pub fn with_preferred_format(mut self, format: impl Into<String>) -> Self {
        self.preferred_format = Some(format.into());
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn preferred_format(&self) -> Option<&str> {
        self.preferred_format.as_deref()
    }

    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.placeholder.clone();
        }
        if raw == self.placeholder || raw.starts_with("data:") {
            return raw.to_string();
        }

        let absolute = if raw.starts_with("//") {
            Url::parse(&format!("https:{raw}")).ok()
        } else {
            Url::parse(raw).ok()
        };

        match absolute {
            Some(url) if matches!(url.scheme(), "http" | "https") => self.optimize(url, raw),
            Some(_) => raw.to_string(),
            // `base_url` is a directory; paths always land beneath it
            None => match self.base_url.join(raw.trim_start_matches('/')) {
                Ok(joined) => joined.into(),
                Err(err) => {
                    warn!(image = raw, error = %err, "could not resolve relative image path");
                    raw.to_string()
                }
            },
        }
    }

    fn optimize(&self, mut url: Url, raw: &str) -> String {
        let missing: Vec<&(&'static str, String)> = self
            .optimization
            .iter()
            .filter(|(name, _)| !url.query_pairs().any(|(existing, _)| existing == *name))
            .collect();

        if missing.is_empty() && !raw.starts_with("//") {
            return raw.to_string();
        }

        if !missing.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in missing {
                pairs.append_pair(name, value);
            }
        }
        url.into()
    }
}

/// Provider image-pipeline parameters.
fn optimization_params(provider: Provider, images: &ImageSettings) -> Vec<(&'static str, String)> {
    match provider {
        Provider::Sanity => vec![
            ("auto", "format".to_string()),
            ("fit", "max".to_string()),
            ("w", images.width.to_string()),
            ("q", images.quality.to_string()),
        ],
        // Strapi serves pre-sized renditions instead; see `preferred_format`
        Provider::Strapi => Vec::new(),
    }
}

fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "images/placeholder.jpg";

    fn policy(base: &str) -> ImagePolicy {
        ImagePolicy::new(Url::parse(base).expect("base url"), PLACEHOLDER)
    }

    #[test]
    fn relative_paths_join_the_base_url() {
        let policy = policy("http://cms.local:1337");
        assert_eq!(
            policy.normalize("/uploads/hero.jpg"),
            "http://cms.local:1337/uploads/hero.jpg"
        );
        assert_eq!(
            policy.normalize("uploads/hero.jpg"),
            "http://cms.local:1337/uploads/hero.jpg"
        );
    }

    #[test]
    fn base_path_is_treated_as_directory() {
        let policy = policy("https://example.com/cms");
        assert_eq!(
            policy.normalize("uploads/a.png"),
            "https://example.com/cms/uploads/a.png"
        );
    }

    #[test]
    fn rooted_paths_keep_the_base_path() {
        let policy = policy("https://example.com/cms");
        assert_eq!(
            policy.normalize("/uploads/a.jpg"),
            "https://example.com/cms/uploads/a.jpg"
        );
        assert_eq!(
            policy.normalize("//cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn absolute_urls_pass_through_without_optimization() {
        let policy = policy("http://cms.local");
        let raw = "https://res.cloudinary.com/demo/image/upload/v1/a.jpg";
        assert_eq!(policy.normalize(raw), raw);
    }

    #[test]
    fn absolute_urls_gain_missing_optimization_params() {
        let policy = policy("http://cms.local").with_optimization(vec![
            ("auto", "format".to_string()),
            ("w", "1920".to_string()),
        ]);

        assert_eq!(
            policy.normalize("https://cdn.sanity.io/images/p/production/a.jpg"),
            "https://cdn.sanity.io/images/p/production/a.jpg?auto=format&w=1920"
        );
        assert_eq!(
            policy.normalize("https://cdn.sanity.io/a.jpg?w=640"),
            "https://cdn.sanity.io/a.jpg?w=640&auto=format"
        );
    }

    #[test]
    fn protocol_relative_urls_become_https() {
        let policy = policy("http://cms.local");
        assert_eq!(
            policy.normalize("//cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn placeholder_blank_and_data_urls_are_untouched() {
        let policy = policy("http://cms.local").with_optimization(vec![("q", "80".to_string())]);
        assert_eq!(policy.normalize(PLACEHOLDER), PLACEHOLDER);
        assert_eq!(policy.normalize("   "), PLACEHOLDER);
        assert_eq!(
            policy.normalize("data:image/png;base64,AAAA"),
            "data:image/png;base64,AAAA"
        );
    }
}
