//! Logical resource keys.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A logical content query. Doubles as the cache identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ResourceKey {
    /// Items shown on the landing swiper.
    Main,
    /// Every project, ordered by category.
    Projects,
    /// Any other document collection, by name.
    Collection(String),
}

impl ResourceKey {
    pub fn name(&self) -> &str {
        match self {
            ResourceKey::Main => "main",
            ResourceKey::Projects => "projects",
            ResourceKey::Collection(name) => name,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.name().to_string()
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed {
            "" => Err("resource name must not be empty".to_string()),
            "main" => Ok(ResourceKey::Main),
            "projects" => Ok(ResourceKey::Projects),
            other => Ok(ResourceKey::Collection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_custom_names() {
        assert_eq!("main".parse::<ResourceKey>(), Ok(ResourceKey::Main));
        assert_eq!(" projects ".parse::<ResourceKey>(), Ok(ResourceKey::Projects));
        assert_eq!(
            "about".parse::<ResourceKey>(),
            Ok(ResourceKey::Collection("about".to_string()))
        );
        assert!("  ".parse::<ResourceKey>().is_err());
    }

    #[test]
    fn display_round_trips_name() {
        assert_eq!(ResourceKey::Collection("frames".into()).to_string(), "frames");
        assert_eq!(ResourceKey::Main.to_string(), "main");
    }
}
