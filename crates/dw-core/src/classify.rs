//! Domain classification against configurable membership lists.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::category::Category;

/// Sentinel domain for URLs that cannot be parsed into a hostname.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Membership lists driving [`ClassifierConfig::classify`].
///
/// Matching is substring containment: a domain belongs to a list if any list
/// entry occurs anywhere in the domain string. The productive list is checked
/// first, so a domain matching both lists classifies as productive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub productive: Vec<String>,
    pub unproductive: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            productive: [
                "github.com",
                "stackoverflow.com",
                "leetcode.com",
                "codepen.io",
                "developer.mozilla.org",
                "w3schools.com",
                "freecodecamp.org",
                "coursera.org",
                "udemy.com",
                "edx.org",
                "khanacademy.org",
            ]
            .map(String::from)
            .to_vec(),
            unproductive: [
                "facebook.com",
                "instagram.com",
                "youtube.com",
                "twitter.com",
                "tiktok.com",
                "reddit.com",
                "netflix.com",
                "twitch.tv",
                "snapchat.com",
                "pinterest.com",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl ClassifierConfig {
    /// Classifies a normalized domain.
    ///
    /// Pure and total: every input string maps to exactly one category and
    /// repeated calls always agree.
    #[must_use]
    pub fn classify(&self, domain: &str) -> Category {
        if self.productive.iter().any(|site| domain.contains(site)) {
            return Category::Productive;
        }
        if self.unproductive.iter().any(|site| domain.contains(site)) {
            return Category::Unproductive;
        }
        Category::Neutral
    }
}

/// Extracts a normalized domain from a URL.
///
/// The hostname is lowercased and a single leading `www.` is stripped.
/// Inputs that do not parse to a URL with a host normalize to
/// [`UNKNOWN_DOMAIN`].
#[must_use]
pub fn normalize_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNKNOWN_DOMAIN.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return UNKNOWN_DOMAIN.to_string();
    };
    let host = host.to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}
