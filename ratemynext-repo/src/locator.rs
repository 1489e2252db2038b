//! Repository reference parsing and key derivation

use ratemynext_core::{RateError, RateResult, RepoKey};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Prefix shared by every stored result key
const KEY_PREFIX: &str = "repo";

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)([^?#]*)")
            .expect("reference pattern is valid")
    })
}

/// A GitHub repository, optionally narrowed to a directory inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoReference {
    /// Lower-cased owner login
    pub owner: String,
    /// Lower-cased repository name without a `.git` suffix
    pub repo: String,
    /// Directory inside the repository, without leading or trailing slashes
    pub sub_path: Option<String>,
}

impl RepoReference {
    /// Parse `github.com/<owner>/<repo>[/tree/<ref>][/<sub_path>]`.
    ///
    /// The scheme is optional and query strings or fragments are ignored. A `tree`
    /// segment is followed by exactly one ref segment, which is skipped: analysis always
    /// runs against the default branch.
    pub fn parse(input: &str) -> RateResult<Self> {
        let invalid = || RateError::InvalidReference {
            input: input.to_string(),
        };

        let captures = reference_pattern().captures(input.trim()).ok_or_else(invalid)?;

        let owner = captures[1].to_lowercase();
        let repo = &captures[2];
        let repo = repo.strip_suffix(".git").unwrap_or(repo).to_lowercase();
        if owner.is_empty() || owner.starts_with('.') || matches!(repo.as_str(), "" | "." | "..") {
            return Err(invalid());
        }

        let mut segments: Vec<&str> = captures
            .get(3)
            .map(|rest| rest.as_str().split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if segments.first() == Some(&"tree") {
            // tree + ref
            let skip = segments.len().min(2);
            segments.drain(..skip);
        }

        // ref segment stays raw; directory segments are percent-decoded
        let mut decoded = Vec::with_capacity(segments.len());
        for segment in segments {
            let segment = urlencoding::decode(segment).map_err(|_| invalid())?;
            decoded.extend(
                segment
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }

        let sub_path = if decoded.is_empty() {
            None
        } else {
            Some(decoded.join("/"))
        };

        Ok(Self {
            owner,
            repo,
            sub_path,
        })
    }

    /// Stable storage key: `repo:<owner>:<repo>[:<encoded sub_path>]`.
    ///
    /// Owner and repo can only contain `[a-z0-9_.-]` after parsing; the sub-path is
    /// percent-encoded so its `/` and `:` never read as separators.
    pub fn key(&self) -> RepoKey {
        let mut key = format!("{}:{}:{}", KEY_PREFIX, self.owner, self.repo);
        if let Some(sub_path) = &self.sub_path {
            key.push(':');
            key.push_str(&urlencoding::encode(sub_path));
        }
        RepoKey::from_raw(key)
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(sub_path) = &self.sub_path {
            write!(f, " ({})", sub_path)?;
        }
        Ok(())
    }
}

/// Key for a raw reference string, `None` when it does not parse
pub fn repo_key(input: &str) -> Option<RepoKey> {
    RepoReference::parse(input).ok().map(|r| r.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratemynext_core::ErrorKind;

    #[test]
    fn test_parse_plain_url() {
        let reference = RepoReference::parse("https://github.com/vercel/commerce").unwrap();
        assert_eq!(reference.owner, "vercel");
        assert_eq!(reference.repo, "commerce");
        assert_eq!(reference.sub_path, None);
    }

    #[test]
    fn test_parse_without_scheme_and_with_git_suffix() {
        let reference = RepoReference::parse("github.com/Vercel/Commerce.git").unwrap();
        assert_eq!(reference.owner, "vercel");
        assert_eq!(reference.repo, "commerce");
    }

    #[test]
    fn test_parse_tree_ref_and_sub_path() {
        let reference =
            RepoReference::parse("https://github.com/vercel/turbo/tree/main/examples/basic/apps/web")
                .unwrap();
        assert_eq!(reference.repo, "turbo");
        assert_eq!(reference.sub_path.as_deref(), Some("examples/basic/apps/web"));
    }

    #[test]
    fn test_parse_tree_without_sub_path() {
        let reference = RepoReference::parse("https://github.com/acme/site/tree/canary/").unwrap();
        assert_eq!(reference.sub_path, None);
    }

    #[test]
    fn test_parse_sub_path_without_tree() {
        let reference = RepoReference::parse("https://github.com/acme/mono/apps/web/").unwrap();
        assert_eq!(reference.sub_path.as_deref(), Some("apps/web"));
    }

    #[test]
    fn test_parse_ignores_query_and_fragment() {
        let reference = RepoReference::parse("https://github.com/acme/site?tab=readme#top").unwrap();
        assert_eq!(reference.repo, "site");
        assert_eq!(reference.sub_path, None);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["not-a-url", "", "https://github.com/acme", "https://gitlab.com/a/b"] {
            let err = RepoReference::parse(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReference, "input: {input}");
        }
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = RepoReference::parse("https://github.com/acme/site").unwrap();
        let b = RepoReference::parse("github.com/ACME/site/").unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str(), "repo:acme:site");
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn test_key_includes_encoded_sub_path() {
        let reference = RepoReference::parse("https://github.com/acme/mono/tree/main/apps/web").unwrap();
        assert_eq!(reference.key().as_str(), "repo:acme:mono:apps%2Fweb");
    }

    #[test]
    fn test_keys_do_not_collide() {
        let inputs = [
            "https://github.com/acme/mono",
            "https://github.com/acme/mono/apps/web",
            "https://github.com/acme/mono/apps:web",
            "https://github.com/acme/mono/apps%3Aweb%2F1",
            "https://github.com/acme/mono/Apps/Web",
            "https://github.com/acme/mono-apps/web",
            "https://github.com/acme-mono/apps",
        ];
        let keys: std::collections::HashSet<_> =
            inputs.iter().map(|i| repo_key(i).unwrap()).collect();
        assert_eq!(keys.len(), inputs.len());
    }

    #[test]
    fn test_sub_path_is_percent_decoded() {
        let reference =
            RepoReference::parse("https://github.com/acme/mono/tree/main/apps%20web").unwrap();
        assert_eq!(reference.sub_path.as_deref(), Some("apps web"));
        assert_eq!(reference.key().as_str(), "repo:acme:mono:apps%20web");

        // an encoded separator names the same directory as a literal one
        assert_eq!(
            repo_key("https://github.com/acme/mono/apps%2Fweb"),
            repo_key("https://github.com/acme/mono/apps/web")
        );

        let err = RepoReference::parse("https://github.com/acme/mono/apps%FF").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_git_suffix_is_stripped_once() {
        let reference = RepoReference::parse("https://github.com/acme/x.git.git").unwrap();
        assert_eq!(reference.repo, "x.git");

        for input in [
            "https://github.com/acme/.",
            "https://github.com/acme/..",
            "https://github.com/acme/.git",
        ] {
            let err = RepoReference::parse(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReference, "input: {input}");
        }
    }

    #[test]
    fn test_repo_key_for_invalid_input() {
        assert!(repo_key("not-a-url").is_none());
    }
}
