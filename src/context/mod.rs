//! # GitHub Run Context
//!
//! The workflow passes the `github` context object to the builder as JSON
//! (`GITHUB_CONTEXT`). That object carries the job's `token`, which must not
//! reach anything derived from it.
//!
//! Parsing goes through a private raw record that owns the token and wipes it
//! on drop. The public [`RunContext`] has no token field at all, so the secret
//! cannot be forwarded by mistake.
//!
//! See <https://docs.github.com/en/actions/learn-github-actions/contexts#github-context>.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::mem;
use zeroize::ZeroizeOnDrop;

/// Facts about the CI run, scrubbed of secrets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    pub repository: String,
    pub action_path: String,
    pub workflow: String,
    pub event_name: String,
    pub event: Value,
    pub sha: String,
    pub ref_type: String,
    pub git_ref: String,
    pub base_ref: String,
    pub head_ref: String,
    pub actor: String,
    pub run_number: String,
    pub run_id: String,
    pub run_attempt: String,
    pub server_url: String,
}

#[derive(Deserialize, ZeroizeOnDrop)]
struct RawRunContext {
    #[zeroize(skip)]
    #[serde(default)]
    repository: String,
    #[zeroize(skip)]
    #[serde(default)]
    action_path: String,
    #[zeroize(skip)]
    #[serde(default)]
    workflow: String,
    #[zeroize(skip)]
    #[serde(default)]
    event_name: String,
    #[zeroize(skip)]
    #[serde(default)]
    event: Value,
    #[zeroize(skip)]
    #[serde(default)]
    sha: String,
    #[zeroize(skip)]
    #[serde(default)]
    ref_type: String,
    #[zeroize(skip)]
    #[serde(default, rename = "ref")]
    git_ref: String,
    #[zeroize(skip)]
    #[serde(default)]
    base_ref: String,
    #[zeroize(skip)]
    #[serde(default)]
    head_ref: String,
    #[zeroize(skip)]
    #[serde(default)]
    actor: String,
    #[zeroize(skip)]
    #[serde(default)]
    run_number: String,
    #[zeroize(skip)]
    #[serde(default)]
    run_id: String,
    #[zeroize(skip)]
    #[serde(default)]
    run_attempt: String,
    #[zeroize(skip)]
    #[serde(default)]
    server_url: String,
    #[serde(default)]
    token: String,
}

impl RawRunContext {
    // Consumes the raw record; the token is wiped when `self` drops at the end.
    fn scrub(mut self) -> RunContext {
        RunContext {
            repository: mem::take(&mut self.repository),
            action_path: mem::take(&mut self.action_path),
            workflow: mem::take(&mut self.workflow),
            event_name: mem::take(&mut self.event_name),
            event: mem::take(&mut self.event),
            sha: mem::take(&mut self.sha),
            ref_type: mem::take(&mut self.ref_type),
            git_ref: mem::take(&mut self.git_ref),
            base_ref: mem::take(&mut self.base_ref),
            head_ref: mem::take(&mut self.head_ref),
            actor: mem::take(&mut self.actor),
            run_number: mem::take(&mut self.run_number),
            run_id: mem::take(&mut self.run_id),
            run_attempt: mem::take(&mut self.run_attempt),
            server_url: mem::take(&mut self.server_url),
        }
    }
}

impl RunContext {
    /// Parse the JSON `github` context.
    pub fn parse(json: &str) -> Result<Self> {
        let raw: RawRunContext = serde_json::from_str(json)?;
        Ok(raw.scrub())
    }

    /// `git+<server>/<repository>` without any ref.
    pub fn repository_uri(&self) -> String {
        format!(
            "git+{}/{}",
            self.server_url.trim_end_matches('/'),
            self.repository
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = r#"{
        "repository": "octo-org/octo-repo",
        "workflow": "release",
        "event_name": "push",
        "event": {"head_commit": {"id": "abc"}},
        "sha": "0123456789abcdef0123456789abcdef01234567",
        "ref_type": "tag",
        "ref": "refs/tags/v1.0.0",
        "base_ref": "",
        "head_ref": "",
        "actor": "octocat",
        "run_number": "7",
        "run_id": "1234567890",
        "run_attempt": "1",
        "server_url": "https://github.com",
        "token": "ghs_SUPERSECRETTOKENVALUE"
    }"#;

    #[test]
    fn test_parse_context() {
        let ctx = RunContext::parse(CONTEXT).unwrap();
        assert_eq!(ctx.repository, "octo-org/octo-repo");
        assert_eq!(ctx.git_ref, "refs/tags/v1.0.0");
        assert_eq!(ctx.run_id, "1234567890");
        assert_eq!(ctx.event["head_commit"]["id"], "abc");
        assert_eq!(ctx.repository_uri(), "git+https://github.com/octo-org/octo-repo");
    }

    #[test]
    fn test_token_never_leaves_parse() {
        let ctx = RunContext::parse(CONTEXT).unwrap();

        let debug = format!("{ctx:?}");
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(!debug.contains("SUPERSECRET"));
        assert!(!json.contains("SUPERSECRET"));
        assert!(!json.contains("token"));
    }

    #[test]
    fn test_missing_fields_default() {
        let ctx = RunContext::parse(r#"{"repository": "a/b"}"#).unwrap();
        assert_eq!(ctx.repository, "a/b");
        assert!(ctx.sha.is_empty());
        assert!(ctx.event.is_null());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RunContext::parse("{not json"),
            Err(crate::error::Error::Json(_))
        ));
    }
}
