//! Deployhook-compatible payload built from a release event

use serde::Serialize;
use serde_json::Number;

use crate::webhook::InboundEvent;
use crate::{HookProfile, RelayConfig};

/// Fields only emitted by the extended profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedFields {
    pub app_uuid: Option<String>,
    /// Never carried by release webhooks
    pub prev_head: String,
    pub release: Option<Number>,
}

/// Body of the outbound hook, shaped like the legacy deploy hook.
///
/// Every key is always present; missing source data shows up as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyPayload {
    pub app: Option<String>,
    pub user: Option<String>,
    /// Never carried by release webhooks
    pub url: String,
    pub head: Option<String>,
    pub head_long: Option<String>,
    pub git_log: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedFields>,
}

impl LegacyPayload {
    /// All keys in emission order, with their textual value.
    pub fn fields(&self) -> Vec<(&'static str, Option<String>)> {
        let mut fields = vec![
            ("app", self.app.clone()),
            ("user", self.user.clone()),
            ("url", Some(self.url.clone())),
            ("head", self.head.clone()),
            ("head_long", self.head_long.clone()),
            ("git_log", self.git_log.clone()),
        ];
        if let Some(ext) = &self.extended {
            fields.push(("app_uuid", ext.app_uuid.clone()));
            fields.push(("prev_head", Some(ext.prev_head.clone())));
            fields.push(("release", ext.release.as_ref().map(Number::to_string)));
        }
        fields
    }

    /// Value of a single key: `None` if the key does not exist,
    /// `Some(None)` if it exists but carries no data.
    pub fn field(&self, key: &str) -> Option<Option<String>> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Pairs for a `application/x-www-form-urlencoded` body; nulls become "".
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        self.fields()
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or_default()))
            .collect()
    }
}

/// Maps release events onto [`LegacyPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadTransformer {
    profile: HookProfile,
    head_length: usize,
}

impl PayloadTransformer {
    pub fn new(profile: HookProfile, head_length: usize) -> Self {
        Self {
            profile,
            head_length,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.profile, config.head_length)
    }

    pub fn transform(&self, event: &InboundEvent) -> LegacyPayload {
        let commit = event.commit();

        let extended = match self.profile {
            HookProfile::Basic => None,
            HookProfile::Extended => Some(ExtendedFields {
                app_uuid: event.app_id().map(String::from),
                prev_head: String::new(),
                release: event.version(),
            }),
        };

        LegacyPayload {
            app: event.app_name().map(String::from),
            user: event.actor_email().map(String::from),
            url: String::new(),
            head: commit.map(|c| short_head(c, self.head_length)),
            head_long: commit.map(String::from),
            git_log: event.commit_description().map(|d| d.trim().to_string()),
            extended,
        }
    }
}

/// First `len` characters of a commit hash, or all of it if shorter.
fn short_head(commit: &str, len: usize) -> String {
    commit.chars().take(len).collect()
}
