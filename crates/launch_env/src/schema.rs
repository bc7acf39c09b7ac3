//! Static key classification table.
//!
//! Every known configuration key is listed exactly once, together with the
//! layer it lives in and how its value is validated. Merging, override
//! routing and validation all consult this table.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Well-known key names.
pub mod keys {
    pub const PROJECT_NAME: &str = "PROJECT_NAME";
    pub const PROJECT_DOMAIN: &str = "PROJECT_DOMAIN";
    pub const APP_BASE_PATH: &str = "APP_BASE_PATH";
    pub const APP_URL: &str = "APP_URL";
    pub const WORKER_ORIGIN: &str = "WORKER_ORIGIN";
    pub const CLOUDFLARE_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
    pub const CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
    pub const AUTH_DOMAIN: &str = "AUTH_DOMAIN";
    pub const AUTH_AUDIENCE: &str = "AUTH_AUDIENCE";
    pub const AUTH_CLIENT_ID: &str = "AUTH_CLIENT_ID";
    pub const AUTH_CLIENT_SECRET: &str = "AUTH_CLIENT_SECRET";
    pub const STRIPE_SECRET_KEY: &str = "STRIPE_SECRET_KEY";
    pub const STRIPE_TEST_SECRET_KEY: &str = "STRIPE_TEST_SECRET_KEY";
    pub const STRIPE_WEBHOOK_SECRET: &str = "STRIPE_WEBHOOK_SECRET";
    pub const D1_DATABASE_NAME: &str = "D1_DATABASE_NAME";
    pub const D1_DATABASE_ID: &str = "D1_DATABASE_ID";
    pub const R2_BUCKET_NAME: &str = "R2_BUCKET_NAME";
    pub const SESSION_SECRET: &str = "SESSION_SECRET";
}

/// Which layer a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Hand-authored, required values.
    Base,
    /// Tool-produced values discovered during provisioning.
    Generated,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Base => "base",
            LayerKind::Generated => "generated",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a value is checked once it is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Url,
    /// Lowercase slug: `^[a-z0-9][a-z0-9-]*$`
    Slug,
    /// `^[A-Za-z0-9]+$`
    AlphaNum,
    /// `^[A-Za-z0-9-]+$`
    ResourceId,
}

impl ValueKind {
    /// Pattern used for identifier kinds.
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            ValueKind::Slug => Some(r"^[a-z0-9][a-z0-9-]*$"),
            ValueKind::AlphaNum => Some(r"^[A-Za-z0-9]+$"),
            ValueKind::ResourceId => Some(r"^[A-Za-z0-9-]+$"),
            ValueKind::Text | ValueKind::Url => None,
        }
    }

    pub(crate) fn regex(&self) -> Option<&'static Regex> {
        static SLUG: OnceLock<Regex> = OnceLock::new();
        static ALNUM: OnceLock<Regex> = OnceLock::new();
        static RESOURCE: OnceLock<Regex> = OnceLock::new();

        let cell = match self {
            ValueKind::Slug => &SLUG,
            ValueKind::AlphaNum => &ALNUM,
            ValueKind::ResourceId => &RESOURCE,
            ValueKind::Text | ValueKind::Url => return None,
        };
        let pattern = self.pattern()?;
        Some(cell.get_or_init(|| Regex::new(pattern).expect("static identifier pattern")))
    }
}

/// Classification entry for one key.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub name: &'static str,
    pub layer: LayerKind,
    pub kind: ValueKind,
    /// Base keys only; generated keys are optional until provisioned.
    pub required: bool,
    /// Shipped to the deployed Worker as a secret.
    pub worker_secret: bool,
}

const fn base(name: &'static str, kind: ValueKind, required: bool) -> KeySpec {
    KeySpec {
        name,
        layer: LayerKind::Base,
        kind,
        required,
        worker_secret: false,
    }
}

const fn generated(name: &'static str, kind: ValueKind) -> KeySpec {
    KeySpec {
        name,
        layer: LayerKind::Generated,
        kind,
        required: false,
        worker_secret: false,
    }
}

const fn secret(mut spec: KeySpec) -> KeySpec {
    spec.worker_secret = true;
    spec
}

/// The classification table.
pub const KEY_TABLE: &[KeySpec] = &[
    base(keys::PROJECT_NAME, ValueKind::Slug, true),
    base(keys::PROJECT_DOMAIN, ValueKind::Url, true),
    base(keys::APP_BASE_PATH, ValueKind::Text, false),
    base(keys::APP_URL, ValueKind::Url, true),
    base(keys::WORKER_ORIGIN, ValueKind::Url, true),
    base(keys::CLOUDFLARE_ACCOUNT_ID, ValueKind::AlphaNum, true),
    base(keys::CLOUDFLARE_API_TOKEN, ValueKind::Text, false),
    base(keys::AUTH_DOMAIN, ValueKind::Url, true),
    base(keys::AUTH_AUDIENCE, ValueKind::Url, true),
    base(keys::AUTH_CLIENT_ID, ValueKind::Text, true),
    secret(base(keys::AUTH_CLIENT_SECRET, ValueKind::Text, true)),
    secret(base(keys::STRIPE_SECRET_KEY, ValueKind::Text, true)),
    base(keys::STRIPE_TEST_SECRET_KEY, ValueKind::Text, false),
    secret(base(keys::STRIPE_WEBHOOK_SECRET, ValueKind::Text, false)),
    generated(keys::D1_DATABASE_NAME, ValueKind::Slug),
    generated(keys::D1_DATABASE_ID, ValueKind::ResourceId),
    generated(keys::R2_BUCKET_NAME, ValueKind::Slug),
    secret(generated(keys::SESSION_SECRET, ValueKind::Text)),
];

/// Look up the classification of a key.
pub fn lookup(key: &str) -> Option<&'static KeySpec> {
    KEY_TABLE.iter().find(|spec| spec.name == key)
}

/// The layer a key is classified into, if it is known.
pub fn layer_of(key: &str) -> Option<LayerKind> {
    lookup(key).map(|spec| spec.layer)
}

/// Keys of one layer in table order.
pub fn keys_in(layer: LayerKind) -> impl Iterator<Item = &'static KeySpec> {
    KEY_TABLE.iter().filter(move |spec| spec.layer == layer)
}

/// Keys that the deployed Worker receives as secrets.
pub fn worker_secrets() -> impl Iterator<Item = &'static KeySpec> {
    KEY_TABLE.iter().filter(|spec| spec.worker_secret)
}
