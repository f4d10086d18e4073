//! Model routing: prefix table from model id to provider and family
//!
//! Routing is a pure function of the model id. Results are memoized per
//! exact id; entries are idempotent, so concurrent computation with
//! last-write-wins is fine.

use dashmap::DashMap;

use crate::error::GatewayError;

/// Upstream provider owning a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Bedrock,
}

/// Model family selecting the request-shaping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    OpenAiChat,
    Anthropic,
    Titan,
}

/// Resolved routing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub provider: Provider,
    pub family: Family,
    /// Model id with any regional token stripped; sent to the provider
    pub provider_model_id: String,
}

/// Registered prefix table; longest match wins
const PREFIX_TABLE: &[(&str, Family)] = &[
    ("gpt-", Family::OpenAiChat),
    ("text-", Family::OpenAiChat),
    ("dall-e-", Family::OpenAiChat),
    ("anthropic.", Family::Anthropic),
    ("amazon.titan-", Family::Titan),
];

/// Bedrock families the router recognizes but has no strategy for yet
const UNREGISTERED_BEDROCK_PREFIXES: &[&str] = &["ai21.", "cohere.", "meta.", "mistral."];

/// Prefix router with a process-lifetime memo cache
#[derive(Debug, Default)]
pub struct ModelRouter {
    cache: DashMap<String, Route>,
}

impl ModelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a model id to its provider and strategy family
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedModel` when no registered prefix matches
    pub fn route(&self, model_id: &str) -> Result<Route, GatewayError> {
        if let Some(route) = self.cache.get(model_id) {
            return Ok(route.clone());
        }

        let route = resolve(model_id)?;
        self.cache.insert(model_id.to_owned(), route.clone());
        Ok(route)
    }

    /// Representative routable model ids for discovery listings
    pub fn known_models() -> &'static [&'static str] {
        &[
            "gpt-4o",
            "gpt-4o-mini",
            "gpt-3.5-turbo",
            "anthropic.claude-3-haiku-20240307-v1:0",
            "anthropic.claude-3-5-sonnet-20240620-v1:0",
            "amazon.titan-text-express-v1",
            "amazon.titan-text-lite-v1",
        ]
    }
}

/// Pure prefix resolution without the cache
fn resolve(model_id: &str) -> Result<Route, GatewayError> {
    let normalized = strip_region(model_id);

    let mut best: Option<(&str, Family)> = None;
    for (prefix, family) in PREFIX_TABLE {
        if normalized.starts_with(prefix)
            && best.is_none_or(|(b, _)| prefix.len() > b.len())
        {
            best = Some((prefix, *family));
        }
    }

    if let Some((_, family)) = best {
        let provider = match family {
            Family::OpenAiChat => Provider::OpenAi,
            Family::Anthropic | Family::Titan => Provider::Bedrock,
        };
        return Ok(Route {
            provider,
            family,
            provider_model_id: normalized.to_owned(),
        });
    }

    if let Some(prefix) = UNREGISTERED_BEDROCK_PREFIXES
        .iter()
        .find(|p| normalized.starts_with(**p))
    {
        let family = prefix.trim_end_matches('.');
        return Err(GatewayError::UnsupportedModel {
            model: format!("{model_id} (no strategy registered for the {family} family)"),
        });
    }

    Err(GatewayError::UnsupportedModel {
        model: model_id.to_owned(),
    })
}

/// Strip a leading regional token (`us.`, `eu.`, `apac.`, `ap-…-n.`) when it
/// precedes a recognized family prefix
fn strip_region(model_id: &str) -> &str {
    let Some((first, rest)) = model_id.split_once('.') else {
        return model_id;
    };

    let is_region = matches!(first, "us" | "eu" | "apac") || first.starts_with("ap-");
    if !is_region {
        return model_id;
    }

    let known_family = PREFIX_TABLE
        .iter()
        .map(|(p, _)| *p)
        .chain(UNREGISTERED_BEDROCK_PREFIXES.iter().copied())
        .any(|p| rest.starts_with(p));

    if known_family { rest } else { model_id }
}
