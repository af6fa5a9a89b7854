use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Number of hex characters in a short token
pub const SHORT_TOKEN_LEN: usize = 5;

/// Prefix of session-local IDs for entities that only exist in edited text
pub const PLACEHOLDER_PREFIX: &str = "NEW_ITEM_";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("unknown ID token {{{token}}}")]
    UnresolvedToken { token: String },
    #[error("ID token {token} already maps to {existing}, cannot also map {incoming}")]
    Collision {
        token: String,
        existing: String,
        incoming: String,
    },
}

pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Short display token for a canonical ID: a fixed-width prefix of its
/// SHA-256 digest in lowercase hex
pub fn short_token(canonical: &str) -> String {
    let mut hex = format!("{:x}", Sha256::digest(canonical.as_bytes()));
    hex.truncate(SHORT_TOKEN_LEN);
    hex
}

/// Bidirectional map between canonical remote IDs and short tokens for one
/// editing session. Also mints placeholder IDs for new entities.
#[derive(Debug, Clone, Default)]
pub struct IdMapper {
    to_short: HashMap<String, String>,
    to_canonical: HashMap<String, String>,
    placeholders_minted: usize,
}

impl IdMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapper from every canonical ID known to the session
    pub fn seed<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<Self, IdError> {
        let mut mapper = IdMapper::new();
        for id in ids {
            mapper.insert(id)?;
        }
        Ok(mapper)
    }

    /// Add a canonical ID under its derived token. Re-inserting the same ID
    /// is a no-op.
    pub fn insert(&mut self, canonical: &str) -> Result<String, IdError> {
        let token = short_token(canonical);
        self.register(canonical, &token)?;
        Ok(token)
    }

    /// Map a canonical ID to an explicit token
    pub fn register(&mut self, canonical: &str, token: &str) -> Result<(), IdError> {
        if let Some(existing) = self.to_canonical.get(token) {
            if existing == canonical {
                return Ok(());
            }
            return Err(IdError::Collision {
                token: token.to_string(),
                existing: existing.clone(),
                incoming: canonical.to_string(),
            });
        }
        if let Some(previous) = self.to_short.get(canonical) {
            return Err(IdError::Collision {
                token: previous.clone(),
                existing: canonical.to_string(),
                incoming: canonical.to_string(),
            });
        }
        self.to_short
            .insert(canonical.to_string(), token.to_string());
        self.to_canonical
            .insert(token.to_string(), canonical.to_string());
        Ok(())
    }

    /// Short token for a canonical ID. Placeholders and unseeded IDs have none.
    pub fn mapping(&self, canonical: &str) -> Option<&str> {
        self.to_short.get(canonical).map(String::as_str)
    }

    /// Canonical ID for a token. An empty token mints a fresh placeholder.
    pub fn resolve(&mut self, token: &str) -> Result<String, IdError> {
        if token.is_empty() {
            self.placeholders_minted += 1;
            return Ok(format!("{}{}", PLACEHOLDER_PREFIX, self.placeholders_minted));
        }
        self.to_canonical
            .get(token)
            .cloned()
            .ok_or_else(|| IdError::UnresolvedToken {
                token: token.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.to_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_short.is_empty()
    }
}
