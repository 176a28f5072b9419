use crate::favorites::Identity;
use async_trait::async_trait;
use std::collections::HashMap;

/// Who is behind a request, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Identified(Identity),
}

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::Identified(identity) => Some(identity),
        }
    }
}

/// Turns a presented credential into a [`Caller`].
///
/// Missing and unrecognised credentials both resolve to `Anonymous`; the
/// credential format is the implementation's business.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: Option<&str>) -> Caller;
}

/// Fixed bearer token table, from `[auth.tokens]`.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: &HashMap<String, String>) -> Self {
        Self {
            tokens: tokens
                .iter()
                .filter(|(token, identity)| !token.is_empty() && !identity.is_empty())
                .map(|(token, identity)| (token.clone(), Identity::from(identity.as_str())))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, credential: Option<&str>) -> Caller {
        credential
            .and_then(|token| self.tokens.get(token))
            .map(|identity| Caller::Identified(identity.clone()))
            .unwrap_or(Caller::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> StaticTokenAuthenticator {
        let mut tokens = HashMap::new();
        tokens.insert("t-alice".to_string(), "alice".to_string());
        tokens.insert("".to_string(), "nobody".to_string());
        StaticTokenAuthenticator::new(&tokens)
    }

    #[tokio::test]
    async fn test_known_token_resolves_identity() {
        let caller = authenticator().authenticate(Some("t-alice")).await;
        assert_eq!(caller, Caller::Identified(Identity::from("alice")));
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token_is_anonymous() {
        let auth = authenticator();
        assert_eq!(auth.authenticate(None).await, Caller::Anonymous);
        assert_eq!(auth.authenticate(Some("t-mallory")).await, Caller::Anonymous);
        // Empty tokens are never registered.
        assert_eq!(auth.authenticate(Some("")).await, Caller::Anonymous);
        assert_eq!(auth.len(), 1);
    }
}
