use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::content::store::{ContentError, ContentStore, DirectoryStore, check_key};
use crate::http::mime;

/// A payload ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub body: Vec<u8>,
    pub content_type: String,
}

impl Resource {
    pub fn new(body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Resource),
    NotFound,
}

/// Maps request targets to resources.
///
/// Fixed replies are checked first, then the content store if one is set.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    fixed: HashMap<String, Resource>,
    store: Option<Arc<dyn ContentStore>>,
}

/// The store key for a target: the target minus one leading '/'.
pub fn store_key(target: &str) -> &str {
    target.strip_prefix('/').unwrap_or(target)
}

impl Resolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            fixed: HashMap::new(),
            store: Some(store),
        }
    }

    /// A resolver that only knows its fixed replies.
    pub fn without_store() -> Self {
        Self::default()
    }

    /// Answers `target` with `body` regardless of what the store holds.
    pub fn with_fixed(
        mut self,
        target: &str,
        body: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        self.fixed
            .insert(store_key(target).to_string(), Resource::new(body, content_type));
        self
    }

    /// Builds the resolver described by `cfg`: its fixed routes, plus a
    /// directory store when a content root is configured.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let mut resolver = match &cfg.content_root {
            Some(root) => {
                let store = DirectoryStore::open(root)
                    .with_context(|| format!("failed to open content root {root}"))?;
                tracing::info!("Serving files from {}", store.root().display());
                Resolver::new(Arc::new(store))
            }
            None => Resolver::without_store(),
        };

        for route in &cfg.routes {
            resolver = resolver.with_fixed(&route.path, route.body.as_bytes(), &route.content_type);
        }

        Ok(resolver)
    }

    /// Looks `target` up. May block on filesystem I/O.
    pub fn resolve(&self, target: &str) -> Result<Resolution, ContentError> {
        let key = store_key(target);

        if let Some(resource) = self.fixed.get(key) {
            return Ok(Resolution::Found(resource.clone()));
        }

        let Some(store) = &self.store else {
            return Ok(Resolution::NotFound);
        };

        check_key(key)?;

        // Read directly: `exists` collapses an escaping symlink into "absent".
        match store.read(key) {
            Ok(body) => Ok(Resolution::Found(Resource::new(body, mime::content_type_for(key)))),
            Err(ContentError::NotFound(_)) => Ok(Resolution::NotFound),
            Err(e) => Err(e),
        }
    }

    /// [`Resolver::resolve`] on the blocking thread pool.
    pub async fn resolve_blocking(
        resolver: Arc<Resolver>,
        target: String,
    ) -> Result<Resolution, ContentError> {
        let key = target.clone();
        tokio::task::spawn_blocking(move || resolver.resolve(&target))
            .await
            .map_err(|join| ContentError::Io {
                key,
                source: std::io::Error::other(join),
            })?
    }
}
