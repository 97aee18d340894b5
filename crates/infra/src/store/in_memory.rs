use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use registry_core::FieldMap;

use super::{HashStore, StoreError, StoreResult};

/// In-memory hash store for tests/dev.
///
/// Keys iterate in lexical order, so enumeration is deterministic here even
/// though callers must not rely on that.
#[derive(Debug, Default)]
pub struct InMemoryHashStore {
    inner: RwLock<BTreeMap<String, FieldMap>>,
}

impl InMemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Command("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl HashStore for InMemoryHashStore {
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let hash = map.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn get_all(&self, key: &str) -> StoreResult<FieldMap> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Redis-style glob matching limited to `*` (any run) and `?` (any one char).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    // Last `*` seen and the text position it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if let Some((star, absorbed)) = backtrack {
            pi = star + 1;
            ti = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}
