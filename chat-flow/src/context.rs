use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Shared per-session state, passed to every step of a flow.
///
/// Values are stored as JSON so steps can exchange arbitrary serde types
/// without the framework knowing about them. Cloning is cheap: all clones
/// point at the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a serializable value under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl serde::Serialize) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.data.insert(key.into(), value);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize context value, dropping it");
            }
        }
    }

    /// Fetch and deserialize the value under `key`, if present and well-typed.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let ctx = Context::new();
        ctx.set("count", 3u32);
        ctx.set("genres", vec!["SF".to_string(), "드라마".to_string()]);

        assert_eq!(ctx.get::<u32>("count"), Some(3));
        let genres: Vec<String> = ctx.get("genres").unwrap();
        assert_eq!(genres, vec!["SF", "드라마"]);
        assert_eq!(ctx.get::<u32>("missing"), None);
    }

    #[test]
    fn clones_share_state() {
        let ctx = Context::new();
        let other = ctx.clone();
        other.set("k", "v");
        assert_eq!(ctx.get::<String>("k").as_deref(), Some("v"));

        ctx.remove("k");
        assert!(other.get::<String>("k").is_none());
    }
}
