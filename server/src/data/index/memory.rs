//! In-memory index backend using DashMap

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{IndexBackend, check_key};
use super::error::IndexError;

/// In-memory index backend
///
/// Contents are lost on close; used with `index_backend = "memory"` and in tests.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: DashMap<String, Vec<u8>>,
    closed: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), IndexError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl IndexBackend for InMemoryIndex {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.ensure_open()?;
        check_key(key)?;
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, IndexError> {
        self.ensure_open()?;
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn close(&self) -> Result<(), IndexError> {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let index = InMemoryIndex::new();
        index.set("a", vec![1, 2]).await.unwrap();
        assert_eq!(index.get("a").await.unwrap(), Some(vec![1, 2]));

        index.set("a", vec![3]).await.unwrap();
        assert_eq!(index.get("a").await.unwrap(), Some(vec![3]));

        index.delete("a").await.unwrap();
        assert_eq!(index.get("a").await.unwrap(), None);
        index.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let index = InMemoryIndex::new();
        index.set("b", vec![]).await.unwrap();
        index.set("a", vec![]).await.unwrap();
        assert_eq!(index.keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_key() {
        let index = InMemoryIndex::new();
        assert!(matches!(
            index.set("", vec![]).await,
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_closed() {
        let index = InMemoryIndex::new();
        index.close().await.unwrap();
        assert!(matches!(index.get("a").await, Err(IndexError::Closed)));
    }
}
