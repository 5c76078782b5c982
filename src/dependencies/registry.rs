//! Weak map from class hash back to the component class.
//!
//! The aggregator only sees class hashes in the rendered HTML and needs the class to
//! find its media. The registry never keeps a class alive on its own: entries hold
//! [`Weak`] references, so once every `Arc<ComponentClass>` is dropped the entry
//! silently stops resolving and is evicted on the next lookup.

use dashmap::DashMap;
use std::sync::{Arc, Weak};

use crate::component::ComponentClass;
use crate::core::ComponentError;

/// Registry of component classes by their opaque hash.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: DashMap<String, Weak<ComponentClass>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate the class's hash with the class.
    pub fn register(&self, class: &Arc<ComponentClass>) {
        self.classes.insert(class.class_hash().to_string(), Arc::downgrade(class));
    }

    /// Look up a live class by hash.
    ///
    /// A dead entry (class dropped) is removed and reported as missing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tera_components::component::ComponentClass;
    /// use tera_components::dependencies::ClassRegistry;
    ///
    /// let registry = ClassRegistry::new();
    /// let card = ComponentClass::builder("Card", "app.Card").template("x").build();
    /// let hash = card.class_hash().to_string();
    /// registry.register(&card);
    /// assert!(registry.get(&hash).is_some());
    ///
    /// drop(card);
    /// assert!(registry.get(&hash).is_none());
    /// assert!(registry.is_empty());
    /// ```
    pub fn get(&self, class_hash: &str) -> Option<Arc<ComponentClass>> {
        let upgraded = self.classes.get(class_hash).map(|entry| entry.value().upgrade());
        match upgraded {
            Some(Some(class)) => Some(class),
            Some(None) => {
                self.classes.remove_if(class_hash, |_, weak| weak.strong_count() == 0);
                tracing::debug!("Evicted collected component class {}", class_hash);
                None
            }
            None => None,
        }
    }

    /// Resolve a hash, failing if the class is unknown or was collected.
    ///
    /// # Errors
    ///
    /// [`ComponentError::UnknownComponentHash`] when [`ClassRegistry::get`] finds nothing.
    pub fn resolve(&self, class_hash: &str) -> Result<Arc<ComponentClass>, ComponentError> {
        self.get(class_hash).ok_or_else(|| ComponentError::UnknownComponentHash {
            hash: class_hash.to_string(),
        })
    }

    /// Drop all entries whose class was collected. Returns how many were removed.
    pub fn purge_dead(&self) -> usize {
        let before = self.classes.len();
        self.classes.retain(|_, weak| weak.strong_count() > 0);
        before - self.classes.len()
    }

    /// Number of entries, including not-yet-evicted dead ones.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
