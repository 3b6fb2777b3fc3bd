use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Keyed lookup of pre-built services, consulted once while wiring the app.
pub trait Registry {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>>;
}

#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    pub fn insert_arc<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.entries.insert(key.into(), value);
    }
}

impl Registry for ServiceRegistry {
    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(key).cloned()
    }
}
