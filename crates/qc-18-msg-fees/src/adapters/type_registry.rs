use crate::domain::msgs::{module_msg_type_urls, msg_name};
use crate::ports::{InterfaceRegistry, TypeDescriptor};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory registry of declared message types.
#[derive(Default)]
pub struct InMemoryInterfaceRegistry {
    types: RwLock<BTreeMap<String, TypeDescriptor>>,
}

impl InMemoryInterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a message type.
    pub fn register(&self, type_url: &str) {
        let descriptor = TypeDescriptor {
            type_url: type_url.to_string(),
            full_name: msg_name(type_url).to_string(),
        };
        self.types.write().insert(type_url.to_string(), descriptor);
    }

    /// Declares every message owned by the msg fees module.
    pub fn register_module_msgs(&self) {
        for type_url in module_msg_type_urls() {
            self.register(type_url);
        }
    }

    pub fn type_urls(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }
}

impl InterfaceRegistry for InMemoryInterfaceRegistry {
    fn resolve(&self, type_url: &str) -> Option<TypeDescriptor> {
        self.types.read().get(type_url).cloned()
    }
}
