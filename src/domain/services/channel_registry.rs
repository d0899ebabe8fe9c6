use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::channel::ChannelKind;
use crate::domain::ports::ChannelProvider;

/// Registered channel providers plus the configured default.
///
/// Choosing a channel is always explicit: callers pass a kind or get the
/// default. There is no automatic failover to a second provider.
pub struct ChannelRegistry {
    providers: HashMap<ChannelKind, Arc<dyn ChannelProvider>>,
    default_kind: ChannelKind,
}

impl ChannelRegistry {
    pub fn new(default_kind: ChannelKind) -> Self {
        Self { providers: HashMap::new(), default_kind }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ChannelProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ChannelProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    pub fn resolve(&self, requested: Option<ChannelKind>) -> (ChannelKind, Option<Arc<dyn ChannelProvider>>) {
        let kind = requested.unwrap_or(self.default_kind);
        (kind, self.providers.get(&kind).cloned())
    }

    pub fn registered(&self) -> Vec<ChannelKind> {
        let mut kinds: Vec<ChannelKind> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}
