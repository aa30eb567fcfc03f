//! Callback registry.
//!
//! Four disjoint mappings, one per handler variant:
//! - commands by name
//! - components by `(custom_id, component_type)`
//! - modals by `custom_id`
//! - autocompletes by `(command, option)`
//!
//! Registration is fail-fast: a second handler under a taken key is rejected
//! with `DuplicateKeyError` and the first one stays. Lookups clone the handler
//! out so no `DashMap` guard is held across an await.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use sleet_types::error::DuplicateKeyError;
use sleet_types::interaction::ComponentType;

use crate::classify::Route;
use crate::handler::{AutocompleteHandler, CommandHandler, ComponentHandler, Handler, ModalHandler};

/// Thread-safe handler registry.
#[derive(Default)]
pub struct CallbackRegistry {
    commands: DashMap<String, CommandHandler>,
    components: DashMap<(String, ComponentType), ComponentHandler>,
    modals: DashMap<String, ModalHandler>,
    autocompletes: DashMap<(String, String), AutocompleteHandler>,
}

fn insert_unique<K, V>(
    map: &DashMap<K, V>,
    registry: &'static str,
    key: K,
    label: String,
    handler: V,
) -> Result<(), DuplicateKeyError>
where
    K: Eq + std::hash::Hash,
{
    match map.entry(key) {
        Entry::Occupied(_) => Err(DuplicateKeyError {
            registry,
            key: label,
        }),
        Entry::Vacant(slot) => {
            slot.insert(handler);
            tracing::info!(registry, key = %label, "registered handler");
            Ok(())
        }
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(&self, handler: CommandHandler) -> Result<(), DuplicateKeyError> {
        let name = handler.name().to_string();
        insert_unique(&self.commands, "command", name.clone(), name, handler)
    }

    pub fn register_component(&self, handler: ComponentHandler) -> Result<(), DuplicateKeyError> {
        let key = (handler.custom_id().to_string(), handler.component_type());
        let label = format!("{}/{}", key.0, key.1);
        insert_unique(&self.components, "component", key, label, handler)
    }

    pub fn register_modal(&self, handler: ModalHandler) -> Result<(), DuplicateKeyError> {
        let custom_id = handler.custom_id().to_string();
        insert_unique(&self.modals, "modal", custom_id.clone(), custom_id, handler)
    }

    pub fn register_autocomplete(
        &self,
        handler: AutocompleteHandler,
    ) -> Result<(), DuplicateKeyError> {
        let key = (handler.command().to_string(), handler.option().to_string());
        let label = format!("{}.{}", key.0, key.1);
        insert_unique(&self.autocompletes, "autocomplete", key, label, handler)
    }

    /// Register a handler of any variant.
    pub fn register(&self, handler: Handler) -> Result<(), DuplicateKeyError> {
        match handler {
            Handler::Command(h) => self.register_command(h),
            Handler::Component(h) => self.register_component(h),
            Handler::Modal(h) => self.register_modal(h),
            Handler::Autocomplete(h) => self.register_autocomplete(h),
        }
    }

    /// Find the handler for a classified route.
    ///
    /// Pings never resolve (they are answered by the engine), and neither do
    /// autocomplete queries with no focused option.
    pub fn resolve(&self, route: &Route) -> Option<Handler> {
        match route {
            Route::Acknowledge => None,
            Route::Command { name } => self
                .commands
                .get(name)
                .map(|r| Handler::Command(r.value().clone())),
            Route::Autocomplete { command, focused } => {
                let option = focused.as_ref()?;
                self.autocompletes
                    .get(&(command.clone(), option.name.clone()))
                    .map(|r| Handler::Autocomplete(r.value().clone()))
            }
            Route::Component {
                custom_id,
                component_type,
            } => self
                .components
                .get(&(custom_id.clone(), *component_type))
                .map(|r| Handler::Component(r.value().clone())),
            Route::Modal { custom_id } => self
                .modals
                .get(custom_id)
                .map(|r| Handler::Modal(r.value().clone())),
        }
    }

    pub fn remove_command(&self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    pub fn remove_component(&self, custom_id: &str, component_type: ComponentType) -> bool {
        self.components
            .remove(&(custom_id.to_string(), component_type))
            .is_some()
    }

    pub fn remove_modal(&self, custom_id: &str) -> bool {
        self.modals.remove(custom_id).is_some()
    }

    pub fn remove_autocomplete(&self, command: &str, option: &str) -> bool {
        self.autocompletes
            .remove(&(command.to_string(), option.to_string()))
            .is_some()
    }

    /// Total number of registered handlers across all four mappings.
    pub fn len(&self) -> usize {
        self.commands.len() + self.components.len() + self.modals.len() + self.autocompletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}
