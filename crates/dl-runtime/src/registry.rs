use std::collections::HashMap;
use std::sync::Arc;

use dl_core::DialogError;

use crate::definition::DialogDefinition;

#[derive(Debug, Default)]
pub struct DialogRegistry {
    dialogs: HashMap<String, Arc<DialogDefinition>>,
    order: Vec<String>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: impl Into<DialogDefinition>) -> Result<(), DialogError> {
        let definition = definition.into();
        let name = definition.name().to_string();
        if name.trim().is_empty() {
            return Err(DialogError::invalid_definition(
                "Dialog name must not be empty.",
            ));
        }
        if self.dialogs.contains_key(&name) {
            return Err(DialogError::duplicate_name(&name));
        }
        if let DialogDefinition::Component(component) = &definition {
            component.validate()?;
        }

        self.order.push(name.clone());
        self.dialogs.insert(name, Arc::new(definition));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Arc<DialogDefinition>, DialogError> {
        self.dialogs
            .get(name)
            .ok_or_else(|| DialogError::unknown_dialog(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dialogs.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // Walks component names from the root registry down to the registry
    // that owns dialogs at `scope`.
    pub(crate) fn scoped(&self, scope: &[String]) -> Result<&DialogRegistry, DialogError> {
        let mut current = self;
        for component_name in scope {
            let definition = current.dialogs.get(component_name).ok_or_else(|| {
                DialogError::corrupt_state(format!(
                    "Scope \"{}\" does not name a registered component.",
                    scope.join("/")
                ))
            })?;
            let DialogDefinition::Component(component) = definition.as_ref() else {
                return Err(DialogError::corrupt_state(format!(
                    "Scope segment \"{}\" is a {} dialog, not a component.",
                    component_name,
                    definition.kind_name()
                )));
            };
            current = component.dialogs();
        }
        Ok(current)
    }

    pub(crate) fn resolve_exact(
        &self,
        scope: &[String],
        name: &str,
    ) -> Result<Arc<DialogDefinition>, DialogError> {
        self.scoped(scope)?.resolve(name).cloned()
    }

    // Innermost scope first, then outward to the root registry.
    pub(crate) fn resolve_from(
        &self,
        scope: &[String],
        name: &str,
    ) -> Result<(Vec<String>, Arc<DialogDefinition>), DialogError> {
        for depth in (0..=scope.len()).rev() {
            let owner = &scope[..depth];
            if let Some(definition) = self.scoped(owner)?.dialogs.get(name) {
                return Ok((owner.to_vec(), Arc::clone(definition)));
            }
        }
        Err(DialogError::unknown_dialog(name))
    }
}
