//! Specification registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LookupError;
use crate::specification::Specification;

/// Registry of extension specifications, keyed by identifier and alias.
///
/// Every identifier and alias is claimed by at most one specification.
/// There is no removal: build the registry once, then share it behind an
/// `Arc` for concurrent lookups.
#[derive(Debug, Default, Clone)]
pub struct SpecificationRegistry {
    specifications: Vec<Arc<Specification>>,
    /// Identifier or alias → index into `specifications`.
    index: HashMap<String, usize>,
}

impl SpecificationRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from specifications in order.
    ///
    /// Fails on the first identifier collision.
    pub fn from_specifications<I>(specifications: I) -> Result<Self, LookupError>
    where
        I: IntoIterator<Item = Specification>,
    {
        let mut registry = Self::new();
        for specification in specifications {
            registry.register(specification)?;
        }
        Ok(registry)
    }

    /// Registers a specification under its identifier and all aliases.
    ///
    /// Nothing is registered if any of those names is already claimed.
    pub fn register(&mut self, specification: Specification) -> Result<(), LookupError> {
        let mut names = vec![specification.identifier.as_str()];
        names.extend(specification.aliases());

        for name in &names {
            if let Some(&existing) = self.index.get(*name) {
                let existing = self.specifications[existing].identifier.clone();
                tracing::warn!(
                    identifier = %name,
                    existing = %existing,
                    specification = %specification.identifier,
                    "identifier collision while registering specification"
                );
                return Err(LookupError::DuplicateIdentifier {
                    identifier: name.to_string(),
                    existing,
                });
            }
        }

        let position = self.specifications.len();
        for name in &names {
            self.index.insert(name.to_string(), position);
        }
        tracing::debug!(
            identifier = %specification.identifier,
            aliases = names.len() - 1,
            "registered specification"
        );
        self.specifications.push(Arc::new(specification));
        Ok(())
    }

    /// Resolves an identifier or alias.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Specification>, LookupError> {
        self.resolve_or_none(identifier)
            .ok_or_else(|| LookupError::NotFound(identifier.to_string()))
    }

    /// Resolves an identifier or alias, treating an unknown name as absent.
    pub fn resolve_or_none(&self, identifier: &str) -> Option<Arc<Specification>> {
        self.index
            .get(identifier)
            .map(|&position| Arc::clone(&self.specifications[position]))
    }

    /// Returns all specifications in registration order.
    pub fn list(&self) -> &[Arc<Specification>] {
        &self.specifications
    }

    /// Returns the specifications an extension of type `extension_type`
    /// may belong to: those whose identifier, external identifier or
    /// additional identifiers equal it.
    pub fn extensions_for_type(&self, extension_type: &str) -> Vec<Arc<Specification>> {
        self.specifications
            .iter()
            .filter(|spec| spec.claims(extension_type))
            .cloned()
            .collect()
    }

    /// Returns canonical identifiers in registration order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.specifications.iter().map(|spec| spec.identifier.as_str())
    }

    /// Returns the number of registered specifications.
    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    /// Returns true if no specifications are registered.
    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(identifier: &str) -> Specification {
        Specification::builder(identifier).build()
    }

    #[test]
    fn test_resolve_before_register_is_not_found() {
        let registry = SpecificationRegistry::new();
        assert_eq!(
            registry.resolve("function").unwrap_err(),
            LookupError::NotFound("function".to_string())
        );
        assert!(registry.resolve_or_none("function").is_none());
    }

    #[test]
    fn test_duplicate_identifier() {
        let mut registry = SpecificationRegistry::new();
        registry.register(spec("function")).unwrap();
        let err = registry.register(spec("function")).unwrap_err();
        assert_eq!(
            err,
            LookupError::DuplicateIdentifier {
                identifier: "function".to_string(),
                existing: "function".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_collision_registers_nothing() {
        let mut registry = SpecificationRegistry::new();
        registry
            .register(
                Specification::builder("function")
                    .additional_identifier("order_discounts")
                    .build(),
            )
            .unwrap();

        let err = registry
            .register(
                Specification::builder("discounts")
                    .additional_identifier("order_discounts")
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::DuplicateIdentifier { ref existing, .. } if existing == "function"
        ));
        assert!(registry.resolve_or_none("discounts").is_none());
        assert!(registry.resolve_or_none("discounts_external").is_none());
    }

    #[test]
    fn test_resolve_by_alias() {
        let registry = SpecificationRegistry::from_specifications([
            Specification::builder("theme")
                .external_identifier("theme_app_extension")
                .build(),
            spec("webhooks"),
        ])
        .unwrap();

        let by_alias = registry.resolve("theme_app_extension").unwrap();
        let by_id = registry.resolve("theme").unwrap();
        assert!(Arc::ptr_eq(&by_alias, &by_id));
        assert_eq!(
            registry.identifiers().collect::<Vec<_>>(),
            vec!["theme", "webhooks"]
        );
    }

    #[test]
    fn test_extensions_for_type() {
        let registry = SpecificationRegistry::from_specifications([
            spec("app_home"),
            Specification::builder("ui_extension")
                .additional_identifier("checkout_ui_extension")
                .build(),
        ])
        .unwrap();

        let found = registry.extensions_for_type("checkout_ui_extension");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier, "ui_extension");
        assert_eq!(registry.extensions_for_type("app_home_external").len(), 1);
        assert!(registry.extensions_for_type("nope").is_empty());
    }

    #[test]
    fn test_list_in_registration_order() {
        let registry =
            SpecificationRegistry::from_specifications([spec("b"), spec("a"), spec("c")]).unwrap();
        let ids: Vec<_> = registry.list().iter().map(|s| s.identifier.clone()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpecificationRegistry>();
    }
}
