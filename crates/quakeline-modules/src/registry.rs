//! Priority-ordered module resolution.

use quakeline_types::{Product, ProductSummary};

use crate::{
    DefaultModule, DyfiModule, ExtractionError, IndexerModule, ShakeMapModule, SupportLevel,
    TrumpModule,
};

/// The set of registered type modules, consulted in priority order.
///
/// The first module reporting [`SupportLevel::Supported`] summarizes the
/// product; when none do, the generic fallback indexes it at the
/// unspecialized level.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn IndexerModule>>,
    fallback: DefaultModule,
}

impl ModuleRegistry {
    /// An empty registry: everything goes through the generic fallback.
    pub fn new(fallback: DefaultModule) -> Self {
        Self {
            modules: Vec::new(),
            fallback,
        }
    }

    /// The standard module set for the given aggregator network.
    pub fn with_defaults(aggregator_source: &str) -> Self {
        let generic = DefaultModule::new(aggregator_source);
        let mut registry = Self::new(generic.clone());
        registry.register(Box::new(ShakeMapModule::new(generic.clone())));
        registry.register(Box::new(DyfiModule::new(generic.clone())));
        registry.register(Box::new(TrumpModule::new(generic)));
        registry
    }

    /// Appends a module at the lowest priority.
    pub fn register(&mut self, module: Box<dyn IndexerModule>) {
        self.modules.push(module);
    }

    /// The module that will handle this product.
    pub fn resolve(&self, product: &Product) -> &dyn IndexerModule {
        self.modules
            .iter()
            .find(|m| m.support_level(product) == SupportLevel::Supported)
            .map(|m| m.as_ref())
            .unwrap_or(&self.fallback)
    }

    /// Extracts a summary using the highest-priority supporting module.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when the resolved module rejects the
    /// product.
    pub fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        self.resolve(product).summarize(product)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_defaults(crate::DEFAULT_AGGREGATOR_SOURCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TRUMP_PREFERRED_WEIGHT;
    use quakeline_types::{EventKey, ProductId, ProductStatus};

    #[test]
    fn unclaimed_types_fall_back_to_generic_extraction() {
        let registry = ModuleRegistry::default();
        let p = Product::new(
            ProductId::new("us", "touch", "iscgem805430", 1_000),
            ProductStatus::Update,
        );
        let summary = registry.summarize(&p).unwrap();
        assert_eq!(summary.preferred_weight, 100);
    }

    #[test]
    fn first_supporting_module_wins() {
        let registry = ModuleRegistry::default();
        let mut trump = Product::new(
            ProductId::new("admin", "trump-origin", "iscgem805430", 1_000),
            ProductStatus::Update,
        );
        trump.links.push(EventKey::new("us", "iscgem805430"));
        let summary = registry.summarize(&trump).unwrap();
        assert_eq!(summary.preferred_weight, TRUMP_PREFERRED_WEIGHT);
    }

    #[test]
    fn shakemap_without_grid_is_indexed_generically() {
        let registry = ModuleRegistry::default();
        // Type says shakemap but the distinguishing grid file is absent, so
        // the shakemap module declines and generic extraction applies: no
        // bounding-box requirement.
        let p = Product::new(
            ProductId::new("us", "shakemap", "us2024abcd", 1_000),
            ProductStatus::Update,
        );
        let summary = registry.summarize(&p).unwrap();
        assert_eq!(summary.preferred_weight, 101);
    }
}
