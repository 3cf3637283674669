//! Shake-intensity map module.

use std::str::FromStr;

use quakeline_types::{Product, ProductSummary};

use crate::{DefaultModule, ExtractionError, IndexerModule, SupportLevel};

/// Spatial precision bonus: the map's bounding box covers the epicenter.
pub const EPICENTER_IN_MAP_BONUS: i64 = 50;

/// The nested file that distinguishes a real shakemap from look-alike
/// products of the same type.
const GRID_CONTENT_PATH: &str = "download/grid.xml";

const MAX_LATITUDE: &str = "maximum-latitude";
const MIN_LATITUDE: &str = "minimum-latitude";
const MAX_LONGITUDE: &str = "maximum-longitude";
const MIN_LONGITUDE: &str = "minimum-longitude";

/// Module for `shakemap` products.
///
/// Requires the map bounding box to be present and adds a spatial bonus to
/// maps whose coverage includes the epicenter, so a map centered on the
/// event outranks a neighboring map that merely overlaps it.
#[derive(Debug, Clone, Default)]
pub struct ShakeMapModule {
    generic: DefaultModule,
}

impl ShakeMapModule {
    pub fn new(generic: DefaultModule) -> Self {
        Self { generic }
    }
}

impl IndexerModule for ShakeMapModule {
    fn support_level(&self, product: &Product) -> SupportLevel {
        let has_grid = product
            .content_paths
            .iter()
            .any(|path| path == GRID_CONTENT_PATH);
        if product.id.product_type == "shakemap" && has_grid {
            SupportLevel::Supported
        } else {
            SupportLevel::Unsupported
        }
    }

    fn summarize(&self, product: &Product) -> Result<ProductSummary, ExtractionError> {
        let summary = self.generic.extract(product)?;
        for required in [MAX_LATITUDE, MIN_LATITUDE, MAX_LONGITUDE, MIN_LONGITUDE] {
            if summary.property(required).is_none() {
                return Err(ExtractionError::MissingProperty(required));
            }
        }
        Ok(self.generic.finish(self, product, summary))
    }

    fn preferred_weight(&self, summary: &ProductSummary) -> i64 {
        let mut weight = self.generic.preferred_weight(summary);
        if map_contains_epicenter(summary) {
            weight += EPICENTER_IN_MAP_BONUS;
        }
        weight
    }
}

fn map_contains_epicenter(summary: &ProductSummary) -> bool {
    let (Some(lat), Some(lon)) = (summary.latitude, summary.longitude) else {
        return false;
    };
    let bound = |name: &str| {
        summary
            .property(name)
            .and_then(|raw| f64::from_str(raw.trim()).ok())
    };
    let (Some(max_lat), Some(min_lat), Some(max_lon), Some(min_lon)) = (
        bound(MAX_LATITUDE),
        bound(MIN_LATITUDE),
        bound(MAX_LONGITUDE),
        bound(MIN_LONGITUDE),
    ) else {
        return false;
    };
    lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakeline_types::{ProductId, ProductStatus};

    fn shakemap_product(source: &str, code: &str) -> Product {
        let mut p = Product::new(
            ProductId::new(source, "shakemap", code, 1_000),
            ProductStatus::Update,
        );
        p.content_paths.push(GRID_CONTENT_PATH.to_string());
        p.properties.insert("maximum-latitude".into(), "35".into());
        p.properties.insert("minimum-latitude".into(), "33".into());
        p.properties
            .insert("maximum-longitude".into(), "-117".into());
        p.properties
            .insert("minimum-longitude".into(), "-119".into());
        p
    }

    #[test]
    fn recognizes_only_shakemaps_with_grid() {
        let module = ShakeMapModule::default();
        let supported = shakemap_product("us", "us2024abcd");
        assert_eq!(module.support_level(&supported), SupportLevel::Supported);

        let mut no_grid = supported.clone();
        no_grid.content_paths.clear();
        assert_eq!(module.support_level(&no_grid), SupportLevel::Unsupported);

        let mut wrong_type = supported;
        wrong_type.id.product_type = "losspager".into();
        assert_eq!(module.support_level(&wrong_type), SupportLevel::Unsupported);
    }

    #[test]
    fn aggregator_map_with_bounds_weighs_201() {
        // 100 base + 100 aggregator + 1 network ownership; the epicenter
        // lies outside the map, so no spatial bonus applies.
        let mut p = shakemap_product("atlas", "atlas19690811212737");
        p.properties.insert("latitude".into(), "39".into());
        p.properties.insert("longitude".into(), "-105".into());

        let module = ShakeMapModule::default();
        let summary = module.summarize(&p).unwrap();
        assert_eq!(summary.preferred_weight, 201);
        assert_eq!(module.preferred_weight(&summary), summary.preferred_weight);
    }

    #[test]
    fn map_covering_epicenter_earns_spatial_bonus() {
        let mut p = shakemap_product("atlas", "atlas19690811212737");
        p.properties.insert("latitude".into(), "34".into());
        p.properties.insert("longitude".into(), "-118".into());

        let summary = ShakeMapModule::default().summarize(&p).unwrap();
        assert_eq!(summary.preferred_weight, 251);
    }

    #[test]
    fn missing_bounds_fail_extraction() {
        let mut p = shakemap_product("us", "us2024abcd");
        p.properties.remove("minimum-longitude");
        let err = ShakeMapModule::default().summarize(&p).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MissingProperty("minimum-longitude")
        ));
    }
}
