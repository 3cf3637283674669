//! Derived display attributes of an event.
//!
//! Contributors report these unevenly: some attributes live on the
//! preferred origin, some on specialized products, and some must be
//! computed. Malformed property values render as absent rather than
//! failing the whole projection.

use quakeline_types::{Event, ProductSummary};

/// Alert level that maps to a significance of 2000.
const ALERT_RED: &str = "red";
const ALERT_ORANGE: &str = "orange";
const ALERT_YELLOW: &str = "yellow";

/// Read-side companion to an [`Event`]: resolves the per-attribute
/// precedence rules across the event's preferred products.
pub struct EventSummary<'a> {
    event: &'a Event,
}

impl<'a> EventSummary<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self { event }
    }

    /// Human-readable location: origin `title`, else the geoserve
    /// product's `location`.
    pub fn title(&self) -> Option<String> {
        self.origin_property("title")
            .or_else(|| {
                self.event
                    .preferred_product("geoserve")
                    .and_then(|p| p.property("location"))
                    .map(str::to_string)
            })
    }

    /// PAGER alert level.
    pub fn alert_level(&self) -> Option<String> {
        self.event
            .preferred_product("losspager")
            .and_then(|p| p.property("alertlevel"))
            .map(str::to_string)
    }

    /// Community-determined maximum intensity. DYFI reports CDI under the
    /// `maxmmi` property name.
    pub fn max_cdi(&self) -> Option<f64> {
        self.event
            .preferred_product("dyfi")
            .and_then(|p| parse_f64(p, "maxmmi"))
    }

    /// Maximum estimated instrumental intensity, shakemap first.
    pub fn max_mmi(&self) -> Option<f64> {
        self.event
            .preferred_product("shakemap")
            .and_then(|p| parse_f64(p, "maxmmi"))
            .or_else(|| {
                self.event
                    .preferred_product("losspager")
                    .and_then(|p| parse_f64(p, "maxmmi"))
            })
    }

    /// Number of felt reports; DYFI has used both `num-responses` and the
    /// legacy `numResp`.
    pub fn num_responses(&self) -> Option<i64> {
        self.event.preferred_product("dyfi").and_then(|p| {
            parse_i64(p, "num-responses").or_else(|| parse_i64(p, "numResp"))
        })
    }

    /// Number of stations used by the preferred origin.
    pub fn num_stations_used(&self) -> Option<i64> {
        self.preferred_origin().and_then(|p| parse_i64(p, "num-stations-used"))
    }

    /// Distance to the closest station, degrees.
    pub fn minimum_distance(&self) -> Option<f64> {
        self.preferred_origin().and_then(|p| parse_f64(p, "minimum-distance"))
    }

    /// Largest azimuthal gap between stations, degrees.
    pub fn azimuthal_gap(&self) -> Option<f64> {
        self.preferred_origin().and_then(|p| parse_f64(p, "azimuthal-gap"))
    }

    /// Origin solution standard error.
    pub fn standard_error(&self) -> Option<f64> {
        self.preferred_origin().and_then(|p| parse_f64(p, "standard-error"))
    }

    /// Magnitude type reported by the preferred magnitude product.
    pub fn magnitude_type(&self) -> Option<String> {
        self.event
            .preferred_magnitude()
            .and_then(|p| p.property("magnitude-type"))
            .map(str::to_string)
    }

    /// Origin event type; `earthquake` unless a contributor says otherwise.
    pub fn event_type(&self) -> String {
        self.origin_property("event-type")
            .unwrap_or_else(|| "earthquake".to_string())
    }

    /// `deleted` for deleted events, else the origin's review status,
    /// defaulting to `automatic`.
    pub fn review_status(&self) -> String {
        if self.event.is_deleted() {
            return "deleted".to_string();
        }
        self.origin_property("review-status")
            .unwrap_or_else(|| "automatic".to_string())
    }

    /// Whether any impact-link product links to tsunami information.
    pub fn tsunami_link(&self) -> bool {
        self.event.products("impact-link").iter().any(|p| {
            p.property("addon-code")
                .map(|code| code.to_uppercase().starts_with("TSUNAMILINK"))
                .unwrap_or(false)
        })
    }

    /// Estimated significance; events with a value >= 650 are considered
    /// significant.
    ///
    /// A dedicated significance product wins; otherwise the value is
    /// derived from magnitude, PAGER alert level, and felt reports.
    pub fn significance(&self) -> i64 {
        if let Some(explicit) = self
            .event
            .preferred_product("significance")
            .and_then(|p| parse_i64(p, "significance"))
        {
            return explicit;
        }

        let magnitude_significance = self
            .event
            .magnitude()
            .map(|mag| (mag * 100.0 * mag.abs() / 6.5).round() as i64)
            .unwrap_or(0);

        let pager_significance = match self.alert_level().as_deref() {
            Some(level) if level.eq_ignore_ascii_case(ALERT_RED) => 2_000,
            Some(level) if level.eq_ignore_ascii_case(ALERT_ORANGE) => 1_000,
            Some(level) if level.eq_ignore_ascii_case(ALERT_YELLOW) => 650,
            _ => 0,
        };

        let dyfi_significance = match (self.num_responses(), self.max_cdi()) {
            (Some(responses), Some(maxcdi)) => {
                ((responses as f64).min(1_000.0) * maxcdi / 10.0).round() as i64
            }
            _ => 0,
        };

        magnitude_significance.max(pager_significance) + dyfi_significance
    }

    fn preferred_origin(&self) -> Option<&ProductSummary> {
        self.event.preferred_product("origin")
    }

    fn origin_property(&self, name: &str) -> Option<String> {
        self.preferred_origin()
            .and_then(|p| p.property(name))
            .map(str::to_string)
    }
}

fn parse_f64(summary: &ProductSummary, name: &str) -> Option<f64> {
    summary.property(name).and_then(|raw| raw.trim().parse().ok())
}

fn parse_i64(summary: &ProductSummary, name: &str) -> Option<i64> {
    summary.property(name).and_then(|raw| raw.trim().parse().ok())
}
