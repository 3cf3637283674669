//! Replays the indexing history of the 1969-08-11 Kuril Islands event as
//! contributed by the ISC-GEM catalog: three overlapping origin series, an
//! aggregator shakemap bridging two of them, operator trumps, and a
//! withdrawal that re-routes the event id through a third series.

use quakeline_db::{create_pool, run_migrations, DbRuntimeSettings};
use quakeline_indexer::{Indexer, IndexerChangeType, IndexerEvent};
use quakeline_modules::ModuleRegistry;
use quakeline_types::{EventKey, Product, ProductId, ProductStatus};
use tempfile::TempDir;

fn setup() -> (TempDir, Indexer) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("index.db");
    let pool = create_pool(
        db_path.to_str().expect("utf8 path"),
        DbRuntimeSettings::default(),
    )
    .expect("pool");
    {
        let conn = pool.get().expect("connection");
        run_migrations(&conn).expect("migrations");
    }
    (dir, Indexer::new(pool, ModuleRegistry::default()))
}

fn iscgem_origin(code: &str, update_time: i64, magnitude: &str) -> Product {
    let mut p = Product::new(
        ProductId::new("us", "origin", code, update_time),
        ProductStatus::Update,
    );
    p.properties.insert("latitude".into(), "43.48".into());
    p.properties.insert("longitude".into(), "147.82".into());
    p.properties.insert("depth".into(), "46".into());
    p.properties.insert("magnitude".into(), magnitude.into());
    p.properties
        .insert("eventtime".into(), "1969-08-11T21:27:37.000Z".into());
    p
}

fn atlas_shakemap(update_time: i64) -> Product {
    let mut p = Product::new(
        ProductId::new("atlas", "shakemap", "atlas19690811212737", update_time),
        ProductStatus::Update,
    );
    p.content_paths.push("download/grid.xml".into());
    p.properties.insert("latitude".into(), "43.48".into());
    p.properties.insert("longitude".into(), "147.82".into());
    p.properties.insert("maximum-latitude".into(), "48.5".into());
    p.properties.insert("minimum-latitude".into(), "38.5".into());
    p.properties.insert("maximum-longitude".into(), "153".into());
    p.properties.insert("minimum-longitude".into(), "142".into());
    p.links.push(EventKey::new("us", "iscgem805430"));
    p.links.push(EventKey::new("us", "iscgemsup805431"));
    p
}

fn types(result: &IndexerEvent) -> Vec<IndexerChangeType> {
    result.changes.iter().map(|c| c.change_type).collect()
}

fn event_id(result: &IndexerEvent, change: usize) -> String {
    result.changes[change]
        .new_event
        .as_ref()
        .expect("new event")
        .event_id()
        .expect("event id")
}

fn original_id(result: &IndexerEvent, change: usize) -> String {
    result.changes[change]
        .original_event
        .as_ref()
        .expect("original event")
        .event_id()
        .expect("event id")
}

#[test]
fn iscgem_contribution_history_resolves_revision_by_revision() {
    let (_dir, indexer) = setup();

    // Three origin series arrive as three independent events.
    let r = indexer
        .on_product(&iscgem_origin("iscgem805430", 1_423_777_364_185, "8.2"))
        .expect("product 0");
    assert_eq!(types(&r), vec![IndexerChangeType::EventAdded]);
    assert_eq!(event_id(&r, 0), "iscgem805430");

    let r = indexer
        .on_product(&iscgem_origin("iscgemsup805431", 1_436_806_944_000, "8.0"))
        .expect("product 1");
    assert_eq!(types(&r), vec![IndexerChangeType::EventAdded]);
    assert_eq!(event_id(&r, 0), "iscgemsup805431");

    let r = indexer
        .on_product(&iscgem_origin("iscgemsup805429", 1_436_806_944_000, "7.8"))
        .expect("product 2");
    assert_eq!(types(&r), vec![IndexerChangeType::EventAdded]);
    assert_eq!(event_id(&r, 0), "iscgemsup805429");

    // A backfilled older revision joins its own series without changing
    // anything visible.
    let r = indexer
        .on_product(&iscgem_origin("iscgem805430", 1_422_122_876_000, "8.2"))
        .expect("product 3");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);
    assert_eq!(event_id(&r, 0), "iscgem805430");

    // The aggregator map names two of the origin series and merges their
    // events; the more recent origin revision now carries the event id.
    let r = indexer.on_product(&atlas_shakemap(1_549_314_055_000)).expect("product 4");
    assert_eq!(
        types(&r),
        vec![IndexerChangeType::EventMerged, IndexerChangeType::EventUpdated]
    );
    assert_eq!(original_id(&r, 0), "iscgemsup805431");
    assert_eq!(original_id(&r, 1), "iscgem805430");
    assert_eq!(event_id(&r, 1), "iscgemsup805431");
    // 100 base + 100 aggregator + 1 ownership + 50 epicenter-in-map.
    assert_eq!(r.summary.as_ref().expect("summary").preferred_weight, 251);

    let r = indexer.on_product(&atlas_shakemap(1_549_314_056_000)).expect("product 5");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);

    // An operator pins the aggregator map over later contributions.
    let mut trump_shakemap = Product::new(
        ProductId::new(
            "atlas",
            "trump-shakemap",
            "atlas19690811212737",
            1_549_314_057_000,
        ),
        ProductStatus::Update,
    );
    trump_shakemap
        .links
        .push(EventKey::new("atlas", "atlas19690811212737"));
    let r = indexer.on_product(&trump_shakemap).expect("product 6");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);
    assert_eq!(event_id(&r, 0), "iscgemsup805431");

    let r = indexer.on_product(&atlas_shakemap(1_549_314_058_000)).expect("product 7");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);

    // The id-carrying origin is withdrawn, and the withdrawal names the
    // third series: its event merges in and takes over the id. The
    // tombstone's own link keeps the graph connected, so nothing splits.
    let mut withdrawal = iscgem_origin("iscgemsup805431", 1_536_770_083_065, "8.0");
    withdrawal.status = ProductStatus::Delete;
    withdrawal.links.push(EventKey::new("us", "iscgemsup805429"));
    let r = indexer.on_product(&withdrawal).expect("product 8");
    assert_eq!(
        types(&r),
        vec![IndexerChangeType::EventMerged, IndexerChangeType::EventUpdated]
    );
    assert_eq!(original_id(&r, 0), "iscgemsup805429");
    assert_eq!(original_id(&r, 1), "iscgemsup805431");
    assert_eq!(event_id(&r, 1), "iscgemsup805429");

    // An operator trump-origin overrides the derived preference and pins
    // the id back to the original series; the graph stays whole.
    let mut trump_origin = Product::new(
        ProductId::new("admin", "trump-origin", "iscgem805430", 1_549_400_000_000),
        ProductStatus::Update,
    );
    trump_origin.links.push(EventKey::new("us", "iscgem805430"));
    let r = indexer.on_product(&trump_origin).expect("product 9");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);
    assert_eq!(original_id(&r, 0), "iscgemsup805429");
    assert_eq!(event_id(&r, 0), "iscgem805430");

    // Later plain updates leave the pinned id alone.
    let r = indexer
        .on_product(&iscgem_origin("iscgem805430", 1_431_543_183_000, "8.2"))
        .expect("product 10");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);
    assert_eq!(event_id(&r, 0), "iscgem805430");

    let touch = Product::new(
        ProductId::new("us", "touch", "iscgem805430", 1_549_500_000_000),
        ProductStatus::Update,
    );
    let r = indexer.on_product(&touch).expect("product 11");
    assert_eq!(types(&r), vec![IndexerChangeType::EventUpdated]);

    // Final state: one event holding the entire contribution history.
    let event = r.changes[0].new_event.as_ref().expect("final event");
    assert_eq!(event.event_id().as_deref(), Some("iscgem805430"));
    assert_eq!(event.summaries.len(), 12);
    assert_eq!(event.latest_summaries().len(), 7);
    // The withdrawn origin series is history, everything else is live.
    assert_eq!(event.live_summaries().len(), 6);
    assert!(!event.is_deleted());
}
