use geodex::{
    CoveringConfig, GeoConfig, GeoIndex, GeoIndexBuilder, GeoPoint, MemoryStore, PointKey,
    PutPointRequest, QueryOutcome, UpdatePointRequest,
};
use std::sync::Arc;

fn build(store: Arc<MemoryStore>, config: GeoConfig) -> GeoIndex {
    GeoIndexBuilder::new(store).config(config).build().unwrap()
}

fn range_keys(outcome: &QueryOutcome) -> Vec<String> {
    let mut keys: Vec<String> = outcome
        .items
        .iter()
        .filter_map(|item| item.get("rangeKey").and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();
    keys.sort();
    keys
}

fn seed_cities(index: &GeoIndex) {
    let cities = [
        ("seattle", 47.6062, -122.3321),
        ("tacoma", 47.2529, -122.4443),
        ("portland", 45.5152, -122.6784),
        ("vancouver", 49.2827, -123.1207),
        ("spokane", 47.6588, -117.4260),
        ("boise", 43.6150, -116.2023),
    ];
    for (name, lat, lng) in cities {
        index
            .put_point(PutPointRequest::new(GeoPoint::new(lat, lng), name).with_attribute("city", name))
            .unwrap();
    }
}

#[test]
fn test_radius_returns_only_points_inside() {
    let center = GeoPoint::new(47.5, -122.3);
    let index = build(Arc::new(MemoryStore::new()), GeoConfig::new("points"));

    index
        .put_point(PutPointRequest::new(center, "center"))
        .unwrap();
    // ~10 km north
    index
        .put_point(PutPointRequest::new(GeoPoint::new(47.59, -122.3), "far"))
        .unwrap();

    let outcome = index.query_radius(center, 100.0).unwrap();
    assert_eq!(range_keys(&outcome), vec!["center"]);
    assert_eq!(outcome.stats.matched, 1);
}

#[test]
fn test_radius_result_independent_of_covering() {
    let center = GeoPoint::new(47.5, -122.3);
    let mut results = Vec::new();

    for max_cells in [1, 4, 16, 64] {
        let store = Arc::new(MemoryStore::new());
        let config = GeoConfig::new("points").with_covering(CoveringConfig {
            max_cells,
            ..CoveringConfig::default()
        });
        let index = build(store, config);
        index
            .put_point(PutPointRequest::new(center, "center"))
            .unwrap();
        index
            .put_point(PutPointRequest::new(GeoPoint::new(47.59, -122.3), "far"))
            .unwrap();

        let outcome = index.query_radius(center, 100.0).unwrap();
        results.push(range_keys(&outcome));
    }

    for keys in &results {
        assert_eq!(keys, &vec!["center".to_string()]);
    }
}

#[test]
fn test_rectangle_query() {
    let index = build(Arc::new(MemoryStore::new()), GeoConfig::new("cities"));
    seed_cities(&index);

    // Puget Sound
    let outcome = index
        .query_rectangle(GeoPoint::new(47.0, -123.0), GeoPoint::new(48.0, -122.0))
        .unwrap();
    assert_eq!(range_keys(&outcome), vec!["seattle", "tacoma"]);

    // Pacific Northwest, excluding Idaho
    let outcome = index
        .query_rectangle(GeoPoint::new(45.0, -124.0), GeoPoint::new(50.0, -117.0))
        .unwrap();
    assert_eq!(
        range_keys(&outcome),
        vec!["portland", "seattle", "spokane", "tacoma", "vancouver"]
    );
    assert!(outcome.stats.candidates >= outcome.stats.matched);
}

#[test]
fn test_large_radius_query() {
    let index = build(Arc::new(MemoryStore::new()), GeoConfig::new("cities"));
    seed_cities(&index);

    let outcome = index
        .query_radius(GeoPoint::new(47.6062, -122.3321), 250_000.0)
        .unwrap();
    assert_eq!(
        range_keys(&outcome),
        vec!["portland", "seattle", "tacoma", "vancouver"]
    );
}

#[test]
fn test_pagination_collects_every_page() {
    let store = Arc::new(MemoryStore::new().with_page_size(1));
    let index = build(store.clone(), GeoConfig::new("grid"));

    let mut expected = Vec::new();
    for i in 0..10u32 {
        for j in 0..10u32 {
            let key = format!("p{:02}{:02}", i, j);
            let point = GeoPoint::new(10.0 + f64::from(i) * 0.01, 20.0 + f64::from(j) * 0.01);
            index.put_point(PutPointRequest::new(point, key.clone())).unwrap();
            expected.push(key);
        }
    }
    expected.sort();

    let outcome = index
        .query_rectangle(GeoPoint::new(9.99, 19.99), GeoPoint::new(10.1, 20.1))
        .unwrap();
    assert_eq!(range_keys(&outcome), expected);
    assert!(outcome.stats.pages_scanned >= 100);
    assert_eq!(
        store.stats("grid").scan_requests as usize,
        outcome.stats.pages_scanned
    );
}

#[test]
fn test_results_identical_across_pool_sizes() {
    let store = Arc::new(MemoryStore::new().with_page_size(3));
    let loader = build(store.clone(), GeoConfig::new("points"));
    for i in 0..200u32 {
        let lat = 40.0 + f64::from(i % 20) * 0.05;
        let lng = -74.0 + f64::from(i / 20) * 0.05;
        loader
            .put_point(PutPointRequest::new(GeoPoint::new(lat, lng), format!("pt{}", i)))
            .unwrap();
    }

    let center = GeoPoint::new(40.5, -73.75);
    let mut baseline: Option<Vec<String>> = None;
    for threads in [1, 2, 4, 8] {
        let index = build(
            store.clone(),
            GeoConfig::new("points").with_worker_threads(threads),
        );
        for _ in 0..3 {
            let keys = range_keys(&index.query_radius(center, 30_000.0).unwrap());
            assert!(!keys.is_empty());
            match &baseline {
                Some(expected) => assert_eq!(&keys, expected),
                None => baseline = Some(keys),
            }
        }
    }
}

#[test]
fn test_point_lifecycle_visible_to_queries() {
    let index = build(Arc::new(MemoryStore::new()), GeoConfig::new("shops"));
    let point = GeoPoint::new(48.8566, 2.3522);
    let key = PointKey::new(point, "boulangerie");

    index
        .put_point(PutPointRequest::new(point, "boulangerie").with_attribute("open", false))
        .unwrap();
    index
        .update_point(UpdatePointRequest::new(point, "boulangerie").put("open", true))
        .unwrap();

    let outcome = index.query_radius(point, 50.0).unwrap();
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0]["open"], true);

    index.delete_point(&key).unwrap();
    let outcome = index.query_radius(point, 50.0).unwrap();
    assert!(outcome.items.is_empty());
}

#[test]
fn test_batch_write_then_query() {
    let index = build(Arc::new(MemoryStore::new()), GeoConfig::new("batch"));
    let requests = (0..20u32)
        .map(|i| {
            PutPointRequest::new(
                GeoPoint::new(-33.86 + f64::from(i) * 0.001, 151.21),
                format!("b{:02}", i),
            )
        })
        .collect();

    let outcome = index.batch_write_points(requests).unwrap();
    assert!(outcome.is_complete());

    let found = index
        .query_rectangle(GeoPoint::new(-33.87, 151.2), GeoPoint::new(-33.83, 151.22))
        .unwrap();
    assert_eq!(found.items.len(), 20);
}

#[test]
fn test_index_shared_between_threads() {
    let index = Arc::new(build(
        Arc::new(MemoryStore::new()),
        GeoConfig::new("cities").with_worker_threads(2),
    ));
    seed_cities(&index);

    std::thread::scope(|s| {
        for _ in 0..4 {
            let index = Arc::clone(&index);
            s.spawn(move || {
                let outcome = index
                    .query_rectangle(GeoPoint::new(47.0, -123.0), GeoPoint::new(48.0, -122.0))
                    .unwrap();
                assert_eq!(range_keys(&outcome), vec!["seattle", "tacoma"]);
            });
        }
    });
}

#[test]
fn test_renamed_index_attribute_round_trip() {
    let config = GeoConfig::new("renamed").with_index_attribute("cell");
    let index = build(Arc::new(MemoryStore::new()), config);
    let point = GeoPoint::new(35.6762, 139.6503);
    index
        .put_point(PutPointRequest::new(point, "tokyo"))
        .unwrap();

    let outcome = index.query_radius(point, 25.0).unwrap();
    assert_eq!(range_keys(&outcome), vec!["tokyo"]);
    assert!(outcome.items[0]["cell"].is_u64());
    assert!(!outcome.items[0].contains_key("geohash"));
}
