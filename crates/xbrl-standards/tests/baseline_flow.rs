use std::sync::Arc;
use std::time::Duration;

use xbrl_model::RebuildPhase;
use xbrl_standards::{
    BaselineCache, BaselineKey, BaselineRebuilder, BaselineStore, TaxonomyAssertionSource,
    taxonomy_hash,
};

const ASSERTIONS: &str = r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase">
  <va:valueAssertion xmlns:va="http://xbrl.org/2008/assertion/value" id="eba_v0001_m"/>
  <va:valueAssertion xmlns:va="http://xbrl.org/2008/assertion/value" id="eba_v0002_m"/>
  <ca:consistencyAssertion xmlns:ca="http://xbrl.org/2008/assertion/consistency" id="c0003"/>
</link:linkbase>"#;

#[test]
fn taxonomy_scan_builds_fresh_baseline() {
    let taxonomy = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(taxonomy.path().join("val")).unwrap();
    std::fs::write(taxonomy.path().join("val/vr-corep.xml"), ASSERTIONS).unwrap();
    let baselines = tempfile::tempdir().unwrap();

    let cache = Arc::new(BaselineCache::new());
    let store = BaselineStore::new(baselines.path());
    let rebuilder = BaselineRebuilder::spawn(
        Arc::new(TaxonomyAssertionSource::new(taxonomy.path())),
        store.clone(),
        Arc::clone(&cache),
    )
    .expect("spawn rebuilder");

    let key = BaselineKey::new("corep_of", "3.4").unwrap();
    assert_eq!(rebuilder.schedule(&key), RebuildPhase::Queued);
    let state = rebuilder
        .wait_for(&key, Duration::from_secs(30))
        .expect("slot present");
    assert_eq!(state.phase(), RebuildPhase::Ready);

    let snapshot = cache.get(&key).expect("snapshot cached");
    assert_eq!(snapshot.present_count, 3);
    assert!(snapshot.contains("v0001_m"));

    let current = taxonomy_hash(taxonomy.path()).unwrap();
    assert!(!snapshot.is_stale(&current));

    std::fs::write(taxonomy.path().join("val/vr-extra.xml"), "<x/>").unwrap();
    let changed = taxonomy_hash(taxonomy.path()).unwrap();
    assert!(snapshot.is_stale(&changed));

    let fresh_cache = BaselineCache::new();
    let loaded = fresh_cache.get_or_load(&store, &key).unwrap().unwrap();
    assert_eq!(loaded.hash, snapshot.hash);
}
