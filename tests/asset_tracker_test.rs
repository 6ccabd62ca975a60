use firefly_grove::resources::asset::{AssetStatus, AssetTracker};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Tree,
    Rock,
}

#[test]
fn should_start_pending() {
    let mut tracker = AssetTracker::new();
    tracker.register(Key::Tree);
    assert_eq!(tracker.status(Key::Tree), Some(&AssetStatus::Pending));
    assert_eq!(tracker.pending(), vec![Key::Tree]);
    assert!(!tracker.all_settled());
}

#[test]
fn should_settle_exactly_once() {
    let mut tracker = AssetTracker::new();
    tracker.register(Key::Tree);

    assert!(tracker.resolve::<(), &str>(Key::Tree, &Ok(())));
    assert!(tracker.is_loaded(Key::Tree));

    assert!(!tracker.resolve::<(), &str>(Key::Tree, &Err("late failure")));
    assert_eq!(tracker.status(Key::Tree), Some(&AssetStatus::Loaded));
}

#[test]
fn should_keep_the_failure_message() {
    let mut tracker = AssetTracker::new();
    tracker.register(Key::Rock);
    assert!(tracker.resolve::<(), String>(Key::Rock, &Err("no such file".to_string())));
    assert_eq!(
        tracker.status(Key::Rock),
        Some(&AssetStatus::Failed("no such file".to_string()))
    );
    assert!(!tracker.is_loaded(Key::Rock));
    assert!(tracker.all_settled());
}

#[test]
fn should_ignore_unknown_keys() {
    let mut tracker: AssetTracker<Key> = AssetTracker::new();
    assert!(!tracker.resolve::<(), &str>(Key::Rock, &Ok(())));
    assert_eq!(tracker.status(Key::Rock), None);
}

#[test]
fn should_not_reset_settled_assets_on_register() {
    let mut tracker = AssetTracker::new();
    tracker.register(Key::Tree);
    tracker.resolve::<(), &str>(Key::Tree, &Ok(()));
    tracker.register(Key::Tree);
    assert!(tracker.is_loaded(Key::Tree));
}

#[test]
fn should_report_settled_only_when_nothing_is_pending() {
    let mut tracker = AssetTracker::new();
    tracker.register(Key::Tree);
    tracker.register(Key::Rock);
    tracker.resolve::<(), &str>(Key::Tree, &Ok(()));
    assert_eq!(tracker.pending(), vec![Key::Rock]);
    assert!(!tracker.all_settled());
    tracker.resolve::<(), &str>(Key::Rock, &Err("timeout"));
    assert!(tracker.all_settled());
}
