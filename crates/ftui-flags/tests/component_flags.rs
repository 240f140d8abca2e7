//! A component that owns a flag store and re-derives a status line from it.

use std::cell::RefCell;
use std::rc::Rc;

use ftui_flags::{FlagSet, FlagStore, FlagStoreConfig, FlagUpdates, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Ui {
    Loading,
    Error,
    ShowHelp,
}

fn status_line(flags: &FlagSet<Ui>) -> String {
    let mut parts = Vec::new();
    if flags.get(&Ui::Loading) == Some(true) {
        parts.push("loading");
    }
    if flags.get(&Ui::Error) == Some(true) {
        parts.push("error");
    }
    if flags.get(&Ui::ShowHelp) == Some(true) {
        parts.push("help");
    }
    if parts.is_empty() {
        "idle".to_string()
    } else {
        parts.join("+")
    }
}

struct StatusView {
    store: FlagStore<Ui>,
    rendered: Rc<RefCell<Vec<String>>>,
    _sub: Subscription,
}

impl StatusView {
    fn new(config: FlagStoreConfig) -> Self {
        let store = FlagStore::with_config(
            [(Ui::Loading, false), (Ui::Error, false), (Ui::ShowHelp, false)],
            config,
        );
        let rendered = Rc::new(RefCell::new(vec![status_line(&store.snapshot())]));
        let sink = Rc::clone(&rendered);
        let sub = store.subscribe(move |flags| sink.borrow_mut().push(status_line(flags)));
        Self {
            store,
            rendered,
            _sub: sub,
        }
    }

    fn frames(&self) -> Vec<String> {
        self.rendered.borrow().clone()
    }
}

#[test]
fn request_lifecycle_with_reset() {
    let view = StatusView::new(FlagStoreConfig::default());
    let help = view.store.set_flag(Ui::ShowHelp).unwrap();

    view.store.set_flags([(Ui::Loading, true)]).unwrap();
    help.toggle();
    // Failure replaces loading with error and clears help.
    view.store.set_flags([(Ui::Error, true)]).unwrap();
    view.store.set_flags(FlagUpdates::new()).unwrap();

    assert_eq!(
        view.frames(),
        vec!["idle", "loading", "loading+help", "error", "idle"]
    );
}

#[test]
fn request_lifecycle_with_merge() {
    let view = StatusView::new(FlagStoreConfig::merging());
    let help = view.store.set_flag(Ui::ShowHelp).unwrap();

    view.store.set_flags([(Ui::Loading, true)]).unwrap();
    help.set(true);
    view.store
        .set_flags([(Ui::Loading, false), (Ui::Error, true)])
        .unwrap();

    assert_eq!(
        view.frames(),
        vec!["idle", "loading", "loading+help", "error+help"]
    );
}

#[test]
fn batched_frame() {
    let view = StatusView::new(FlagStoreConfig::merging());

    view.store.batch(|store| {
        store.set_flags([(Ui::Loading, true)]).unwrap();
        store.set_flag(Ui::ShowHelp).unwrap().set(true);
    });

    assert_eq!(view.frames(), vec!["idle", "loading+help"]);
}

#[test]
fn dropping_view_releases_listener() {
    let view = StatusView::new(FlagStoreConfig::default());
    let store = view.store.clone();
    let frames = Rc::clone(&view.rendered);
    drop(view);

    store.set_flags([(Ui::Error, true)]).unwrap();
    assert_eq!(*frames.borrow(), vec!["idle"]);
    assert_eq!(store.subscriber_count(), 0);
}

#[cfg(feature = "serde")]
#[test]
fn snapshot_restore_through_json() {
    let store = FlagStore::new([("compact".to_string(), false), ("wrap".to_string(), true)]);
    store.set_flags([("compact".to_string(), true)]).unwrap();
    let saved = serde_json::to_string(&store.snapshot()).unwrap();

    let fresh = FlagStore::new([("compact".to_string(), false), ("wrap".to_string(), true)]);
    let restored: FlagUpdates<String> = serde_json::from_str(&saved).unwrap();
    fresh.set_flags(restored).unwrap();
    assert_eq!(fresh.snapshot(), store.snapshot());
}
