//! Table of live object records, keyed by handle value.

use std::sync::OnceLock;

use dashmap::DashMap;

use crate::object::ObjectKind;

static LIVE: OnceLock<DashMap<u64, ObjectKind>> = OnceLock::new();

fn live() -> &'static DashMap<u64, ObjectKind> {
    LIVE.get_or_init(DashMap::new)
}

pub fn register(handle: u64, kind: ObjectKind) {
    let previous = live().insert(handle, kind);
    debug_assert!(previous.is_none(), "handle {handle:#x} registered twice");
}

pub fn unregister(handle: u64) -> Option<ObjectKind> {
    live().remove(&handle).map(|(_, kind)| kind)
}

pub fn kind_of(handle: u64) -> Option<ObjectKind> {
    live().get(&handle).map(|kind| *kind)
}

pub fn is_live(handle: u64) -> bool {
    live().contains_key(&handle)
}

/// Live records of one kind, across every device.
pub fn live_count(kind: ObjectKind) -> usize {
    live().iter().filter(|entry| *entry.value() == kind).count()
}
