//! Process-wide layout registry

use super::{Marshal, TypeLayout};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::trace;

lazy_static::lazy_static! {
    static ref LAYOUTS: RwLock<HashMap<TypeId, TypeLayout>> = RwLock::new(HashMap::new());
}

/// Returns the cached layout of `T`, computing it on first use.
///
/// Entries are never evicted.
pub fn layout_of<T: Marshal>() -> TypeLayout {
    let id = TypeId::of::<T>();

    if let Some(layout) = LAYOUTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return *layout;
    }

    let layout = TypeLayout::from_descriptor(&T::descriptor());
    trace!(
        "Computed layout for {}: {} bytes, {}, marshal={}",
        std::any::type_name::<T>(),
        layout.size,
        layout.kind,
        layout.requires_marshal
    );

    *LAYOUTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_insert(layout)
}

/// Number of cached layouts
pub fn cached_layouts() -> usize {
    LAYOUTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}
