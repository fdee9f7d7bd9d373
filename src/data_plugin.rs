//! Type-indexed, lazily-initialized storage slots attached to [`crate::context::SimulationContext`].
//!
//! Each [`DataPlugin`] type is assigned a stable index into
//! `SimulationContext::data_plugins` the first time it is used, via a global counter. Fetching
//! a plugin's data container is then a plain vector index instead of a `TypeId`-keyed map
//! lookup. The teacher's crate supports this for an open set of context types via a generic
//! `PluginContext` trait bound; this crate has exactly one context type, so `DataPlugin::init`
//! takes `&SimulationContext` directly.
use crate::context::SimulationContext;
use crate::HashSet;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

/// The set of `TypeId`s of all `DataPlugin` types linked into the binary, populated by `ctor`
/// at process start-up as each `define_data_plugin!`-generated type is registered.
static DATA_PLUGINS: LazyLock<Mutex<RefCell<HashSet<TypeId>>>> =
    LazyLock::new(|| Mutex::new(RefCell::new(HashSet::default())));

pub fn add_data_plugin_to_registry<T: DataPlugin>() {
    DATA_PLUGINS
        .lock()
        .unwrap()
        .borrow_mut()
        .insert(TypeId::of::<T>());
}

pub fn get_data_plugin_count() -> usize {
    DATA_PLUGINS.lock().unwrap().borrow().len()
}

/// Global data plugin index counter: the index assigned to the next data plugin that requests
/// one. Data plugins are stored in `SimulationContext::data_plugins: Vec<OnceCell<Box<dyn Any>>>`
/// rather than a `TypeId`-keyed map, so fetching one is a vector index.
static NEXT_DATA_PLUGIN_INDEX: Mutex<usize> = Mutex::new(0);

/// Acquires a global lock on the next available plugin index, incrementing it only if we
/// successfully claim the provided atomic. Called from `define_data_plugin!`.
pub fn initialize_data_plugin_index(plugin_index: &AtomicUsize) -> usize {
    let mut guard = NEXT_DATA_PLUGIN_INDEX.lock().unwrap();
    let candidate = *guard;
    match plugin_index.compare_exchange(usize::MAX, candidate, Ordering::AcqRel, Ordering::Acquire)
    {
        Ok(_) => {
            *guard += 1;
            candidate
        }
        Err(existing) => existing,
    }
}

/// A type that can provide a lazily-initialized data container stored by `SimulationContext`.
pub trait DataPlugin: Any {
    type DataContainer;

    fn init(context: &SimulationContext) -> Self::DataContainer;

    /// The index into `SimulationContext::data_plugins` where this plugin's container lives.
    fn index_within_context() -> usize;
}

/// Helper for `define_data_plugin!`.
#[macro_export]
macro_rules! __define_data_plugin {
    ($data_plugin:ident, $data_container:ty, |$ctx:ident| $body:expr) => {
        struct $data_plugin;

        impl $crate::data_plugin::DataPlugin for $data_plugin {
            type DataContainer = $data_container;

            fn init($ctx: &$crate::context::SimulationContext) -> Self::DataContainer {
                $body
            }

            fn index_within_context() -> usize {
                // `usize::MAX` is the sentinel for "uninitialized"; shared by all instances of
                // this plugin type.
                static INDEX: std::sync::atomic::AtomicUsize =
                    std::sync::atomic::AtomicUsize::new(usize::MAX);

                let index = INDEX.load(std::sync::atomic::Ordering::Relaxed);
                if index != usize::MAX {
                    return index;
                }
                $crate::data_plugin::initialize_data_plugin_index(&INDEX)
            }
        }

        $crate::paste::paste! {
            $crate::ctor::declarative::ctor!{
                #[ctor]
                fn [<_register_plugin_ $data_plugin:snake>]() {
                    $crate::data_plugin::add_data_plugin_to_registry::<$data_plugin>()
                }
            }
        }
    };
}

/// Defines a new type for storing data in `SimulationContext`.
#[macro_export]
macro_rules! define_data_plugin {
    ($data_plugin:ident, $data_container:ty, |$ctx:ident| $body:expr) => {
        $crate::__define_data_plugin!($data_plugin, $data_container, |$ctx| $body);
    };

    ($data_plugin:ident, $data_container:ty, $default: expr) => {
        $crate::__define_data_plugin!($data_plugin, $data_container, |_context| $default);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimulationContext;

    define_data_plugin!(TestPlugin, Vec<u32>, vec![1, 2, 3]);

    #[test]
    fn plugin_initializes_lazily_with_default() {
        let mut context = SimulationContext::new();
        assert_eq!(context.get_data(TestPlugin), &vec![1, 2, 3]);
        context.get_data_mut(TestPlugin).push(4);
        assert_eq!(context.get_data(TestPlugin), &vec![1, 2, 3, 4]);
    }
}
