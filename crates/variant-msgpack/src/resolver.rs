//! Process-wide formatter registry.
//!
//! Formatters are materialized on first request, one per shape, and live for
//! the rest of the process. Lookups after that are a concurrent map read.

use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use nebula_variant::{Variant, VariantResult};

use crate::codec;
use crate::error::MsgPackResult;
use crate::options::MsgPackOptions;
use crate::value::GraphValue;
use crate::wire::Wire;

type Registry = DashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static FORMATTERS: LazyLock<Registry> = LazyLock::new(DashMap::new);
static MATERIALIZED: AtomicUsize = AtomicUsize::new(0);

/// Shapes the registry can produce a [`VariantFormatter`] for.
pub trait VariantShape: Sized + Send + Sync + 'static {
    /// Writes `self` as MessagePack.
    fn write(&self) -> MsgPackResult<Vec<u8>>;

    /// Builds `Self` from a freshly parsed graph.
    fn read(value: GraphValue) -> Self;
}

impl VariantShape for Variant {
    fn write(&self) -> MsgPackResult<Vec<u8>> {
        codec::encode_raw(&Wire(self.inner()))
    }

    fn read(value: GraphValue) -> Self {
        Self::new(value)
    }
}

impl VariantShape for GraphValue {
    fn write(&self) -> MsgPackResult<Vec<u8>> {
        GraphValue::write(self)
    }

    fn read(value: GraphValue) -> Self {
        value
    }
}

/// Reads and writes one [`VariantShape`].
#[derive(Debug)]
pub struct VariantFormatter<T> {
    shape: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: VariantShape> VariantFormatter<T> {
    fn new() -> Self {
        Self {
            shape: type_name::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> &'static str {
        self.shape
    }

    pub fn encode(&self, value: &T) -> VariantResult<Vec<u8>> {
        Ok(value.write()?)
    }

    pub fn decode(&self, bytes: &[u8], options: &MsgPackOptions) -> VariantResult<T> {
        GraphValue::parse_with(bytes, options).map(T::read)
    }
}

/// Returns the formatter for `T`, materializing it on first use.
///
/// Concurrent first calls race on the map entry; exactly one of them builds
/// the formatter and every caller gets that instance.
pub fn formatter<T: VariantShape>() -> Arc<VariantFormatter<T>> {
    let entry = FORMATTERS.entry(TypeId::of::<T>()).or_insert_with(|| {
        MATERIALIZED.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(shape = type_name::<T>(), "Materialized MessagePack formatter");
        Arc::new(VariantFormatter::<T>::new())
    });
    let formatter = Arc::clone(entry.value());
    drop(entry);

    // keyed by `TypeId::of::<T>()`, so the downcast cannot miss
    formatter
        .downcast::<VariantFormatter<T>>()
        .unwrap_or_else(|_| Arc::new(VariantFormatter::new()))
}

/// Number of shapes with a materialized formatter.
pub fn registered() -> usize {
    FORMATTERS.len()
}

/// Total formatter materializations since process start.
pub fn materialized() -> usize {
    MATERIALIZED.load(Ordering::Relaxed)
}
