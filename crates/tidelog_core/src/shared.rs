//! `tracing-subscriber` output integration.

use crate::writer::AsyncWriter;
use std::ops::Deref;
use std::sync::Arc;
use tidelog_sink::LogSink;
use tracing::Metadata;
use tracing_subscriber::fmt::writer::OptionalWriter;
use tracing_subscriber::fmt::MakeWriter;

/// Crates whose own events are never written back into a tidelog sink.
///
/// Their diagnostics can be emitted while the sink is locked, so feeding
/// them back in would re-enter it.
const SELF_TARGETS: [&str; 2] = ["tidelog_core", "tidelog_sink"];

/// A cloneable handle to an [`AsyncWriter`], usable as the output of a
/// `tracing_subscriber::fmt` layer.
///
/// ```rust
/// use tidelog_core::{AsyncWriter, SharedWriter};
/// use tidelog_sink::MemorySink;
///
/// let probe = MemorySink::new();
/// let shared = SharedWriter::new(AsyncWriter::new(probe.clone()).unwrap());
///
/// let subscriber = tracing_subscriber::fmt()
///     .with_writer(shared.clone())
///     .with_ansi(false)
///     .finish();
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!("service started");
/// });
///
/// shared.close().unwrap();
/// assert!(String::from_utf8_lossy(&probe.data()).contains("service started"));
/// ```
pub struct SharedWriter<S: LogSink + 'static> {
    inner: Arc<AsyncWriter<S>>,
}

impl<S: LogSink + 'static> SharedWriter<S> {
    /// Wraps a writer in a shared handle.
    pub fn new(writer: AsyncWriter<S>) -> Self {
        Self {
            inner: Arc::new(writer),
        }
    }
}

impl<S: LogSink + 'static> Clone for SharedWriter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LogSink + 'static> Deref for SharedWriter<S> {
    type Target = AsyncWriter<S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<S: LogSink + 'static> std::fmt::Debug for SharedWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedWriter").field(&*self.inner).finish()
    }
}

impl<'a, S: LogSink + 'static> MakeWriter<'a> for SharedWriter<S> {
    type Writer = OptionalWriter<&'a AsyncWriter<S>>;

    fn make_writer(&'a self) -> Self::Writer {
        OptionalWriter::some(&*self.inner)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        let target = meta.target();
        if SELF_TARGETS.iter().any(|own| target.starts_with(own)) {
            return OptionalWriter::none();
        }
        self.make_writer()
    }
}
