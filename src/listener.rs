//! Progress listeners for segmented stream reads.
//!
//! A [`SegmentedStream`](crate::SegmentedStream) reports two kinds of
//! events through the [`ExtractionListener`] it was built with:
//! - a part becoming active (on construction, on each natural transition
//!   and after each seek)
//! - the cumulative byte counters after every completed read call
//!
//! Listeners are called synchronously from inside the read path and must
//! return quickly.
//!
//! # Example
//!
//! ```rust
//! use std::io::Read;
//! use volspan::listener::StatisticsListener;
//! use volspan::{MemoryPart, PartHeader, SegmentedStream};
//!
//! let parts = vec![
//!     MemoryPart::new("a.part1.rar", PartHeader::new("a", 3).split_after(true), vec![1u8, 2, 3]),
//!     MemoryPart::new("a.part2.rar", PartHeader::new("a", 2), vec![4u8, 5]),
//! ];
//! let mut stream = SegmentedStream::new(parts, StatisticsListener::new())?;
//!
//! let mut data = Vec::new();
//! stream.read_to_end(&mut data)?;
//!
//! let stats = stream.listener();
//! assert_eq!(stats.parts_started(), 2);
//! assert_eq!(stats.state().entry_bytes, 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// Floating point versions for formatting calculations
const BYTES_KB: f64 = 1024.0;
const BYTES_MB: f64 = BYTES_KB * 1024.0;
const BYTES_GB: f64 = BYTES_MB * 1024.0;

/// Receives progress notifications from a segmented stream.
///
/// Both methods have no-op defaults so implementors only override what
/// they need.
pub trait ExtractionListener {
    /// Called when a part becomes the active part.
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        let _ = (part_name, compressed_size, uncompressed_size);
    }

    /// Called once after every completed read call.
    ///
    /// `part_bytes` is reset on every activation; `entry_bytes` is
    /// cumulative for the stream's lifetime.
    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        let _ = (part_bytes, entry_bytes);
    }
}

impl<L: ExtractionListener + ?Sized> ExtractionListener for &mut L {
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        (**self).on_part_begin(part_name, compressed_size, uncompressed_size);
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        (**self).on_bytes_read(part_bytes, entry_bytes);
    }
}

impl<L: ExtractionListener + ?Sized> ExtractionListener for Box<L> {
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        (**self).on_part_begin(part_name, compressed_size, uncompressed_size);
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        (**self).on_bytes_read(part_bytes, entry_bytes);
    }
}

/// A listener that does nothing (null object pattern).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoListener;

impl ExtractionListener for NoListener {}

/// A part activation as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartEvent {
    /// Display name of the part.
    pub name: String,
    /// Compressed size of the part.
    pub compressed_size: u64,
    /// Uncompressed size reported by the part.
    pub uncompressed_size: u64,
}

/// Listener state with timing.
#[derive(Debug, Clone)]
pub struct ListenerState {
    /// Bytes read from the active part so far.
    pub part_bytes: u64,
    /// Bytes read over the stream's lifetime.
    pub entry_bytes: u64,
    /// Part currently being read.
    pub current_part: Option<String>,
    /// Number of completed read calls.
    pub read_calls: usize,
    /// Time the listener was created.
    pub start_time: Instant,
    /// Time of last update.
    pub last_update: Instant,
}

impl Default for ListenerState {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            part_bytes: 0,
            entry_bytes: 0,
            current_part: None,
            read_calls: 0,
            start_time: now,
            last_update: now,
        }
    }
}

/// A listener that records every event.
#[derive(Debug, Default, Clone)]
pub struct StatisticsListener {
    /// Every part activation in order.
    pub parts: Vec<PartEvent>,
    /// Every `(part_bytes, entry_bytes)` pair in order.
    pub reads: Vec<(u64, u64)>,
    state: ListenerState,
}

impl StatisticsListener {
    /// Creates a new statistics listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected state.
    pub fn state(&self) -> &ListenerState {
        &self.state
    }

    /// Number of part activations seen.
    pub fn parts_started(&self) -> usize {
        self.parts.len()
    }

    /// Clears all recorded events, keeping the timing origin.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.reads.clear();
    }
}

impl ExtractionListener for StatisticsListener {
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        self.parts.push(PartEvent {
            name: part_name.to_string(),
            compressed_size,
            uncompressed_size,
        });
        self.state.current_part = Some(part_name.to_string());
        self.state.part_bytes = 0;
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        self.reads.push((part_bytes, entry_bytes));
        self.state.part_bytes = part_bytes;
        self.state.entry_bytes = entry_bytes;
        self.state.read_calls += 1;
        self.state.last_update = Instant::now();
    }
}

/// A listener that rate-limits byte counter callbacks.
///
/// Part activations are always forwarded.
pub struct ThrottledListener<L> {
    inner: L,
    min_interval: Duration,
    last_callback: Option<Instant>,
}

impl<L: ExtractionListener> ThrottledListener<L> {
    /// Creates a new throttled listener.
    ///
    /// `min_interval` is the minimum time between byte counter callbacks.
    pub fn new(inner: L, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_callback: None,
        }
    }

    /// Creates with default 100ms interval.
    pub fn default_interval(inner: L) -> Self {
        Self::new(inner, Duration::from_millis(100))
    }

    /// Returns the inner listener.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: ExtractionListener> ExtractionListener for ThrottledListener<L> {
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        self.inner
            .on_part_begin(part_name, compressed_size, uncompressed_size);
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        let now = Instant::now();
        let due = self
            .last_callback
            .is_none_or(|last| now.duration_since(last) >= self.min_interval);
        if due {
            self.last_callback = Some(now);
            self.inner.on_bytes_read(part_bytes, entry_bytes);
        }
    }
}

/// A thread-safe listener using atomics.
///
/// Allows progress to be monitored from another thread.
#[derive(Debug)]
pub struct AtomicListener {
    parts_started: AtomicU64,
    part_bytes: AtomicU64,
    entry_bytes: AtomicU64,
}

impl Default for AtomicListener {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicListener {
    /// Creates a new atomic listener.
    pub fn new() -> Self {
        Self {
            parts_started: AtomicU64::new(0),
            part_bytes: AtomicU64::new(0),
            entry_bytes: AtomicU64::new(0),
        }
    }

    /// Creates a shared atomic listener.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the number of part activations.
    pub fn parts_started(&self) -> u64 {
        self.parts_started.load(Ordering::Relaxed)
    }

    /// Returns bytes read from the active part.
    pub fn part_bytes(&self) -> u64 {
        self.part_bytes.load(Ordering::Relaxed)
    }

    /// Returns bytes read over the stream's lifetime.
    pub fn entry_bytes(&self) -> u64 {
        self.entry_bytes.load(Ordering::Relaxed)
    }

    fn record_part(&self) {
        self.parts_started.fetch_add(1, Ordering::Relaxed);
        self.part_bytes.store(0, Ordering::Relaxed);
    }

    fn record_bytes(&self, part_bytes: u64, entry_bytes: u64) {
        self.part_bytes.store(part_bytes, Ordering::Relaxed);
        self.entry_bytes.store(entry_bytes, Ordering::Relaxed);
    }
}

impl ExtractionListener for AtomicListener {
    fn on_part_begin(&mut self, _part_name: &str, _compressed: u64, _uncompressed: u64) {
        self.record_part();
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        self.record_bytes(part_bytes, entry_bytes);
    }
}

/// Listener for shared `Arc<AtomicListener>`.
impl ExtractionListener for Arc<AtomicListener> {
    fn on_part_begin(&mut self, _part_name: &str, _compressed: u64, _uncompressed: u64) {
        self.record_part();
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        self.record_bytes(part_bytes, entry_bytes);
    }
}

/// A listener that calls a closure with the byte counters.
pub struct ClosureListener<F> {
    callback: F,
}

impl<F> ClosureListener<F>
where
    F: FnMut(u64, u64),
{
    /// Creates a listener from a closure.
    ///
    /// The closure receives `(part_bytes, entry_bytes)`.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ExtractionListener for ClosureListener<F>
where
    F: FnMut(u64, u64),
{
    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        (self.callback)(part_bytes, entry_bytes)
    }
}

/// Creates a closure-based listener.
pub fn listener_fn<F>(f: F) -> ClosureListener<F>
where
    F: FnMut(u64, u64),
{
    ClosureListener::new(f)
}

/// A listener that forwards events to the `log` facade.
///
/// Part activations are logged at `info`, byte counters at `trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl ExtractionListener for LogListener {
    fn on_part_begin(&mut self, part_name: &str, compressed_size: u64, uncompressed_size: u64) {
        log::info!(
            "Extracting part '{}' ({} packed, {} unpacked)",
            part_name,
            format_bytes_iec(compressed_size),
            format_bytes_iec(uncompressed_size)
        );
    }

    fn on_bytes_read(&mut self, part_bytes: u64, entry_bytes: u64) {
        log::trace!("Read {} bytes from part, {} bytes total", part_bytes, entry_bytes);
    }
}

/// Formats bytes as a human-readable string using IEC units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```rust
/// use volspan::listener::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(0), "0 B");
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1024), "1.0 KiB");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// assert_eq!(format_bytes_iec(1048576), "1.0 MiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let bytes_f64 = bytes as f64;
    if bytes_f64 < BYTES_KB {
        format!("{} B", bytes)
    } else if bytes_f64 < BYTES_MB {
        format!("{:.1} KiB", bytes_f64 / BYTES_KB)
    } else if bytes_f64 < BYTES_GB {
        format!("{:.1} MiB", bytes_f64 / BYTES_MB)
    } else {
        format!("{:.1} GiB", bytes_f64 / BYTES_GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_listener() {
        let mut listener = NoListener;
        listener.on_part_begin("a", 1, 2);
        listener.on_bytes_read(1, 1);
    }

    #[test]
    fn test_statistics_listener() {
        let mut listener = StatisticsListener::new();
        listener.on_part_begin("a.part1.rar", 100, 300);
        listener.on_bytes_read(40, 40);
        listener.on_part_begin("a.part2.rar", 50, 300);
        listener.on_bytes_read(10, 50);

        assert_eq!(listener.parts_started(), 2);
        assert_eq!(
            listener.parts[0],
            PartEvent {
                name: "a.part1.rar".into(),
                compressed_size: 100,
                uncompressed_size: 300,
            }
        );
        assert_eq!(listener.reads, vec![(40, 40), (10, 50)]);
        assert_eq!(listener.state().entry_bytes, 50);
        assert_eq!(listener.state().read_calls, 2);
        assert_eq!(listener.state().current_part.as_deref(), Some("a.part2.rar"));

        listener.clear();
        assert_eq!(listener.parts_started(), 0);
        assert!(listener.reads.is_empty());
    }

    #[test]
    fn test_throttled_listener() {
        let inner = StatisticsListener::new();
        let mut throttled = ThrottledListener::new(inner, Duration::from_millis(50));

        throttled.on_part_begin("p1", 10, 10);
        throttled.on_bytes_read(1, 1);
        // Should be throttled
        throttled.on_bytes_read(2, 2);
        throttled.on_part_begin("p2", 10, 10);

        std::thread::sleep(Duration::from_millis(60));
        throttled.on_bytes_read(3, 3);

        let inner = throttled.into_inner();
        assert_eq!(inner.parts_started(), 2);
        assert_eq!(inner.reads, vec![(1, 1), (3, 3)]);
    }

    #[test]
    fn test_atomic_listener() {
        let progress = AtomicListener::shared();
        let mut listener: Arc<AtomicListener> = Arc::clone(&progress);

        listener.on_part_begin("p1", 10, 10);
        listener.on_bytes_read(5, 5);
        listener.on_part_begin("p2", 10, 10);
        assert_eq!(progress.part_bytes(), 0);
        listener.on_bytes_read(3, 8);

        assert_eq!(progress.parts_started(), 2);
        assert_eq!(progress.part_bytes(), 3);
        assert_eq!(progress.entry_bytes(), 8);
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut listener = listener_fn(|part, entry| seen.push((part, entry)));
            listener.on_part_begin("ignored", 1, 1);
            listener.on_bytes_read(4, 4);
            listener.on_bytes_read(8, 8);
        }
        assert_eq!(seen, vec![(4, 4), (8, 8)]);
    }

    #[test]
    fn test_forwarding_impls() {
        fn notify<L: ExtractionListener>(mut listener: L) {
            listener.on_part_begin("p", 1, 1);
            listener.on_bytes_read(1, 1);
        }

        let mut stats = StatisticsListener::new();
        notify(&mut stats);
        assert_eq!(stats.parts_started(), 1);
        assert_eq!(stats.reads, vec![(1, 1)]);

        let boxed: Box<dyn ExtractionListener> = Box::new(NoListener);
        notify(boxed);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes_iec(500), "500 B");
        assert_eq!(format_bytes_iec(1500), "1.5 KiB");
        assert_eq!(format_bytes_iec(1500 * 1024), "1.5 MiB");
        assert_eq!(format_bytes_iec(1500 * 1024 * 1024), "1.5 GiB");
    }

    #[test]
    fn test_listener_state_default() {
        let state = ListenerState::default();
        assert_eq!(state.entry_bytes, 0);
        assert_eq!(state.read_calls, 0);
        assert!(state.current_part.is_none());
        assert!(state.last_update >= state.start_time);
    }
}
