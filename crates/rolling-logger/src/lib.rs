//! Rolling Logger
//!
//! A `tracing` layer that keeps the most recent log lines in a circular
//! buffer and mirrors every line to the browser console (stderr when not
//! running in a browser).

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
pub use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Default number of lines kept in memory
pub const DEFAULT_CAPACITY: usize = 500;

static BUFFER: OnceLock<Arc<RollingBuffer>> = OnceLock::new();

/// A single formatted log line
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:>5} [{}] {}", self.timestamp, self.level, self.target, self.message)
    }
}

/// Circular buffer of log lines; the oldest line is dropped once full
#[derive(Debug)]
pub struct RollingBuffer {
    lines: Mutex<VecDeque<LogLine>>,
    capacity: usize,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: LogLine) {
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Copy of the buffered lines, oldest first
    pub fn snapshot(&self) -> Vec<LogLine> {
        match self.lines.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

/// Layer writing into a [`RollingBuffer`]
pub struct RollingLayer {
    buffer: Arc<RollingBuffer>,
    console: bool,
}

impl RollingLayer {
    pub fn new(buffer: Arc<RollingBuffer>) -> Self {
        Self { buffer, console: true }
    }

    /// Keep lines in the buffer only
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }
}

impl<S: Subscriber> Layer<S> for RollingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let line = LogLine {
            timestamp: chrono::Local::now().format("%H:%M:%S%.3f").to_string(),
            level: *meta.level(),
            target: meta.target().to_string(),
            message: visitor.finish(),
        };

        if self.console {
            write_console(&line);
        }
        self.buffer.push(line);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn write_console(line: &LogLine) {
    let text = line.to_string().into();
    match line.level {
        Level::ERROR => web_sys::console::error_1(&text),
        Level::WARN => web_sys::console::warn_1(&text),
        Level::DEBUG | Level::TRACE => web_sys::console::debug_1(&text),
        _ => web_sys::console::log_1(&text),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_console(line: &LogLine) {
    eprintln!("{}", line);
}

/// Parse a level name ("error", "warn", "info", "debug", "trace", "off")
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

/// Install the global subscriber. Calling it twice keeps the first buffer.
pub fn init(level: LevelFilter, capacity: usize) -> Arc<RollingBuffer> {
    BUFFER
        .get_or_init(|| {
            let buffer = Arc::new(RollingBuffer::new(capacity));
            let layer = RollingLayer::new(buffer.clone()).with_filter(level);
            let _ = tracing_subscriber::registry().with(layer).try_init();
            buffer
        })
        .clone()
}

/// Buffer installed by [`init`], if any
pub fn buffer() -> Option<Arc<RollingBuffer>> {
    BUFFER.get().cloned()
}
