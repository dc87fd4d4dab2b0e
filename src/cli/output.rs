//! Console output for the CLI.
//!
//! All user-facing banners go through [`Console`], which serializes writes
//! behind one mutex so concurrent test cases can never interleave inside a
//! banner or its attached diff block. Coloring is decided once per process
//! (`NO_COLOR` wins over tty detection) and applied only here — the diff
//! and error texts themselves stay plain so they remain byte-stable.

use std::io::Write;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Process-wide color policy: `NO_COLOR` disables, otherwise follow the
/// tty status of stdout.
static COLOR_CHOICE: Lazy<ColorChoice> = Lazy::new(|| {
    if std::env::var_os("NO_COLOR").is_some() {
        ColorChoice::Never
    } else if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
});

/// Banner kinds, mirroring the run states of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Runs,
    Pass,
    Fail,
    Skip,
}

impl Tag {
    fn label(self) -> &'static str {
        match self {
            Self::Runs => "RUNS",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }

    fn background(self) -> Color {
        match self {
            Self::Runs => Color::Blue,
            Self::Pass => Color::Green,
            Self::Fail => Color::Red,
            Self::Skip => Color::Yellow,
        }
    }

    /// Message color; `RUNS` messages stay uncolored.
    fn foreground(self) -> Option<Color> {
        match self {
            Self::Runs => None,
            Self::Pass => Some(Color::Green),
            Self::Fail => Some(Color::Red),
            Self::Skip => Some(Color::Yellow),
        }
    }
}

enum Sink {
    Stdout(StandardStream),
    /// Discards everything; used by tests exercising the runner.
    Null,
}

/// Mutex-guarded console shared by all workers.
pub struct Console {
    sink: Mutex<Sink>,
}

impl Console {
    pub fn stdout() -> Self {
        Self {
            sink: Mutex::new(Sink::Stdout(StandardStream::stdout(*COLOR_CHOICE))),
        }
    }

    pub fn null() -> Self {
        Self {
            sink: Mutex::new(Sink::Null),
        }
    }

    /// Emit one banner line atomically.
    pub fn banner(&self, tag: Tag, message: &str) {
        let mut sink = self.sink.lock();
        write_banner(&mut sink, tag, message, None);
    }

    /// Emit a banner plus an attached text block (diff or error detail) in
    /// a single critical section.
    pub fn banner_with_block(&self, tag: Tag, message: &str, block: &str) {
        let mut sink = self.sink.lock();
        write_banner(&mut sink, tag, message, Some(block));
    }
}

fn write_banner(sink: &mut Sink, tag: Tag, message: &str, block: Option<&str>) {
    let Sink::Stdout(stream) = sink else { return };
    let _ = stream.set_color(
        ColorSpec::new()
            .set_fg(Some(Color::White))
            .set_bg(Some(tag.background()))
            .set_bold(true),
    );
    let _ = write!(stream, " {} ", tag.label());
    let _ = stream.reset();
    if let Some(fg) = tag.foreground() {
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(fg)));
    }
    let _ = writeln!(stream, " {message}");
    let _ = stream.reset();
    if let Some(block) = block {
        let _ = writeln!(stream, "{block}");
    }
    let _ = stream.flush();
}

// ============================================================================
// LOG BACKEND
// ============================================================================

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stream = StandardStream::stderr(*COLOR_CHOICE);
        let color = match record.level() {
            log::Level::Error => Some(Color::Red),
            log::Level::Warn => Some(Color::Yellow),
            log::Level::Debug | log::Level::Trace => Some(Color::Cyan),
            log::Level::Info => None,
        };
        if let Some(c) = color {
            let _ = stream.set_color(ColorSpec::new().set_fg(Some(c)));
        }
        let _ = write!(stream, "{:>5}", record.level());
        let _ = stream.reset();
        let _ = writeln!(stream, " {}", record.args());
    }

    fn flush(&self) {}
}

/// Install the stderr logger. Safe to call more than once; later calls
/// only adjust the level filter.
pub fn init_logging(debug: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}
