use std::io::Write;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use log::LevelFilter;

/// Install the process logger. Dev builds log at debug, release at warn;
/// `RUST_LOG` overrides either.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let current = thread::current();
            let thread_name = current.name().unwrap_or("unnamed");
            writeln!(buf, "[{ts}ms][{thread_name}] {}", record.args())
        })
        .try_init();
}
