//! C entry points called by instrumented programs.
//!
//! Every failure here is fatal: the message goes to stderr and the process
//! exits with status 1, since an instrumented C program has no way to react
//! to a recorder error.

use std::ffi::{CStr, c_char, c_int};
use std::fmt::Display;
use std::fs::File;
use std::io::BufWriter;

use parking_lot::{Mutex, Once, const_mutex};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::{LOG_ENV, RecorderConfig};
use crate::perf::PerfBackend;
use crate::recorder::Recorder;

/// Contents of the C header declaring the entry points below.
pub const RUNTIME_HEADER: &str = include_str!("../include/runtime_library.h");

/// File name instrumented sources include.
pub const RUNTIME_HEADER_NAME: &str = "runtime_library.h";

type ProcessRecorder = Recorder<PerfBackend, BufWriter<File>>;

static RECORDER: Mutex<Option<ProcessRecorder>> = const_mutex(None);
static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn fatal(op: &str, err: impl Display) -> ! {
    error!(op, %err, "trace recorder failed");
    eprintln!("cprobe: {op}: {err}");
    std::process::exit(1);
}

fn with_recorder<T>(op: &str, f: impl FnOnce(&mut ProcessRecorder) -> crate::Result<T>) -> T {
    let mut guard = RECORDER.lock();
    let recorder = guard.get_or_insert_with(|| Recorder::new(PerfBackend::new()));
    match f(recorder) {
        Ok(value) => value,
        Err(err) => {
            drop(guard);
            fatal(op, err)
        }
    }
}

/// Copy `argv[0..argc]` into owned strings. Null entries are skipped.
///
/// # Safety
///
/// `argv` must be null or point to `argc` pointers, each null or a valid
/// NUL-terminated string.
unsafe fn collect_args(argc: c_int, argv: *const *const c_char) -> Vec<String> {
    if argv.is_null() {
        return Vec::new();
    }
    let count = usize::try_from(argc).unwrap_or(0);
    (0..count)
        .filter_map(|i| {
            // SAFETY: caller guarantees `argv` holds `argc` entries.
            let arg = unsafe { *argv.add(i) };
            // SAFETY: non-null entries are NUL-terminated strings.
            (!arg.is_null()).then(|| unsafe { CStr::from_ptr(arg) }.to_string_lossy().into_owned())
        })
        .collect()
}

/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
unsafe fn function_name(name: *const c_char) -> String {
    if name.is_null() {
        return String::from("<null>");
    }
    // SAFETY: checked non-null above; caller guarantees termination.
    unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
}

/// Parse `-trace-papievents=`, open the counter group and write the header.
///
/// # Safety
///
/// `argv` must be the `argv` passed to `main` (or null).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runtime_library_init(argc: c_int, argv: *mut *mut c_char) {
    init_logging();
    // SAFETY: forwarded from the caller's contract.
    let args = unsafe { collect_args(argc, argv.cast_const().cast()) };
    let config = RecorderConfig::from_env();
    with_recorder("runtime_library_init", |rec| rec.initialize(&config, &args));
}

/// Start measuring `func_name`.
///
/// # Safety
///
/// `func_name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runtime_function_entry(func_name: *const c_char) {
    // SAFETY: forwarded from the caller's contract.
    let name = unsafe { function_name(func_name) };
    with_recorder("runtime_function_entry", |rec| rec.function_entry(&name));
}

/// Stop measuring and write the completed row.
///
/// # Safety
///
/// `func_name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runtime_function_exit(func_name: *const c_char) {
    // SAFETY: forwarded from the caller's contract.
    let name = unsafe { function_name(func_name) };
    with_recorder("runtime_function_exit", |rec| rec.function_exit(&name));
}

/// Release the counters and close the trace file.
#[unsafe(no_mangle)]
pub extern "C" fn runtime_library_finalize() {
    with_recorder("runtime_library_finalize", |rec| rec.finalize().map(drop));
}
