use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

// -------- robust file ops with backoff (AV scanners, network shares) --------

/// Return true for transient/retriable I/O errors (sharing/lock violations and
/// the like on Windows volumes).
#[cfg(windows)]
fn is_retriable_io_error(e: &io::Error) -> bool {
    //   5 = access denied, 32 = sharing violation, 33 = lock violation,
    //  21 = device not ready, 1224 = user-mapped section open
    matches!(e.raw_os_error(), Some(5) | Some(21) | Some(32) | Some(33) | Some(1224))
}

// The same numbers are EIO/EISDIR/EPIPE/ENXIO elsewhere; none of them clear up by waiting.
#[cfg(not(windows))]
fn is_retriable_io_error(_e: &io::Error) -> bool {
    false
}

/// Run `op` until it succeeds, fails with a non-transient error, or `tries` run out.
fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Create a file with retries/backoff for transient errors.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::create(path))
}

/// Create a directory (and parents) with retries/backoff.
pub fn create_dir_all_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    with_backoff(tries, delay_ms, || fs::create_dir_all(path))
        .with_context(|| format!("create dir {}", path.display()))
}

/// Write `lines` (one per line) to `dest`, replacing it as a whole: the content
/// goes to `<dest>.inprogress` first and is renamed over `dest` once flushed, so
/// a reader never sees a half-written file.
pub fn write_lines_atomic<I, S>(dest: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tmp_name = dest.as_os_str().to_owned();
    tmp_name.push(".inprogress");
    let tmp = Path::new(&tmp_name);

    {
        let f = create_with_backoff(tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::new(f);
        for line in lines {
            w.write_all(line.as_ref().as_bytes())?;
            w.write_all(b"\n")?;
        }
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }

    if let Err(e) = with_backoff(20, 50, || fs::rename(tmp, dest)) {
        // rename over an open file can fail on some platforms: copy then clean up
        tracing::debug!("rename {} failed ({}), falling back to copy", tmp.display(), e);
        with_backoff(20, 50, || fs::copy(tmp, dest))
            .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
        with_backoff(20, 50, || match fs::remove_file(tmp) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .with_context(|| format!("remove {}", tmp.display()))?;
    }
    Ok(())
}

/// True when `dir` exists, is a directory and accepts new files.
pub fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let marker = dir.join(format!(".threadscrape_marker_{}", std::process::id()));
    match File::create(&marker) {
        Ok(_) => {
            let _ = fs::remove_file(&marker);
            true
        }
        Err(_) => false,
    }
}
