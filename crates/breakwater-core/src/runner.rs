//! Isolated runner: one short-lived interpreter process per execution
//!
//! The wrapper program is persisted to a uniquely-named temp file owned by a
//! [`tempfile::NamedTempFile`], so deletion happens on every exit path
//! (normal exit, non-zero exit, timeout, spawn failure) by drop. No process
//! outlives one call: on timeout the child's whole process group is killed.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::SandboxConfig;
use crate::wrapper::WrapperProgram;
use crate::{BreakwaterError, Result};

/// How often the runner polls the child for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured output of one finished child process.
#[derive(Debug, Clone)]
pub struct RawProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the wrapper program under `interpreter`, enforcing the wall-clock
/// budget. Returns the captured streams of the exited process; a child that
/// outlives the budget is killed and reported as [`BreakwaterError::Timeout`].
pub fn execute(
    program: &WrapperProgram,
    interpreter: &Path,
    config: &SandboxConfig,
    timeout: Duration,
) -> Result<RawProcessOutput> {
    // Scoped resource: the temp file is removed when this binding drops,
    // whichever way this function returns.
    let mut file = tempfile::Builder::new()
        .prefix("breakwater-")
        .suffix(program.language.file_extension())
        .tempfile_in(&config.temp_dir)?;
    file.as_file_mut().write_all(program.text.as_bytes())?;
    file.as_file_mut().flush()?;

    tracing::debug!(
        language = %program.language,
        path = %file.path().display(),
        timeout_secs = timeout.as_secs(),
        "spawning interpreter"
    );

    let mut command = Command::new(interpreter);
    command
        .arg(file.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &config.env {
        command.env(key, value);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group, so a timeout kill reaches any sub-children too.
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            BreakwaterError::RuntimeMissing {
                runtime: interpreter.display().to_string(),
            }
        } else {
            BreakwaterError::Io(err)
        }
    })?;

    let cap = config.max_output_bytes;
    let stdout_reader = child.stdout.take().map(|pipe| spawn_drain(pipe, cap));
    let stderr_reader = child.stderr.take().map(|pipe| spawn_drain(pipe, cap));

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() >= timeout {
            kill_process_group(&mut child);
            let _ = child.wait();
            tracing::warn!(
                language = %program.language,
                elapsed_secs = start.elapsed().as_secs(),
                "execution timed out, process group killed"
            );
            return Err(BreakwaterError::Timeout {
                elapsed_secs: start.elapsed().as_secs().max(timeout.as_secs()),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_drain(stdout_reader);
    let stderr = join_drain(stderr_reader);
    let exit_code = status.code().unwrap_or(-1);

    tracing::debug!(
        language = %program.language,
        exit_code,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "interpreter exited"
    );

    Ok(RawProcessOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    })
}

/// Drain a child pipe on its own thread, keeping at most `cap` bytes.
/// Reading continues past the cap so the child never blocks on a full pipe.
fn spawn_drain<R>(mut reader: R, cap: usize) -> std::thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut collected = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if collected.len() < cap {
                        let keep = n.min(cap - collected.len());
                        collected.extend_from_slice(&chunk[..keep]);
                    }
                }
            }
        }
        collected
    })
}

fn join_drain(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn kill_process_group(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // The child was started with process_group(0), so its pid is the pgid.
    let _ = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}
