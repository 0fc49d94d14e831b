//! External command execution with a deadline

use crate::error::HwError;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_STEP: Duration = Duration::from_millis(5);

/// Run `program` with `args` and return its trimmed stdout.
///
/// The child is killed and reaped once `timeout` elapses.
pub fn run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<String, HwError> {
    let command = describe(program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| HwError::Spawn {
            command: command.clone(),
            source,
        })?;

    // Drained while the child runs so a full pipe cannot stall it
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(HwError::Timeout { command, timeout });
                }
                std::thread::sleep(POLL_STEP);
            }
            Err(source) => return Err(HwError::Spawn { command, source }),
        }
    };

    let stdout = stdout.join().unwrap_or_default();

    if !status.success() {
        let stderr = stderr.join().unwrap_or_default();
        let stderr = match stderr.trim() {
            "" => status.to_string(),
            text => text.to_string(),
        };
        return Err(HwError::CommandFailed { command, stderr });
    }

    Ok(stdout.trim().to_string())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
