use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use std::{path::Path, time::Duration};

/// Number of attempts to read the equation file after a change
///
/// Editors often replace files in several steps, so a read can briefly fail
/// while the file is missing or half-written.
const READ_ATTEMPTS: usize = 20;

/// Delay between read attempts
const READ_DELAY: Duration = Duration::from_millis(10);

/// Reads the equation file, retrying on failure
///
/// The returned text has surrounding whitespace removed.
fn read_equation(path: &Path) -> Result<String> {
    let mut attempt = 1;
    let text = loop {
        match std::fs::read_to_string(path) {
            Ok(text) => break text,
            Err(e) if attempt < READ_ATTEMPTS => {
                debug!("retrying read of {path:?} ({e})");
                attempt += 1;
                std::thread::sleep(READ_DELAY);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {path:?}"));
            }
        }
    };
    Ok(text.trim().to_owned())
}

/// Forwards the text of the equation file on `tx`
///
/// The initial text is sent immediately.  Afterwards, each burst of change
/// notifications on `rx` causes a single re-read, and the text is only sent
/// if it differs from what was last sent.  Returns when either channel is
/// closed.
pub(crate) fn file_watcher_thread(
    path: &Path,
    rx: Receiver<()>,
    tx: Sender<String>,
) -> Result<()> {
    let mut sent = read_equation(path)?;
    tx.send(sent.clone())?;

    while rx.recv().is_ok() {
        // Editors tend to emit several events per save
        rx.try_iter().for_each(drop);

        let text = match read_equation(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("{e:#}; keeping the previous equation");
                continue;
            }
        };
        if text != sent {
            debug!("equation file changed");
            tx.send(text.clone())?;
            sent = text;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn forwards_changed_text() {
        let path = std::env::temp_dir()
            .join(format!("zslice-watch-{}.txt", std::process::id()));
        std::fs::write(&path, "  x*x + y*y\n").unwrap();

        let (notify_tx, notify_rx) = unbounded();
        let (text_tx, text_rx) = unbounded();
        let p = path.clone();
        let handle = std::thread::spawn(move || {
            file_watcher_thread(&p, notify_rx, text_tx)
        });
        assert_eq!(text_rx.recv().unwrap(), "x*x + y*y");

        std::fs::write(&path, "x - y").unwrap();
        notify_tx.send(()).unwrap();
        notify_tx.send(()).unwrap();
        assert_eq!(text_rx.recv().unwrap(), "x - y");

        // Unchanged text isn't forwarded again
        notify_tx.send(()).unwrap();
        drop(notify_tx);
        handle.join().unwrap().unwrap();
        assert!(text_rx.try_recv().is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("zslice-watch-missing.txt");
        let (_notify_tx, notify_rx) = unbounded();
        let (text_tx, _text_rx) = unbounded();
        assert!(file_watcher_thread(&path, notify_rx, text_tx).is_err());
    }
}
