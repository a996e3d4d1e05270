use std::io::BufRead;
use std::sync::mpsc;

/// Stdin-driven console.
///
/// Spawns a background thread that blocks on stdin and forwards each line to
/// the event-loop thread over a channel. This is how numeric pose edits
/// enter the panel; see [`backend`](super::backend) for the command set.
pub struct Console {
    rx: mpsc::Receiver<String>,
    _thread: std::thread::JoinHandle<()>,
}

impl Console {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<String>();

        let handle = std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            rx,
            _thread: handle,
        }
    }

    /// Drain all currently queued lines without blocking.
    pub fn try_recv_all(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            out.push(line);
        }
        out
    }
}
