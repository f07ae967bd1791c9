//! One-shot background model loading
//!
//! A [`ModelRequest`] reads and parses a model on its own thread and reports
//! back over an `mpsc` channel. The frame loop drains events with
//! [`ModelRequest::poll`], which never blocks. There is no cancellation:
//! dropping the request abandons the result and the worker finishes into a
//! closed channel.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use super::{AssetError, ObjLoader};
use crate::render::Mesh;

const READ_CHUNK: usize = 64 * 1024;

/// Where the model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// OBJ file on disk
    File(PathBuf),
    /// OBJ text already in memory
    Inline(String),
}

impl ModelSource {
    fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline(text) => format!("<inline, {} bytes>", text.len()),
        }
    }
}

/// Progress and completion reports of a request
#[derive(Debug)]
pub enum ModelEvent {
    /// Bytes read so far out of the total
    Progress {
        /// Bytes read
        loaded: u64,
        /// Total bytes
        total: u64,
    },
    /// The model parsed successfully
    Loaded(Mesh),
    /// Reading or parsing failed
    Failed(AssetError),
}

impl ModelEvent {
    /// True for `Loaded` and `Failed`
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Handle to a model load running on a worker thread
pub struct ModelRequest {
    receiver: Receiver<ModelEvent>,
    finished: bool,
}

impl ModelRequest {
    /// Start loading `source` on a new thread
    pub fn spawn(source: ModelSource) -> Result<Self, AssetError> {
        let (sender, receiver) = mpsc::channel();
        log::info!("Loading model from {}", source.describe());

        thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || run_worker(source, &sender))?;

        Ok(Self {
            receiver,
            finished: false,
        })
    }

    /// Next pending event, if any. After the final event this always
    /// returns `None`.
    pub fn poll(&mut self) -> Option<ModelEvent> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => {
                self.finished = event.is_final();
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(ModelEvent::Failed(AssetError::WorkerLost))
            }
        }
    }

    /// True once the final event was delivered
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

fn run_worker(source: ModelSource, sender: &Sender<ModelEvent>) {
    let event = match load(&source, sender) {
        Ok(mesh) => ModelEvent::Loaded(mesh),
        Err(err) => ModelEvent::Failed(err),
    };
    // The request may have been dropped; nobody is listening then
    let _ = sender.send(event);
}

fn load(source: &ModelSource, sender: &Sender<ModelEvent>) -> Result<Mesh, AssetError> {
    let text = match source {
        ModelSource::File(path) => read_with_progress(path, sender)?,
        ModelSource::Inline(text) => {
            let total = text.len() as u64;
            let _ = sender.send(ModelEvent::Progress { loaded: total, total });
            text.clone()
        }
    };
    ObjLoader::parse(&text)
}

fn read_with_progress(path: &Path, sender: &Sender<ModelEvent>) -> Result<String, AssetError> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        let _ = sender.send(ModelEvent::Progress {
            loaded: bytes.len() as u64,
            total,
        });
    }

    String::from_utf8(bytes).map_err(|_| AssetError::InvalidFormat(format!("{} is not UTF-8 text", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_final(request: &mut ModelRequest) -> Vec<ModelEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            while let Some(event) = request.poll() {
                events.push(event);
            }
            if request.is_finished() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_inline_source_loads() {
        let mut request = ModelRequest::spawn(ModelSource::Inline("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_string()))
            .expect("worker should start");
        let events = wait_for_final(&mut request);

        assert!(matches!(events.first(), Some(ModelEvent::Progress { .. })));
        match events.last() {
            Some(ModelEvent::Loaded(mesh)) => assert_eq!(mesh.triangle_count(), 1),
            other => panic!("Expected Loaded, got {:?}", other),
        }
        assert!(request.poll().is_none(), "No events after the final one");
    }

    #[test]
    fn test_missing_file_fails_once() {
        let mut request = ModelRequest::spawn(ModelSource::File(PathBuf::from("/nonexistent/globe.obj")))
            .expect("worker should start");
        let events = wait_for_final(&mut request);

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ModelEvent::Failed(AssetError::Io(_))));
    }

    #[test]
    fn test_file_progress_reaches_total() {
        let path = std::env::temp_dir().join(format!("globe_engine_model_{}.obj", std::process::id()));
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut request = ModelRequest::spawn(ModelSource::File(path.clone())).expect("worker should start");
        let events = wait_for_final(&mut request);
        let _ = std::fs::remove_file(&path);

        let last_progress = events.iter().rev().find_map(|event| match event {
            ModelEvent::Progress { loaded, total } => Some((*loaded, *total)),
            _ => None,
        });
        let (loaded, total) = last_progress.expect("file reads report progress");
        assert_eq!(loaded, total);
        assert!(matches!(events.last(), Some(ModelEvent::Loaded(_))));
    }
}
