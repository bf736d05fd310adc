//! Provider bootstrap.
//!
//! Loading validates the request and reads the basemap on a worker thread;
//! the UI loop polls the returned [`LoaderHandle`] each frame.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::Library;
use crate::data;
use crate::map::Basemap;

/// Why the provider failed to bootstrap. Terminal for the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkLoadError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("required library `{0}` was not requested")]
    MissingLibrary(&'static str),
    #[error("failed to load basemap {path}: {reason}")]
    Basemap { path: String, reason: String },
    #[error("{0}")]
    Provider(String),
}

/// Bootstrap parameters
#[derive(Clone, Debug)]
pub struct LoaderRequest {
    pub api_key: String,
    pub libraries: Vec<Library>,
    /// Directory of GeoJSON layers; `None` uses the built-in outline
    pub basemap_dir: Option<PathBuf>,
}

impl LoaderRequest {
    const REQUIRED: [Library; 2] = [Library::Drawing, Library::Geometry];
}

/// Load synchronously on the calling thread
pub fn load(request: &LoaderRequest) -> Result<Basemap, SdkLoadError> {
    if request.api_key.trim().is_empty() {
        return Err(SdkLoadError::MissingApiKey);
    }
    if let Some(missing) = LoaderRequest::REQUIRED
        .iter()
        .find(|lib| !request.libraries.contains(lib))
    {
        return Err(SdkLoadError::MissingLibrary(missing.name()));
    }

    match &request.basemap_dir {
        Some(dir) => data::load_basemap(dir).map_err(|e| SdkLoadError::Basemap {
            path: dir.display().to_string(),
            reason: format!("{e:#}"),
        }),
        None => Ok(data::simple_world()),
    }
}

/// Start loading on a worker thread
pub fn spawn(request: LoaderRequest) -> LoaderHandle {
    let (tx, rx) = mpsc::channel();
    let worker_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("sdk-loader".into())
        .spawn(move || {
            let result = load(&request);
            // Receiver gone means the app already quit
            let _ = worker_tx.send(result);
        });

    if let Err(e) = spawned {
        let _ = tx.send(Err(SdkLoadError::Provider(format!(
            "could not start loader: {e}"
        ))));
    }

    LoaderHandle { rx, finished: false }
}

/// Receiving end of a running bootstrap
pub struct LoaderHandle {
    rx: Receiver<Result<Basemap, SdkLoadError>>,
    finished: bool,
}

impl LoaderHandle {
    /// Returns the outcome exactly once, `None` while loading or afterwards
    pub fn poll(&mut self) -> Option<Result<Basemap, SdkLoadError>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(SdkLoadError::Provider(
                    "loader exited without reporting".into(),
                )))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn request() -> LoaderRequest {
        LoaderRequest {
            api_key: "test-key".into(),
            libraries: vec![Library::Drawing, Library::Geometry],
            basemap_dir: None,
        }
    }

    #[test]
    fn test_missing_api_key() {
        let req = LoaderRequest {
            api_key: "  ".into(),
            ..request()
        };
        assert_eq!(load(&req).err(), Some(SdkLoadError::MissingApiKey));
    }

    #[test]
    fn test_missing_library() {
        let req = LoaderRequest {
            libraries: vec![Library::Drawing],
            ..request()
        };
        let err = load(&req).err();
        assert_eq!(err, Some(SdkLoadError::MissingLibrary("geometry")));
        assert_eq!(
            err.map(|e| e.to_string()).as_deref(),
            Some("required library `geometry` was not requested")
        );
    }

    #[test]
    fn test_missing_basemap_dir() {
        let req = LoaderRequest {
            basemap_dir: Some(PathBuf::from("/nonexistent/area-calc-basemap")),
            ..request()
        };
        assert!(matches!(load(&req), Err(SdkLoadError::Basemap { .. })));
    }

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = SdkLoadError::Provider("quota exceeded".into());
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_spawned_loader_reports_once() {
        let mut handle = spawn(request());
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(result) = handle.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "loader timed out");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(result.is_ok_and(|basemap| basemap.has_data()));
        assert!(handle.is_finished());
        assert!(handle.poll().is_none());
    }
}
