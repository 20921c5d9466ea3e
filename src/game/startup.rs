// Startup phases and the background scene loader.

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};

use super::scene::{SceneError, SceneGraph, load_gltf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppPhase {
    /// Scene is loading on the worker thread.
    Loading,
    /// Loading failed; the loading screen stays up with this message.
    LoadFailed(String),
    /// Loaded, waiting for the enter gesture.
    Ready,
    /// Simulation running.
    Running,
}

impl AppPhase {
    /// Phase after the loader reports back.
    pub fn loaded<T>(self, result: &Result<T, SceneError>) -> AppPhase {
        match (self, result) {
            (AppPhase::Loading, Ok(_)) => AppPhase::Ready,
            (AppPhase::Loading, Err(e)) => AppPhase::LoadFailed(e.to_string()),
            (phase, _) => phase,
        }
    }

    /// Phase after the enter gesture. Only leaves `Ready`.
    pub fn entered(self) -> AppPhase {
        match self {
            AppPhase::Ready => AppPhase::Running,
            phase => phase,
        }
    }

    pub fn is_running(&self) -> bool {
        *self == AppPhase::Running
    }
}

/// One-shot loader handing its scene back over a channel.
pub struct SceneLoader {
    rx: Receiver<Result<SceneGraph, SceneError>>,
}

impl SceneLoader {
    /// Load a glTF scene on a worker thread.
    pub fn spawn(path: PathBuf) -> Self {
        Self::spawn_with(move || {
            log::info!("loading scene {}", path.display());
            load_gltf(&path)
        })
    }

    pub fn spawn_with<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<SceneGraph, SceneError> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            // The receiver may be gone if the window closed mid-load.
            let _ = tx.send(load());
        });
        Self { rx }
    }

    /// The loader's result once it is available.
    pub fn poll(&self) -> Option<Result<SceneGraph, SceneError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SceneError::LoaderExited)),
        }
    }

    /// Block until the loader reports.
    pub fn wait(&self) -> Result<SceneGraph, SceneError> {
        self.rx.recv().unwrap_or(Err(SceneError::LoaderExited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        let ok: Result<(), SceneError> = Ok(());
        let failed: Result<(), SceneError> = Err(SceneError::MissingNode("Character".into()));

        assert_eq!(AppPhase::Loading.entered(), AppPhase::Loading);
        assert_eq!(AppPhase::Loading.loaded(&ok), AppPhase::Ready);
        assert_eq!(AppPhase::Ready.entered(), AppPhase::Running);
        assert_eq!(AppPhase::Running.loaded(&failed), AppPhase::Running);

        let phase = AppPhase::Loading.loaded(&failed);
        assert!(matches!(phase, AppPhase::LoadFailed(ref m) if m.contains("Character")));
        assert_eq!(phase.clone().entered(), phase);
    }

    #[test]
    fn loader_hands_back_its_scene() {
        let loader = SceneLoader::spawn_with(|| {
            let mut g = SceneGraph::new();
            g.add_node("Character", None, Default::default());
            Ok(g)
        });
        let scene = loader.wait().unwrap();
        assert!(scene.find("Character").is_some());
    }

    #[test]
    fn panicking_loader_reports_exit() {
        let loader = SceneLoader::spawn_with(|| panic!("decoder blew up"));
        assert!(matches!(loader.wait(), Err(SceneError::LoaderExited)));
        assert!(matches!(loader.poll(), Some(Err(SceneError::LoaderExited))));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let loader = SceneLoader::spawn(PathBuf::from("does/not/exist.glb"));
        assert!(matches!(loader.wait(), Err(SceneError::Gltf(_))));
    }
}
