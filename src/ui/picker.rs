//! Image attachment flow: permission probing, the camera/gallery choice, and
//! binding the result into the single preview slot.
//!
//! Each pending step is its own typed state (permission prompt, source
//! choice, gallery listing) held by the controller's modal mode, so the flow
//! reads as an explicit state machine: idle, awaiting permission, awaiting a
//! capture or pick, then back to idle. A cancelled or failed external step
//! leaves the preview slot untouched.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use directories::UserDirs;
use tracing::{info, warn};

/// External tool used to take a photo. Invoked with the output path as its
/// only argument and expected to write a JPEG there.
pub(crate) const CAPTURE_COMMAND: &str = "fswebcam";

/// File extensions the gallery listing treats as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Capability grants the upload action depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capability {
    /// The pictures directory exists and is readable.
    ReadMedia,
    /// A capture tool is resolvable on PATH.
    Camera,
}

impl Capability {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Capability::ReadMedia => "read access to your pictures",
            Capability::Camera => "a camera capture tool",
        }
    }
}

/// Resolve the directory captures land in and the gallery reads from.
pub(crate) fn media_dir() -> Result<PathBuf> {
    let user_dirs = UserDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    match user_dirs.picture_dir() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Ok(user_dirs.home_dir().join("Pictures")),
    }
}

/// Check whether an executable with the given name is reachable via PATH.
pub(crate) fn command_available(name: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}

/// Probe both grants. An empty result means the source choice can be offered
/// straight away.
pub(crate) fn probe(media_dir: &Path, camera_ok: bool) -> Vec<Capability> {
    let mut missing = Vec::new();
    if fs::read_dir(media_dir).is_err() {
        missing.push(Capability::ReadMedia);
    }
    if !camera_ok {
        missing.push(Capability::Camera);
    }
    missing
}

/// Result of asking the user to grant the missing capabilities.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum GrantOutcome {
    Granted,
    Denied,
}

/// Modal state while the flow waits on a permission decision.
pub(crate) struct PermissionPrompt {
    pub(crate) missing: Vec<Capability>,
}

impl PermissionPrompt {
    pub(crate) fn new(missing: Vec<Capability>) -> Self {
        Self { missing }
    }

    /// One-line description of what is being requested.
    pub(crate) fn describe(&self) -> String {
        let labels: Vec<&str> = self.missing.iter().map(Capability::label).collect();
        format!("This action needs {}.", labels.join(" and "))
    }

    /// Attempt to satisfy the missing grants. A missing pictures directory
    /// can be created on the spot; a missing capture tool cannot, so the
    /// outcome is a denial and the flow returns to idle.
    pub(crate) fn grant(&self, media_dir: &Path, camera_ok: bool) -> GrantOutcome {
        if self.missing.contains(&Capability::ReadMedia) {
            if let Err(err) = fs::create_dir_all(media_dir) {
                warn!(%err, "could not create pictures directory");
            }
        }
        if probe(media_dir, camera_ok).is_empty() {
            GrantOutcome::Granted
        } else {
            GrantOutcome::Denied
        }
    }
}

/// The two image sources offered once permissions are in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickSource {
    Camera,
    Gallery,
}

/// Modal state for the binary camera/gallery choice.
pub(crate) struct SourceChoice {
    pub(crate) selection: PickSource,
}

impl SourceChoice {
    pub(crate) fn new() -> Self {
        Self {
            selection: PickSource::Camera,
        }
    }

    pub(crate) fn toggle(&mut self) {
        self.selection = match self.selection {
            PickSource::Camera => PickSource::Gallery,
            PickSource::Gallery => PickSource::Camera,
        };
    }

    pub(crate) fn labels(&self) -> [&'static str; 2] {
        ["Camera", "Gallery"]
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            PickSource::Camera => 0,
            PickSource::Gallery => 1,
        }
    }
}

/// Modal state for picking an existing image out of the pictures directory.
pub(crate) struct GalleryState {
    pub(crate) entries: Vec<PathBuf>,
    pub(crate) selected: usize,
}

impl GalleryState {
    /// List the image files in the pictures directory, sorted by name.
    pub(crate) fn load(media_dir: &Path) -> Result<Self> {
        let mut entries: Vec<PathBuf> = fs::read_dir(media_dir)
            .context("failed to read pictures directory")?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_image_file(path))
            .collect();
        entries.sort();
        Ok(Self {
            entries,
            selected: 0,
        })
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let next = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub(crate) fn current(&self) -> Option<&PathBuf> {
        self.entries.get(self.selected)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Launch the capture tool against a uniquely named file, timestamped to the
/// second. `Ok(None)` means the capture was cancelled or produced nothing;
/// the caller leaves the preview slot as it was.
pub(crate) fn capture_photo(media_dir: &Path, command: &str) -> Result<Option<PathBuf>> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = media_dir.join(format!("IMG_{stamp}.jpg"));

    let status = Command::new(command)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch {command}"))?;

    if status.success() && path.is_file() {
        info!(path = %path.display(), "photo captured");
        Ok(Some(path))
    } else {
        warn!(code = ?status.code(), "capture exited without an image");
        Ok(None)
    }
}

/// Where a previewed image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageSource {
    Camera,
    Gallery,
}

impl ImageSource {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            ImageSource::Camera => "camera",
            ImageSource::Gallery => "gallery",
        }
    }
}

/// Contents of the single attachment preview slot. Not persisted and not
/// linked to any entry; replaced wholesale when another image is picked.
pub(crate) struct ImagePreview {
    pub(crate) path: PathBuf,
    pub(crate) source: ImageSource,
    pub(crate) size_bytes: u64,
}

impl ImagePreview {
    pub(crate) fn bind(path: PathBuf, source: ImageSource) -> Result<Self> {
        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        Ok(Self {
            path,
            source,
            size_bytes,
        })
    }

    pub(crate) fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
