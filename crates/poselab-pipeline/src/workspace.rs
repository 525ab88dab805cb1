//! Per-request temporary workspace lifecycle.
//!
//! # Design
//! - Every request owns a uniquely named input tree (with an image
//!   subdirectory) and output tree; concurrent requests never share paths.
//! - Partial allocation failures remove whatever was already created.
//! - `cleanup` is idempotent and runs from one control point in the
//!   orchestrator; `Drop` is a backstop for unexpected exits.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::{StageError, StageResult};

const INPUT_PREFIX: &str = "poselab-input-";
const OUTPUT_PREFIX: &str = "poselab-output-";
const IMAGE_DIR_NAME: &str = "images";

/// Isolated temporary directories owned by one pipeline request.
#[derive(Debug)]
pub struct Workspace {
    token: Uuid,
    input_dir: PathBuf,
    image_dir: PathBuf,
    output_dir: PathBuf,
    cleaned: bool,
}

impl Workspace {
    /// Allocate a fresh workspace under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when any directory cannot be created; directories
    /// already created for this workspace are removed first.
    pub fn allocate(root: &Path) -> StageResult<Self> {
        Self::allocate_with_token(root, Uuid::new_v4())
    }

    fn allocate_with_token(root: &Path, token: Uuid) -> StageResult<Self> {
        let input_dir = root.join(format!("{INPUT_PREFIX}{token}"));
        let image_dir = input_dir.join(IMAGE_DIR_NAME);
        let output_dir = root.join(format!("{OUTPUT_PREFIX}{token}"));

        for dir in [&input_dir, &image_dir, &output_dir] {
            if let Err(source) = fs::create_dir_all(dir) {
                remove_quietly(&input_dir);
                remove_quietly(&output_dir);
                return Err(StageError::resource("workspace.create", dir, source));
            }
        }

        Ok(Self {
            token,
            input_dir,
            image_dir,
            output_dir,
            cleaned: false,
        })
    }

    /// Collision-resistant token naming this workspace.
    #[must_use]
    pub const fn token(&self) -> Uuid {
        self.token
    }

    /// Directory holding the materialised input file.
    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory the frame extractor writes still images into.
    #[must_use]
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Directory the reconstruction process writes artifacts into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Location for the packaged archive, outside the archived tree.
    #[must_use]
    pub fn archive_target(&self) -> PathBuf {
        self.input_dir.join("poses.zip")
    }

    /// Remove both workspace trees.
    ///
    /// Idempotent: repeated calls and partially missing trees are fine.
    ///
    /// # Errors
    ///
    /// Returns an error when removal fails for a reason other than the tree
    /// already being gone.
    pub fn cleanup(&mut self) -> StageResult<()> {
        self.cleaned = true;
        remove_tree(&self.input_dir)?;
        remove_tree(&self.output_dir)?;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.cleaned {
            remove_quietly(&self.input_dir);
            remove_quietly(&self.output_dir);
        }
    }
}

fn remove_tree(path: &Path) -> StageResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StageError::resource("workspace.remove", path, source)),
    }
}

fn remove_quietly(path: &Path) {
    if let Err(error) = remove_tree(path) {
        warn!(path = %path.display(), error = %error, "workspace removal failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    #[test]
    fn allocate_creates_all_three_directories() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let workspace = Workspace::allocate(root.path())?;
        assert!(workspace.input_dir().is_dir());
        assert!(workspace.image_dir().is_dir());
        assert!(workspace.output_dir().is_dir());
        assert!(workspace.image_dir().starts_with(workspace.input_dir()));
        Ok(())
    }

    #[test]
    fn allocations_never_collide() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let first = Workspace::allocate(root.path())?;
        let second = Workspace::allocate(root.path())?;
        assert_ne!(first.input_dir(), second.input_dir());
        assert_ne!(first.output_dir(), second.output_dir());
        Ok(())
    }

    #[test]
    fn partial_allocation_failure_rolls_back_created_directories() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let token = Uuid::new_v4();
        // A regular file squatting on the output path makes the last
        // create_dir_all fail after the input tree already exists.
        let blocker = root.path().join(format!("{OUTPUT_PREFIX}{token}"));
        fs::write(&blocker, b"squatter")?;

        let result = Workspace::allocate_with_token(root.path(), token);
        assert!(matches!(result, Err(StageError::Resource { .. })));

        let entries: Vec<_> = fs::read_dir(root.path())?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path(), blocker);
        Ok(())
    }

    #[test]
    fn blocked_input_path_fails_with_no_side_effects() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let token = Uuid::new_v4();
        let blocker = root.path().join(format!("{INPUT_PREFIX}{token}"));
        fs::write(&blocker, b"squatter")?;

        let result = Workspace::allocate_with_token(root.path(), token);
        assert!(matches!(result, Err(StageError::Resource { .. })));
        assert_eq!(fs::read_dir(root.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn cleanup_removes_trees_and_is_idempotent() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let mut workspace = Workspace::allocate(root.path())?;
        fs::write(workspace.image_dir().join("frame_00000.png"), b"png")?;
        let input = workspace.input_dir().to_path_buf();
        let output = workspace.output_dir().to_path_buf();

        workspace.cleanup()?;
        assert!(!input.exists());
        assert!(!output.exists());

        workspace.cleanup()?;
        Ok(())
    }

    #[test]
    fn drop_removes_unreleased_workspace() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let input = {
            let workspace = Workspace::allocate(root.path())?;
            workspace.input_dir().to_path_buf()
        };
        assert!(!input.exists());
        Ok(())
    }

    #[test]
    fn archive_target_sits_outside_the_output_tree() -> Result<(), Box<dyn Error>> {
        let root = TempDir::new()?;
        let workspace = Workspace::allocate(root.path())?;
        assert!(!workspace.archive_target().starts_with(workspace.output_dir()));
        Ok(())
    }
}
