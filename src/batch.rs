//! The ordered list of images for one run and what happens between sessions.

use std::io::Write;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::output::LandmarkWriter;
use crate::session::{Outcome, Session};

/// Where the images of a run come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Single(PathBuf),
    Directory(PathBuf),
}

impl Source {
    pub fn images(&self) -> Result<Vec<PathBuf>> {
        match self {
            Source::Single(path) => Ok(vec![path.clone()]),
            Source::Directory(dir) => list_images(dir),
        }
    }
}

/// Regular, non-hidden files of `dir`, sorted by file name.
///
/// Subdirectories and dotfiles (`.DS_Store` and the like) are skipped rather
/// than failing the run at image load.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(entry.path());
    }
    if files.is_empty() {
        return Err(Error::EmptyDirectory(dir.to_path_buf()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Name written in the first column of a row.
pub fn image_name(path: &Path) -> String {
    path.display().to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub completed: usize,
    pub skipped: usize,
    pub aborted: bool,
}

impl Summary {
    /// 0 when every image was completed or skipped, 1 when the run was aborted.
    pub fn exit_code(&self) -> u8 {
        if self.aborted {
            1
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Batch<F: Write, E: Write> {
    images: Vec<PathBuf>,
    position: usize,
    writer: LandmarkWriter<F, E>,
    summary: Summary,
}

impl<F: Write, E: Write> Batch<F, E> {
    pub fn new(images: Vec<PathBuf>, writer: LandmarkWriter<F, E>) -> Self {
        log::info!("{} image(s) queued", images.len());
        Self {
            images,
            position: 0,
            writer,
            summary: Summary::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Zero-based position of the current image.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&Path> {
        if self.summary.aborted {
            return None;
        }
        self.images.get(self.position).map(PathBuf::as_path)
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn writer(&self) -> &LandmarkWriter<F, E> {
        &self.writer
    }

    /// Records the outcome of the current image's session and moves on.
    ///
    /// A completed session is written out; an aborted one stops the run.
    pub fn finish(&mut self, session: &Session) -> Result<Flow> {
        let Some(path) = self.images.get(self.position) else {
            return Ok(Flow::Stop);
        };
        let name = image_name(path);
        match session.outcome() {
            Some(Outcome::Completed) => {
                self.writer.write_record(&name, session.landmarks())?;
                self.summary.completed += 1;
                log::info!(
                    "{name}: saved {} landmark(s)",
                    session.landmarks().set_count()
                );
            }
            Some(Outcome::Skipped) => {
                self.summary.skipped += 1;
                log::info!("{name}: skipped");
            }
            Some(Outcome::Aborted) | None => {
                self.summary.aborted = true;
                log::warn!("{name}: aborted, nothing saved");
                return Ok(Flow::Stop);
            }
        }
        self.position += 1;
        if self.position < self.images.len() {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Stop)
        }
    }

    pub fn into_writer(self) -> LandmarkWriter<F, E> {
        self.writer
    }

    /// Marks the run aborted when it stops before every image was handled.
    pub fn abort(&mut self) {
        if self.position < self.images.len() {
            self.summary.aborted = true;
        }
    }
}
