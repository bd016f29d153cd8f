//! Shared test utilities: throwaway project trees, synthetic images, and
//! modification-time control.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let project = TestProject::new();
//! project.add_source("sunset.jpg");
//! let report = optimize_with_backend(&backend, &project.config, &project.paths(), options, None);
//! assert_eq!(project.variant_names("sunset").len(), 32);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::config::PipelineConfig;
use crate::optimize::RunPaths;

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a small valid JPEG with a gradient pattern.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid RGBA PNG.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Modification times
// =========================================================================

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

/// A point in time `secs` seconds ago.
pub fn ago(secs: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(secs)
}

// =========================================================================
// Project tree
// =========================================================================

/// A temporary project with the default `public/images` layout.
pub struct TestProject {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl TestProject {
    /// Project with default paths and a short width list so tests stay fast.
    pub fn new() -> Self {
        let mut config = PipelineConfig::default();
        config.generator.widths = vec![96, 320, 1280];
        config.resolver.widths = vec![96, 320];
        config.processing.max_processes = Some(2);
        let project = Self {
            dir: TempDir::new().unwrap(),
            config,
        };
        std::fs::create_dir_all(project.input_dir()).unwrap();
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.config.input_dir(self.root())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir(self.root())
    }

    pub fn paths(&self) -> RunPaths {
        RunPaths {
            input_dir: self.input_dir(),
            output_dir: self.output_dir(),
        }
    }

    /// Create a placeholder source file (contents irrelevant to the mock backend).
    pub fn add_source(&self, name: &str) -> PathBuf {
        let path = self.input_dir().join(name);
        std::fs::write(&path, b"source").unwrap();
        path
    }

    /// Create a file directly in the output directory.
    pub fn add_output(&self, name: &str) -> PathBuf {
        std::fs::create_dir_all(self.output_dir()).unwrap();
        let path = self.output_dir().join(name);
        std::fs::write(&path, b"variant").unwrap();
        path
    }

    /// Sorted names of every file in the output directory that starts with
    /// `{stem}-`.
    pub fn variant_names(&self, stem: &str) -> Vec<String> {
        let prefix = format!("{stem}-");
        let mut names: Vec<String> = match std::fs::read_dir(self.output_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with(&prefix))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Sorted names of every file in the output directory.
    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
