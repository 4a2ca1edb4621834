//! Output layout for an accepted decision.
//!
//! A commit produces two files under the base output directory:
//!
//! ```text
//! <base>/archive/<original file name>      byte-identical copy of the source
//! <base>/<category>/IMG_YYYYMMDD_HHMMSS.jpg rendered phone-style JPEG
//! ```
//!
//! Either both exist afterwards or neither was created by this commit.

use chrono::{Local, NaiveDateTime};
use rand::Rng;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::processor::{persist, staging_file, write_atomic, ImageProcessor};
use crate::types::{Category, Committed, EffectConfig};

/// Folder holding untouched copies of accepted sources.
pub const ARCHIVE_DIR: &str = "archive";

/// `strftime` layout of rendered output names.
pub const OUTPUT_NAME_FORMAT: &str = "IMG_%Y%m%d_%H%M%S.jpg";

/// Source of timestamps for output names.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Commits accepted images into the archive and category folders.
pub struct ArchiveCoordinator {
    processor: ImageProcessor,
    clock: Clock,
}

impl ArchiveCoordinator {
    /// Coordinator naming outputs from the local wall clock.
    pub fn new(processor: ImageProcessor) -> Self {
        Self::with_clock(processor, Arc::new(|| Local::now().naive_local()))
    }

    pub fn with_clock(processor: ImageProcessor, clock: Clock) -> Self {
        Self { processor, clock }
    }

    /// Output file name for an image produced at `at`.
    ///
    /// Names have one-second resolution. Two outputs in the same category
    /// within the same second share a name and the later one overwrites.
    pub fn output_file_name(at: NaiveDateTime) -> String {
        at.format(OUTPUT_NAME_FORMAT).to_string()
    }

    /// Archive `source` and render it into `base_dir/<category>`.
    pub fn commit<R: Rng + ?Sized>(
        &self,
        source: &Path,
        base_dir: &Path,
        category: Category,
        effects: &EffectConfig,
        rng: &mut R,
    ) -> PipelineResult<Committed> {
        let file_name = match source.file_name() {
            Some(name) if source.is_file() => name.to_owned(),
            _ => return Err(PipelineError::FileNotFound(source.to_path_buf())),
        };

        let archive_dir = base_dir.join(ARCHIVE_DIR);
        let category_dir = base_dir.join(category.dir_name());
        for dir in [&archive_dir, &category_dir] {
            fs::create_dir_all(dir).map_err(|e| PipelineError::write(dir, e))?;
        }

        let archived = archive_dir.join(&file_name);
        // Dropping the staged copy on any early return deletes it.
        let mut staged = staging_file(&archived)?;
        fs::File::open(source)
            .and_then(|mut f| std::io::copy(&mut f, staged.as_file_mut()))
            .map_err(|e| PipelineError::write(&archived, e))?;

        let rendered = self.processor.render(source, effects, rng)?;
        persist(staged, &archived)?;

        let processed = category_dir.join(Self::output_file_name((self.clock)()));
        if processed.exists() {
            tracing::warn!("Overwriting {:?} (same-second output name)", processed);
        }
        if let Err(e) = write_atomic(&processed, &rendered.jpeg.bytes) {
            let _ = fs::remove_file(&archived);
            return Err(e);
        }

        tracing::info!(
            "{} {:?} -> {:?} (archived as {:?})",
            category,
            source,
            processed,
            archived
        );

        let report = rendered.report(source, &processed, effects);
        Ok(Committed {
            category,
            archived,
            processed,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metadata::MetadataExtractor;
    use chrono::NaiveDate;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn fixed_clock() -> Clock {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        Arc::new(move || at)
    }

    fn coordinator() -> ArchiveCoordinator {
        ArchiveCoordinator::with_clock(ImageProcessor::default(), fixed_clock())
    }

    fn write_png(dir: &Path, name: &str, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(24, 16, Rgb([shade, 90, 200]))
            .save(&path)
            .unwrap();
        path
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(rd) => rd
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    #[test]
    fn test_output_file_name() {
        let at = NaiveDate::from_ymd_opt(2023, 11, 2)
            .unwrap()
            .and_hms_opt(8, 9, 10)
            .unwrap();
        assert_eq!(
            ArchiveCoordinator::output_file_name(at),
            "IMG_20231102_080910.jpg"
        );
    }

    #[test]
    fn test_keep_archives_and_renders() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = write_png(src.path(), "beach.png", 30);

        let committed = coordinator()
            .commit(
                &source,
                out.path(),
                Category::Keep,
                &EffectConfig::default(),
                &mut StdRng::seed_from_u64(3),
            )
            .unwrap();

        assert_eq!(committed.archived, out.path().join("archive/beach.png"));
        assert_eq!(
            committed.processed,
            out.path().join("keep/IMG_20240309_140507.jpg")
        );
        assert_eq!(
            fs::read(&committed.archived).unwrap(),
            fs::read(&source).unwrap()
        );

        let exif = MetadataExtractor::extract(&committed.processed).unwrap();
        assert!(exif.camera_make.is_some());
        assert_eq!(entries(&out.path().join("archive")), vec!["beach.png"]);
        assert_eq!(
            entries(&out.path().join("keep")),
            vec!["IMG_20240309_140507.jpg"]
        );
    }

    #[test]
    fn test_modify_goes_to_modify_folder() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = write_png(src.path(), "street.png", 120);

        let committed = coordinator()
            .commit(
                &source,
                out.path(),
                Category::Modify,
                &EffectConfig::default(),
                &mut StdRng::seed_from_u64(4),
            )
            .unwrap();

        assert_eq!(committed.category, Category::Modify);
        assert!(committed.processed.starts_with(out.path().join("modify")));
        assert!(entries(&out.path().join("keep")).is_empty());
    }

    #[test]
    fn test_failed_render_leaves_no_files() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = src.path().join("broken.jpg");
        fs::write(&source, b"definitely not a jpeg").unwrap();

        let result = coordinator().commit(
            &source,
            out.path(),
            Category::Keep,
            &EffectConfig::default(),
            &mut StdRng::seed_from_u64(5),
        );

        assert!(matches!(result, Err(PipelineError::Decode { .. })));
        assert!(entries(&out.path().join("archive")).is_empty());
        assert!(entries(&out.path().join("keep")).is_empty());
    }

    #[test]
    fn test_missing_source() {
        let out = tempfile::tempdir().unwrap();
        let result = coordinator().commit(
            &out.path().join("gone.png"),
            out.path(),
            Category::Keep,
            &EffectConfig::default(),
            &mut StdRng::seed_from_u64(6),
        );
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
        assert!(!out.path().join("archive").exists());
    }

    #[test]
    fn test_same_second_outputs_collide() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let first = write_png(src.path(), "a.png", 10);
        let second = write_png(src.path(), "b.png", 240);
        let coordinator = coordinator();
        let effects = EffectConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let a = coordinator
            .commit(&first, out.path(), Category::Keep, &effects, &mut rng)
            .unwrap();
        let b = coordinator
            .commit(&second, out.path(), Category::Keep, &effects, &mut rng)
            .unwrap();

        // One-second name resolution: the second output replaces the first.
        assert_eq!(a.processed, b.processed);
        assert_eq!(entries(&out.path().join("archive")), vec!["a.png", "b.png"]);
        assert_eq!(entries(&out.path().join("keep")).len(), 1);
    }

    #[test]
    fn test_concurrent_same_second_commits_all_succeed() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let coordinator = coordinator();
        let sources: Vec<PathBuf> = (0..4u8)
            .map(|i| {
                let path = src.path().join(format!("shot{i}.png"));
                RgbImage::from_pixel(320, 240, Rgb([i * 60, 90, 200]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .enumerate()
                .map(|(i, source)| {
                    let coordinator = &coordinator;
                    let base = out.path();
                    scope.spawn(move || {
                        let mut rng = StdRng::seed_from_u64(i as u64);
                        (0..10)
                            .map(|_| {
                                coordinator.commit(
                                    source,
                                    base,
                                    Category::Keep,
                                    &EffectConfig::default(),
                                    &mut rng,
                                )
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                for result in handle.join().unwrap() {
                    result.unwrap();
                }
            }
        });

        assert_eq!(
            entries(&out.path().join("archive")),
            vec!["shot0.png", "shot1.png", "shot2.png", "shot3.png"]
        );
        assert_eq!(
            entries(&out.path().join("keep")),
            vec!["IMG_20240309_140507.jpg"]
        );
    }
}
