// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use anyhow::{bail, Context, Result};
use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conversion::{convert, to_yolo_text, ClassList};
use crate::detection::{Detect, TwoStageDetector};
use crate::types::{is_image_file, ProcessingStats, ANNOTATION_EXTENSION, LABEL_EXTENSION};
use crate::utils::{create_progress_bar, ensure_output_directory};
use crate::voc::read_voc;

/// Read the ordered class list, one name per line.
pub fn load_class_list(path: &Path) -> Result<ClassList> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read class list {}", path.display()))?;
    let classes = ClassList::from_lines(&text);
    info!("Loaded {} classes from {}", classes.len(), path.display());
    Ok(classes)
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Convert one VOC file into `<output_dir>/<stem>.txt`.
///
/// Nothing is written when the record fails to parse or convert.
pub fn convert_file(
    xml_path: &Path,
    output_dir: &Path,
    classes: &ClassList,
    allow_list: Option<&[String]>,
    precision: Option<usize>,
) -> Result<PathBuf> {
    let record = read_voc(xml_path)?;
    let lines = convert(&record, classes, allow_list)
        .with_context(|| format!("failed to convert {}", xml_path.display()))?;

    let stem = xml_path
        .file_stem()
        .with_context(|| format!("{} has no file name", xml_path.display()))?;
    let out_path = output_dir.join(format!("{}.{}", stem.to_string_lossy(), LABEL_EXTENSION));
    fs::write(&out_path, to_yolo_text(&lines, precision))
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    debug!(
        "{} -> {} ({} boxes)",
        xml_path.display(),
        out_path.display(),
        lines.len()
    );
    Ok(out_path)
}

/// Convert every `.xml` file of `input_dir`. A failing file is logged and
/// counted, the rest of the batch still runs.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    classes: &ClassList,
    allow_list: Option<&[String]>,
    precision: Option<usize>,
) -> Result<ProcessingStats> {
    ensure_output_directory(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let files: Vec<PathBuf> = list_files(input_dir)?
        .into_iter()
        .filter(|p| has_extension(p, ANNOTATION_EXTENSION))
        .collect();

    let mut stats = ProcessingStats::new();
    let pb = create_progress_bar(files.len() as u64, "Converting");
    for path in &files {
        stats.increment_total();
        match convert_file(path, output_dir, classes, allow_list, precision) {
            Ok(_) => stats.increment_successful(),
            Err(e) => {
                error!("Skipping {}: {:#}", path.display(), e);
                stats.increment_failed();
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(stats)
}

/// Number of label files in `output_dir`.
pub fn count_label_files(output_dir: &Path) -> Result<usize> {
    Ok(list_files(output_dir)?
        .iter()
        .filter(|p| has_extension(p, LABEL_EXTENSION))
        .count())
}

/// Annotate one image and save it under its own file name in `output_dir`.
pub fn annotate_file(
    image_path: &Path,
    output_dir: &Path,
    detector: &TwoStageDetector,
    person_model: &mut dyn Detect,
    ppe_model: &mut dyn Detect,
) -> Result<PathBuf> {
    let image = image::open(image_path)
        .with_context(|| format!("failed to open {}", image_path.display()))?;
    let canvas = detector.annotate(image, person_model, ppe_model)?;

    let name = image_path
        .file_name()
        .with_context(|| format!("{} has no file name", image_path.display()))?;
    let out_path = output_dir.join(name);
    canvas
        .save(&out_path)
        .with_context(|| format!("failed to save {}", out_path.display()))?;
    Ok(out_path)
}

/// Run the two-stage detector over every image of `input_dir`. Files with
/// other extensions are skipped; a failing image is logged and counted.
pub fn annotate_directory(
    input_dir: &Path,
    output_dir: &Path,
    detector: &TwoStageDetector,
    person_model: &mut dyn Detect,
    ppe_model: &mut dyn Detect,
) -> Result<ProcessingStats> {
    ensure_output_directory(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let files = list_files(input_dir)?;
    let mut stats = ProcessingStats::new();
    let pb = create_progress_bar(files.len() as u64, "Detecting");

    for path in &files {
        stats.increment_total();
        if !is_image_file(path) {
            debug!("Not an image, skipping {}", path.display());
            stats.increment_skipped();
            pb.inc(1);
            continue;
        }

        match annotate_file(path, output_dir, detector, person_model, ppe_model) {
            Ok(out) => {
                debug!("Saved {}", out.display());
                stats.increment_successful();
            }
            Err(e) => {
                error!("Failed on {}: {:#}", path.display(), e);
                stats.increment_failed();
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.xml", "a.xml", "c.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml", "c.txt"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(list_files(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_load_class_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classes.txt");
        fs::write(&path, "hard-hat\ngloves\n").unwrap();

        let classes = load_class_list(&path).unwrap();
        assert_eq!(classes.index_of("gloves"), Some(1));
        assert!(load_class_list(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_has_extension_ignores_case() {
        assert!(has_extension(Path::new("a.XML"), "xml"));
        assert!(!has_extension(Path::new("a.json"), "xml"));
        assert!(!has_extension(Path::new("xml"), "xml"));
    }
}
