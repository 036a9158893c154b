//! Finalizer — closes out the last record and writes the deliverable file.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::AppError;
use crate::store::{Counterpart, Table, Winner};

/// Marks the last record as having no comparison: counterpart and every judge's
/// winner become "N/A". Scores are left alone.
pub fn finalize(table: &mut Table) -> Result<(), AppError> {
    if table.is_empty() {
        return Ok(());
    }
    let last = table.len() - 1;

    table.set_counterpart(last, Counterpart::NotApplicable)?;
    let judges = table.judges().to_vec();
    for judge in &judges {
        table.set_winner(last, judge, Winner::NotApplicable)?;
    }
    Ok(())
}

/// Writes the final layout to `output`. Refuses to overwrite the progress file.
pub fn write_output(table: &Table, output: &Path, progress: &Path) -> Result<(), AppError> {
    check_output_path(output, progress)?;
    table.to_final_sheet().write_atomic(output)?;
    info!("Final results saved to {}", output.display());
    Ok(())
}

/// Rejects an output path that names the progress file. Neither file has to exist yet.
pub fn check_output_path(output: &Path, progress: &Path) -> Result<(), AppError> {
    if same_file(output, progress) {
        return Err(AppError::Config(format!(
            "output path {} must differ from the progress file {}",
            output.display(),
            progress.display()
        )));
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Absolute form of `path`; for a file that does not exist yet, only its directory is resolved.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    dir.canonicalize().ok().map(|dir| dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sheet;

    fn table() -> Table {
        let sheet = Sheet {
            headers: vec!["first_last_name".into(), "Generated_Cover_Letter".into()],
            rows: vec![
                vec!["Kwame Diallo".into(), "Experienced Python dev...".into()],
                vec!["Mei Chen".into(), "Seasoned data engineer...".into()],
            ],
        };
        let judges = vec!["gemini".to_string(), "gpt".to_string()];
        Table::from_base(sheet, "Generated_Cover_Letter", &judges, Path::new("base.csv")).unwrap()
    }

    #[test]
    fn test_finalize_marks_last_record() {
        let mut table = table();
        table.set_score(1, "gemini", 72).unwrap();
        finalize(&mut table).unwrap();

        let last = table.record(1);
        assert_eq!(last.counterpart, Some(Counterpart::NotApplicable));
        assert!(last
            .results
            .iter()
            .all(|r| r.winner == Some(Winner::NotApplicable)));
        assert_eq!(last.results[0].score, 72);
        assert_eq!(table.record(0).counterpart, None);
    }

    #[test]
    fn test_finalize_empty_table_is_noop() {
        let sheet = Sheet {
            headers: vec!["Generated_Cover_Letter".into()],
            rows: vec![],
        };
        let mut table =
            Table::from_base(sheet, "Generated_Cover_Letter", &[], Path::new("base.csv")).unwrap();
        assert!(finalize(&mut table).is_ok());
    }

    #[test]
    fn test_write_output_uses_final_layout() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("final.csv");
        let mut table = table();
        table.set_counterpart(0, Counterpart::Record(2)).unwrap();
        finalize(&mut table).unwrap();

        write_output(&table, &output, &dir.path().join("progress.csv")).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "cv_1_id,cv_2_id,first_last_name,Generated_Cover_Letter,score~gemini,winner~gemini,score~gpt,winner~gpt"
        );
        assert!(lines.next().unwrap().starts_with("1,2,Kwame Diallo"));
        assert_eq!(
            lines.next().unwrap(),
            "2,N/A,Mei Chen,Seasoned data engineer...,0,N/A,0,N/A"
        );
    }

    #[test]
    fn test_write_output_refuses_progress_path() {
        let dir = tempfile::tempdir().unwrap();
        let progress = dir.path().join("progress.csv");
        std::fs::write(&progress, "keep me").unwrap();

        let err = write_output(&table(), &progress, &progress).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(std::fs::read_to_string(&progress).unwrap(), "keep me");
    }

    #[test]
    fn test_output_path_check_sees_through_spelling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("runs")).unwrap();
        let progress = dir.path().join("p.csv");
        let same = dir.path().join("runs").join("..").join("p.csv");

        // neither file exists yet, as at startup
        assert!(matches!(
            check_output_path(&same, &progress),
            Err(AppError::Config(_))
        ));
        assert!(check_output_path(&dir.path().join("final.csv"), &progress).is_ok());
        assert!(!progress.exists());
    }
}
