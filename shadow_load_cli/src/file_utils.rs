use std::path::{Path, PathBuf};

/// Every file below `folder_path`, sorted. Hidden entries are skipped.
pub fn read_folder(folder_path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder_path)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            files.extend(read_folder(&path)?);
        }
    }

    files.sort();

    Ok(files)
}

/// The dataset itself when it is a file, otherwise every file below it.
pub fn dataset_files(dataset: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    if dataset.is_file() {
        Ok(vec![dataset.to_path_buf()])
    } else {
        read_folder(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/datasets")
    }

    #[test]
    fn test_read_folder() {
        let files = read_folder(&fixtures()).unwrap();

        assert_eq!(
            files,
            vec![
                fixtures().join("c101_3.txt"),
                fixtures().join("nested/c101_4.txt"),
            ]
        );
    }

    #[test]
    fn test_dataset_files_with_a_single_file() {
        let file = fixtures().join("c101_3.txt");

        assert_eq!(dataset_files(&file).unwrap(), vec![file]);
    }
}
