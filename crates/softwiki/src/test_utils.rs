use crate::store::fs_provider::FileSystemProvider;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub provider: FileSystemProvider,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let provider = FileSystemProvider::new(root.clone());
        Self {
            _temp_dir: temp_dir,
            provider,
            root,
        }
    }
}
