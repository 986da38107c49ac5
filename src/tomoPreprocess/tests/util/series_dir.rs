use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;


/// A temporary tilt series folder
pub struct SeriesDir {
	dir: TempDir
}

impl SeriesDir {

	pub fn new() -> SeriesDir {
		Self {
			dir: TempDir::new()
				.expect("Failed to make temp folder")
		}
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	pub fn file(&self, path: impl AsRef<Path>) -> PathBuf {
		self.dir.path().join(path.as_ref())
	}

	pub fn subdir(&self, name: &str) -> PathBuf {
		let path = self.file(name);
		fs::create_dir_all(&path)
			.expect(&format!("Failed to create folder: {}", path.to_string_lossy()));
		path
	}

	pub fn write(&self, path: impl AsRef<Path>, txt: impl AsRef<str>) -> PathBuf {
		let path = self.file(path);
		fs::write(&path, txt.as_ref())
			.expect(&format!("Failed to write file: {}", path.to_string_lossy()));
		path
	}

	pub fn read(&self, path: impl AsRef<Path>) -> String {
		let path = self.file(path);
		fs::read_to_string(&path)
			.expect(&format!("Failed to read file: {}", path.to_string_lossy()))
	}
}

impl AsRef<Path> for SeriesDir {
	fn as_ref(&self) -> &Path {
		self.dir.path()
	}
}
