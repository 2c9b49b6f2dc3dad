//! Module sources for `import`.
//!
//! `import "std:<Name>";` resolves against the built-in table below; any other
//! string is handed to the interpreter's [`ModuleLoader`] as a path.

use std::fs;
use std::path::Path;

use log::info;
use phf::phf_map;

use crate::error::Result;

/// Prefix marking a built-in module name.
pub const STD_PREFIX: &str = "std:";

const FILE: &str = "class File {
  init(path) { this.path = path; }
  exists() { return fileExists(this.path); }
  create() { return createFile(this.path); }
  delete() { return deleteFile(this.path); }
  read() { return readFile(this.path); }
  write(data) { return writeFile(this.path, data); }
  append(data) { return appendFile(this.path, data); }
}
";

static STD_MODULES: phf::Map<&'static str, &'static str> = phf_map! {
    "File" => FILE,
};

/// Source of the built-in module `name` (without the `std:` prefix).
pub fn builtin(name: &str) -> Option<&'static str> {
    STD_MODULES.get(name).copied()
}

/// Reads a whole file as UTF‑8 text.
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    info!("Reading file: {:?}", path);

    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes)?;

    info!("Read {} bytes from {:?}", text.len(), path);

    Ok(text)
}

/// Supplies the text of non-builtin modules.
pub trait ModuleLoader {
    fn load(&self, path: &str) -> Result<String>;
}

/// Loads modules from the filesystem, relative to the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl ModuleLoader for FsLoader {
    fn load(&self, path: &str) -> Result<String> {
        read_source(path)
    }
}
