use std::path::PathBuf;

/// Settings for a [`ModelBuilder`](crate::ModelBuilder).
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Directories tried, in order, for include paths that do not resolve
    /// as given.
    pub search_dirs: Vec<PathBuf>,
    /// Write output items after the solve item.
    pub emit_output: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            emit_output: true,
        }
    }
}

impl ModelConfig {
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn emit_output(mut self, emit: bool) -> Self {
        self.emit_output = emit;
        self
    }
}
