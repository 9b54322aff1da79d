use romsift_dat::MergeMode;
use std::path::PathBuf;

/// The configuration surface the pipeline consumes. Loading these from a
/// CLI or a config file is the outer binary's business; the pipeline
/// only ever sees the resolved values.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directories to scan for candidate files.
    pub input_dirs: Vec<PathBuf>,
    /// Where reconciled sets (and the fixdat) are written.
    pub output_dir: PathBuf,
    /// Merge policy; `None` leaves the catalog untouched.
    pub merge_mode: Option<MergeMode>,
    /// Emit a residual catalog when anything is missing.
    pub fixdat: bool,
}

impl Options {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dirs: Vec::new(),
            output_dir: output_dir.into(),
            merge_mode: None,
            fixdat: false,
        }
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.input_dirs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_merge_mode(mut self, mode: MergeMode) -> Self {
        self.merge_mode = Some(mode);
        self
    }

    pub fn with_fixdat(mut self, fixdat: bool) -> Self {
        self.fixdat = fixdat;
        self
    }
}
