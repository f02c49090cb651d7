use std::env;
use std::path::PathBuf;

use super::ScanError;

/// Expands one configured pattern into concrete paths.
pub trait PathResolver {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, ScanError>;
}

/// Shell-style glob expansion against the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobResolver;

impl PathResolver for GlobResolver {
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, ScanError> {
        let resolution_error = |reason: String| ScanError::PathResolution {
            pattern: pattern.to_string(),
            reason,
        };

        let paths = glob::glob(pattern).map_err(|e| resolution_error(e.to_string()))?;

        let mut resolved = Vec::new();
        for path in paths {
            let path = path.map_err(|e| resolution_error(e.to_string()))?;
            if path.is_absolute() {
                resolved.push(path);
            } else {
                let cwd = env::current_dir().map_err(|e| resolution_error(e.to_string()))?;
                resolved.push(cwd.join(path));
            }
        }

        Ok(resolved)
    }
}
