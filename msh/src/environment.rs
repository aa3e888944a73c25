use std::env;
use std::path::Path;
use tracing::debug;

/// Immutable snapshot of the variables the execution core needs: the
/// search path and the home directory, read once at startup.
#[derive(Debug, Clone)]
pub struct Environment {
    pub paths: Vec<String>,
    pub home: Option<String>,
}

impl Environment {
    pub fn new() -> Self {
        let mut paths: Vec<String> = ["/bin", "/usr/bin", "/sbin", "/usr/sbin"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Ok(val) = env::var("PATH") {
            paths = val
                .split(':')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
        }
        let home = env::var("HOME")
            .ok()
            .or_else(|| dirs::home_dir().map(|p| p.to_string_lossy().into_owned()));
        debug!("search path {:?}", &paths);
        Environment { paths, home }
    }

    /// Resolve a program name to an executable path. Names containing a
    /// slash bypass the search path.
    pub fn lookup(&self, cmd: &str) -> Option<String> {
        if cmd.is_empty() {
            return None;
        }
        if cmd.contains('/') {
            let cmd_path = Path::new(cmd);
            if cmd_path.exists() && cmd_path.is_file() {
                return Some(cmd.to_string());
            }
            return None;
        }
        for path in &self.paths {
            let cmd_path = Path::new(path).join(cmd);
            if cmd_path.exists() && cmd_path.is_file() {
                return cmd_path.to_str().map(|s| s.to_string());
            }
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
