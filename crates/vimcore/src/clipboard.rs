//! System clipboard behind the `+` and `*` registers.

use crate::config::{ClipboardBackend, ClipboardConfig};
use crate::host::{ClipboardBridge, NoClipboard};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const WL_COPY: &str = "wl-copy";
const WL_PASTE: &str = "wl-paste";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardBackendChoice {
    Disabled,
    Arboard,
    /// `wl-copy` for writes; `wl-paste` for reads when it was found.
    WlClipboard { copy: PathBuf, paste: Option<PathBuf> },
}

pub fn choose_backend(cfg: &ClipboardConfig) -> Result<ClipboardBackendChoice> {
    let copy_cmd = cfg.wl_copy_cmd.as_deref().unwrap_or(WL_COPY);
    let paste_cmd = cfg.wl_paste_cmd.as_deref().unwrap_or(WL_PASTE);
    match cfg.backend {
        ClipboardBackend::Disabled => Ok(ClipboardBackendChoice::Disabled),
        ClipboardBackend::Arboard => Ok(ClipboardBackendChoice::Arboard),
        ClipboardBackend::WlCopy => {
            let copy = find_in_path(copy_cmd).ok_or_else(|| {
                anyhow!(
                    "Clipboard backend wl-copy selected, but '{}' was not found on PATH",
                    copy_cmd
                )
            })?;
            Ok(ClipboardBackendChoice::WlClipboard {
                copy,
                paste: find_in_path(paste_cmd),
            })
        }
        ClipboardBackend::Auto => {
            if cfg!(target_os = "linux") && is_wayland_session() {
                if let Some(copy) = find_in_path(copy_cmd) {
                    return Ok(ClipboardBackendChoice::WlClipboard {
                        copy,
                        paste: find_in_path(paste_cmd),
                    });
                }
            }
            Ok(ClipboardBackendChoice::Arboard)
        }
    }
}

/// Builds the bridge `cfg` asks for. A backend that cannot be set up is
/// logged and replaced by one that holds nothing.
pub fn create_bridge(cfg: &ClipboardConfig) -> Box<dyn ClipboardBridge> {
    match choose_backend(cfg) {
        Ok(ClipboardBackendChoice::Disabled) => Box::new(NoClipboard),
        Ok(choice) => {
            debug!(backend = ?choice, "clipboard backend selected");
            Box::new(SystemClipboard::new(choice))
        }
        Err(err) => {
            warn!(error = %err, "clipboard unavailable");
            Box::new(NoClipboard)
        }
    }
}

/// [`ClipboardBridge`] over arboard or the `wl-clipboard` tools.
pub struct SystemClipboard {
    choice: ClipboardBackendChoice,
    arboard: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new(choice: ClipboardBackendChoice) -> Self {
        Self {
            choice,
            arboard: None,
        }
    }

    /// The arboard handle, opened on first use.
    fn arboard(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.arboard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| anyhow!("Failed to open clipboard: {}", e))?;
            self.arboard = Some(clipboard);
        }
        self.arboard
            .as_mut()
            .ok_or_else(|| anyhow!("Clipboard is not available"))
    }

    fn try_read(&mut self) -> Result<String> {
        match &self.choice {
            ClipboardBackendChoice::Disabled => Err(anyhow!("Clipboard is disabled")),
            ClipboardBackendChoice::Arboard => self
                .arboard()?
                .get_text()
                .map_err(|e| anyhow!("Failed to read clipboard: {}", e)),
            ClipboardBackendChoice::WlClipboard { paste: Some(cmd), .. } => paste_with_wl_paste(cmd),
            ClipboardBackendChoice::WlClipboard { paste: None, .. } => {
                Err(anyhow!("wl-paste was not found on PATH"))
            }
        }
    }

    fn try_write(&mut self, text: &str) -> Result<()> {
        match &self.choice {
            ClipboardBackendChoice::Disabled => Ok(()),
            ClipboardBackendChoice::Arboard => self
                .arboard()?
                .set_text(text.to_string())
                .map_err(|e| anyhow!("Failed to write clipboard: {}", e)),
            ClipboardBackendChoice::WlClipboard { copy, .. } => copy_with_wl_copy(text, copy),
        }
    }
}

impl ClipboardBridge for SystemClipboard {
    fn read(&mut self) -> Option<String> {
        match self.try_read() {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(error = %err, "clipboard read failed");
                None
            }
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(err) = self.try_write(text) {
            warn!(error = %err, "clipboard write failed");
        }
    }
}

pub fn copy_with_wl_copy(text: &str, cmd: &Path) -> Result<()> {
    let mut child = Command::new(cmd)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| anyhow!("Failed to start wl-copy: {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        use std::io::Write;
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| anyhow!("Failed to write to wl-copy stdin: {}", e))?;
    }

    // `wl-copy` keeps running to own the selection. Wait briefly for an
    // immediate failure, then reap it in the background.
    let deadline = Instant::now() + Duration::from_millis(250);
    loop {
        match child
            .try_wait()
            .map_err(|e| anyhow!("Failed to check wl-copy status: {}", e))?
        {
            Some(status) => {
                if status.success() {
                    return Ok(());
                }

                // Only read stderr on failure: a forked wl-copy may hold the
                // pipe open indefinitely.
                let mut stderr_bytes = Vec::new();
                if let Some(mut stderr) = child.stderr.take() {
                    use std::io::Read;
                    let _ = stderr.read_to_end(&mut stderr_bytes);
                }

                let stderr = String::from_utf8_lossy(&stderr_bytes);
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    return Err(anyhow!("wl-copy failed with exit status {}", status));
                }
                return Err(anyhow!("wl-copy failed: {}", stderr));
            }
            None => {
                if Instant::now() >= deadline {
                    std::thread::spawn(move || {
                        let _ = child.wait();
                    });
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

pub fn paste_with_wl_paste(cmd: &Path) -> Result<String> {
    let output = Command::new(cmd)
        .arg("--no-newline")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| anyhow!("Failed to run wl-paste: {}", e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            return Err(anyhow!("wl-paste failed with exit status {}", output.status));
        }
        return Err(anyhow!("wl-paste failed: {}", stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn is_wayland_session() -> bool {
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        return true;
    }

    match std::env::var("XDG_SESSION_TYPE") {
        Ok(v) => v.eq_ignore_ascii_case("wayland"),
        Err(_) => false,
    }
}

fn find_in_path(cmd: &str) -> Option<PathBuf> {
    let cmd_path = Path::new(cmd);
    #[cfg(windows)]
    let has_separator = cmd.contains('/') || cmd.contains('\\');
    #[cfg(not(windows))]
    let has_separator = cmd.contains('/');

    if has_separator {
        return is_executable_file(cmd_path).then(|| cmd_path.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable_file(candidate))
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(target_os = "linux")]
    use serial_test::serial;

    fn base_cfg() -> ClipboardConfig {
        ClipboardConfig {
            backend: ClipboardBackend::Auto,
            ..ClipboardConfig::default()
        }
    }

    #[test]
    fn test_forced_wl_copy_errors_when_missing() {
        let mut cfg = base_cfg();
        cfg.backend = ClipboardBackend::WlCopy;
        cfg.wl_copy_cmd = Some("definitely-not-a-real-wl-copy-binary".to_string());

        let err = choose_backend(&cfg).unwrap_err().to_string();
        assert!(err.contains("wl-copy selected"));
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_disabled_backend_yields_empty_bridge() {
        let mut cfg = base_cfg();
        cfg.backend = ClipboardBackend::Disabled;
        assert_eq!(choose_backend(&cfg).unwrap(), ClipboardBackendChoice::Disabled);

        let mut bridge = create_bridge(&cfg);
        bridge.write("ignored");
        assert_eq!(bridge.read(), None);
    }

    #[test]
    fn test_missing_forced_backend_falls_back_to_empty_bridge() {
        let mut cfg = base_cfg();
        cfg.backend = ClipboardBackend::WlCopy;
        cfg.wl_copy_cmd = Some("/nonexistent/wl-copy".to_string());
        let mut bridge = create_bridge(&cfg);
        assert_eq!(bridge.read(), None);
    }

    #[cfg(unix)]
    fn write_executable(path: &Path, contents: &str) {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_copy_with_wl_copy_surfaces_stderr_on_failure() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("wl-copy");
        // Reads stdin first so the write never hits a closed pipe.
        write_executable(&fake, "#!/bin/sh\ncat >/dev/null\necho boom 1>&2\nexit 1\n");

        let err = copy_with_wl_copy("hello", &fake).unwrap_err().to_string();
        assert!(err.contains("boom"));
    }

    #[test]
    #[cfg(unix)]
    fn test_copy_with_wl_copy_ok_on_success() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("wl-copy");
        write_executable(&fake, "#!/bin/sh\ncat >/dev/null\nexit 0\n");

        copy_with_wl_copy("hello", &fake).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_wl_paste_bridge_reads_output() {
        let dir = TempDir::new().unwrap();
        let copy = dir.path().join("wl-copy");
        let paste = dir.path().join("wl-paste");
        write_executable(&copy, "#!/bin/sh\ncat >/dev/null\nexit 0\n");
        write_executable(&paste, "#!/bin/sh\nprintf 'from the clipboard'\n");

        let mut bridge = SystemClipboard::new(ClipboardBackendChoice::WlClipboard {
            copy,
            paste: Some(paste),
        });
        bridge.write("hello");
        assert_eq!(bridge.read().as_deref(), Some("from the clipboard"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_auto_selects_wl_clipboard_when_wayland_and_present() {
        struct EnvGuard {
            path: Option<std::ffi::OsString>,
            wayland: Option<std::ffi::OsString>,
        }
        impl Drop for EnvGuard {
            fn drop(&mut self) {
                match self.path.take() {
                    Some(v) => std::env::set_var("PATH", v),
                    None => std::env::remove_var("PATH"),
                }
                match self.wayland.take() {
                    Some(v) => std::env::set_var("WAYLAND_DISPLAY", v),
                    None => std::env::remove_var("WAYLAND_DISPLAY"),
                }
            }
        }

        let dir = TempDir::new().unwrap();
        write_executable(&dir.path().join("wl-copy"), "#!/bin/sh\ncat >/dev/null\nexit 0\n");

        let _guard = EnvGuard {
            path: std::env::var_os("PATH"),
            wayland: std::env::var_os("WAYLAND_DISPLAY"),
        };

        std::env::set_var("PATH", dir.path().as_os_str());
        std::env::set_var("WAYLAND_DISPLAY", "wayland-1");

        let choice = choose_backend(&base_cfg()).unwrap();
        assert!(matches!(
            choice,
            ClipboardBackendChoice::WlClipboard { paste: None, .. }
        ));
    }
}
