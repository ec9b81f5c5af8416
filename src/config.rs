use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

/// Documented root of the BEA data API.
pub const DEFAULT_API_URL: &str = "https://apps.bea.gov/api/data/";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
}

/// Resolves client configuration in precedence order:
/// explicit arguments, then `BEA_API_URL` / `BEA_API_KEY` environment
/// variables, then an rc file (`BEA_API_RC`, `./.beaapirc`, `~/.beaapirc`).
///
/// The URL falls back to [`DEFAULT_API_URL`]; the key has no fallback.
pub(crate) fn load_config(url: Option<String>, key: Option<String>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("BEA_API_URL").ok());
    let mut key = key.or_else(|| std::env::var("BEA_API_KEY").ok());

    let rc_candidates = rc_candidates();

    if url.is_none() || key.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read configuration file {}: {}",
                        rc_path.display(),
                        e
                    ))
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if key.is_none() {
                    key = cfg.key;
                }
                break;
            }
        }
    }

    let url = url.unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let key = match key {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            return Err(Error::Config(format!(
                "missing API key (set BEA_API_KEY or put `key:` in one of: {})",
                rc_candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    };

    Ok(ClientConfig { url, key })
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once(':') {
            let v = strip_quotes(v.trim());
            match k.trim() {
                "url" if !v.is_empty() => cfg.url = Some(v.to_string()),
                "key" if !v.is_empty() => cfg.key = Some(v.to_string()),
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order: explicit BEA_API_RC, current directory, home directory.
    if let Ok(p) = std::env::var("BEA_API_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".beaapirc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".beaapirc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rc_file_lines_parse_with_comments_and_quotes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# BEA credentials").unwrap();
        writeln!(f, "url: https://apps.bea.gov/api/data/").unwrap();
        writeln!(f, "key: '3924A4B4-43A0-4BE6-B131-650F0740C025'").unwrap();
        let cfg = read_rc(f.path()).unwrap();
        assert_eq!(cfg.url.as_deref(), Some("https://apps.bea.gov/api/data/"));
        assert_eq!(
            cfg.key.as_deref(),
            Some("3924A4B4-43A0-4BE6-B131-650F0740C025")
        );
    }

    #[test]
    fn rc_file_ignores_unknown_keys_and_blank_values() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "verify: 0").unwrap();
        writeln!(f, "key:").unwrap();
        let cfg = read_rc(f.path()).unwrap();
        assert!(cfg.url.is_none());
        assert!(cfg.key.is_none());
    }

    #[test]
    fn explicit_arguments_win() {
        let cfg = load_config(
            Some("https://example.invalid/api/".into()),
            Some("abc".into()),
        )
        .unwrap();
        assert_eq!(cfg.url, "https://example.invalid/api/");
        assert_eq!(cfg.key, "abc");
    }
}
