use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs::{File, OpenOptions};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Decode a list parameter passed on the command line.
///
/// An empty argument is an empty list. Anything else must be standard base64
/// of a JSON array of strings.
///
/// ```
/// use slsa_go_builder::utils::decode_list;
///
/// assert!(decode_list("").unwrap().is_empty());
/// assert_eq!(decode_list("WyItLWFyZyJd").unwrap(), vec!["--arg".to_string()]);
/// assert!(decode_list("blabla").is_err());
/// ```
pub fn decode_list(arg: &str) -> Result<Vec<String>> {
    if arg.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = STANDARD
        .decode(arg)
        .map_err(|e| Error::Decode(format!("base64: {e}")))?;

    serde_json::from_slice::<Vec<String>>(&bytes).map_err(|e| Error::Decode(format!("json: {e}")))
}

/// Inverse of [`decode_list`].
pub fn encode_list(list: &[String]) -> Result<String> {
    let json = serde_json::to_vec(list)?;
    Ok(STANDARD.encode(json))
}

/// Create a file for writing with owner-only permissions.
///
/// Refuses to write through a symlink. When `overwrite` is false an existing
/// file is an error.
pub fn safe_create_file(path: &Path, overwrite: bool) -> Result<File> {
    if let Ok(meta) = path.symlink_metadata() {
        if meta.file_type().is_symlink() {
            return Err(Error::Validation(format!(
                "refusing to write through symlink: {}",
                path.display()
            )));
        }
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    #[cfg(unix)]
    options.mode(0o600);

    Ok(options.open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_decode_list_empty() {
        let list = decode_list("").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_decode_list_single_arg() {
        let list = decode_list("WyItLWFyZyJd").unwrap();
        assert_eq!(list, vec!["--arg"]);
    }

    #[test]
    fn test_decode_list_many_args() {
        let value = "WyIvdXNyL2xpYi9nb29nbGUtZ29sYW5nL2Jpbi9nbyIsImJ1aWxkIiwiLW1vZD12ZW5kb3IiLCItdHJpbXBhdGgiLCItdGFncz1uZXRnbyIsIi1sZGZsYWdzPS1YIG1haW4uZ2l0VmVyc2lvbj12MS4yLjMgLVggbWFpbi5naXRTb21ldGhpbmc9c29tdGhnIl0=";
        let list = decode_list(value).unwrap();
        assert_eq!(
            list,
            vec![
                "/usr/lib/google-golang/bin/go",
                "build",
                "-mod=vendor",
                "-trimpath",
                "-tags=netgo",
                "-ldflags=-X main.gitVersion=v1.2.3 -X main.gitSomething=somthg",
            ]
        );
    }

    #[test]
    fn test_decode_list_invalid_base64() {
        let result = decode_list("blabla");
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_list_not_an_array() {
        // base64 of {"a":"b"}
        let encoded = STANDARD.encode(br#"{"a":"b"}"#);
        assert!(matches!(decode_list(&encoded), Err(Error::Decode(_))));

        // base64 of [1,2]
        let encoded = STANDARD.encode(b"[1,2]");
        assert!(matches!(decode_list(&encoded), Err(Error::Decode(_))));
    }

    #[test]
    fn test_encode_then_decode() {
        let list = vec!["go".to_string(), "build".to_string(), "-o=bin".to_string()];
        let encoded = encode_list(&list).unwrap();
        assert_eq!(decode_list(&encoded).unwrap(), list);
    }

    #[test]
    fn test_safe_create_file_no_overwrite() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.intoto.jsonl");

        let mut file = safe_create_file(&path, false)?;
        file.write_all(b"{}")?;

        assert!(safe_create_file(&path, false).is_err());
        assert!(safe_create_file(&path, true).is_ok());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_safe_create_file_rejects_symlink() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("target");
        std::fs::write(&target, b"x")?;
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link)?;

        let result = safe_create_file(&link, true);
        assert!(matches!(result, Err(Error::Validation(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_safe_create_file_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let path = dir.path().join("perm.jsonl");
        safe_create_file(&path, false)?;

        let mode = std::fs::metadata(&path)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        Ok(())
    }
}
