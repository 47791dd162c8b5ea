use actix_web::http::uri::Uri;
use log::{error, info, warn};
use std::{
    env as stdenv,
    fs::File,
    io::{BufRead, BufReader, Error as IOError, ErrorKind},
    path::Path,
};

pub const CORS_FILE: &str = ".env_cors";

pub fn check_env_cors() {
    let current_dir = stdenv::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let env_cors_path = current_dir.join(CORS_FILE);

    if env_cors_path.exists() {
        info!("{} file found at: {}", CORS_FILE, env_cors_path.display());
    } else {
        warn!(
            "{} file not found. Expected it at: {}; falling back to CLIENT_URL",
            CORS_FILE,
            env_cors_path.display()
        );
    }
}

/// One origin per line. Blank lines and `#` comments are skipped, invalid
/// URIs are warned about; the file fails only if no line survives.
pub fn load_and_validate_cors_origins(path: &str) -> Result<Vec<String>, IOError> {
    let file = File::open(path)?;
    let buf_reader = BufReader::new(file);
    let mut origins = Vec::new();

    for line in buf_reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<Uri>() {
            Ok(uri) if uri.scheme().is_some() && uri.host().is_some() => {
                origins.push(line.trim_end_matches('/').to_string());
            }
            Ok(_) => warn!("Invalid URI in CORS configuration: {} has no scheme or host", line),
            Err(e) => warn!("Invalid URI in CORS configuration: {}: {}", line, e),
        }
    }

    if origins.is_empty() {
        return Err(IOError::new(
            ErrorKind::InvalidData,
            "All CORS lines failed validation.",
        ));
    }

    Ok(origins)
}

/// Origins from `path`, or just `client_url` when the file does not exist.
pub fn allowed_origins(path: &str, client_url: &str) -> Result<Vec<String>, IOError> {
    match load_and_validate_cors_origins(path) {
        Ok(origins) => Ok(origins),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Ok(vec![client_url.trim_end_matches('/').to_string()])
        }
        Err(e) => {
            error!("Failed to load or validate CORS origins from {}: {}", path, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_cors(name: &str, contents: &str) -> String {
        let path = stdenv::temp_dir().join(format!("subtrack-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn invalid_lines_are_skipped() {
        let path = write_cors(
            "mixed",
            "http://localhost:5173/\n\n# staging\nnot a uri\nhttps://app.example.com\n",
        );
        let origins = load_and_validate_cors_origins(&path).unwrap();
        assert_eq!(origins, vec!["http://localhost:5173", "https://app.example.com"]);
    }

    #[test]
    fn all_invalid_is_an_error() {
        let path = write_cors("bad", "nope\n/relative\n");
        let err = allowed_origins(&path, "http://localhost:5173").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_falls_back_to_client_url() {
        let origins =
            allowed_origins("/definitely/not/here/.env_cors", "http://localhost:5173/").unwrap();
        assert_eq!(origins, vec!["http://localhost:5173"]);
    }
}
