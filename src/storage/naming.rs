//! Output file naming
//!
//! Every function here is pure: the same inputs always yield the same name,
//! and nothing touches the filesystem.

use chrono::NaiveDate;
use url::Url;

/// Maximum length of a generated file name, in characters
pub const MAX_FILENAME_LEN: usize = 200;

/// Characters replaced by `-` during sanitization
const UNSAFE_CHARS: &[char] = &[':', '/', '\\', '?', '*', '<', '>', '|', '"'];

/// Relative location of an output file: `<domain>/<filename>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    pub domain: String,
    pub filename: String,
}

impl StoragePath {
    /// Returns `domain/filename`
    pub fn relative(&self) -> String {
        format!("{}/{}", self.domain, self.filename)
    }
}

/// Generates the output location for a URL
///
/// # Naming Rules
///
/// 1. The directory is the URL's host (and explicit port)
/// 2. The base name is the last non-empty path segment, or the host with
///    dots replaced by underscores when the path is empty
/// 3. If the base name already has a short suffix (1–4 characters) it is
///    replaced when saving Markdown (`.md`) and kept otherwise; a base name
///    without a suffix gets `extension` appended
/// 4. The name is sanitized and prefixed with `YYYY-MM-DD_` when a date is given
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use leafcutter::storage::generate_filename;
/// use url::Url;
///
/// let url = Url::parse("https://www.gov.uk/government/news/budget-2025").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 28);
/// let path = generate_filename(&url, date, ".md");
/// assert_eq!(path.relative(), "www.gov.uk/2025-03-28_budget-2025.md");
/// ```
pub fn generate_filename(url: &Url, date: Option<NaiveDate>, extension: &str) -> StoragePath {
    let domain = domain_dir(url);

    let base = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| domain.replace('.', "_"));

    let (stem, suffix) = match split_extension(&base) {
        Some((stem, ext)) if ext.len() > 1 && ext.len() <= 5 => {
            if extension == ".md" {
                (stem, extension)
            } else {
                (stem, ext)
            }
        }
        _ if !base.ends_with(extension) => (base.as_str(), extension),
        _ => (base.as_str(), ""),
    };

    // A stem made only of unsafe characters would otherwise leave a bare dotfile
    let mut stem = sanitize_filename(stem);
    if stem.is_empty() {
        stem = domain.replace('.', "_");
    }
    let filename = sanitize_filename(&format!("{}{}", stem, suffix));

    StoragePath {
        domain,
        filename: with_date_prefix(filename, date),
    }
}

/// Generates the output location for a downloaded document
///
/// The file name comes from the `Content-Disposition` header when present,
/// otherwise from the URL. The extension is taken from that name, then from
/// the URL path, then from the Content-Type, and finally defaults to `.bin`.
/// A `/YYYY/MM/DD/` segment in the URL path becomes the date prefix.
pub fn document_filename(
    url: &Url,
    content_disposition: Option<&str>,
    content_type: Option<&str>,
) -> StoragePath {
    let header_name = content_disposition.and_then(filename_from_disposition);
    let date = date_from_path(url);

    let url_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let extension = header_name
        .as_deref()
        .and_then(split_extension)
        .map(|(_, ext)| ext.to_string())
        .or_else(|| split_extension(url_name).map(|(_, ext)| ext.to_string()))
        .or_else(|| content_type.and_then(extension_for_content_type).map(String::from))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Could not determine file extension for {} (Content-Type: {}), using .bin",
                url,
                content_type.unwrap_or("")
            );
            ".bin".to_string()
        });

    let generated = generate_filename(url, date, &extension);

    match header_name {
        Some(name) if has_usable_stem(&name) => {
            let mut filename = sanitize_filename(&name);
            if split_extension(&filename).is_none() {
                filename.push_str(&extension);
            }
            StoragePath {
                domain: generated.domain,
                filename: with_date_prefix(filename, date),
            }
        }
        _ => generated,
    }
}

/// Removes characters that are problematic in file names
///
/// Unsafe characters become `-`, runs of `-` collapse to one, leading and
/// trailing spaces and hyphens are trimmed, and the result is shortened to
/// [`MAX_FILENAME_LEN`] characters while keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len());
    for c in filename.chars() {
        let c = if UNSAFE_CHARS.contains(&c) || c.is_control() {
            '-'
        } else {
            c
        };
        if c == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(c);
    }

    let sanitized = sanitized.trim_matches(|c: char| c == ' ' || c == '-');

    if sanitized.chars().count() <= MAX_FILENAME_LEN {
        return sanitized.to_string();
    }

    let (stem, ext) = match split_extension(sanitized) {
        Some((stem, ext)) => {
            let ext: String = ext.chars().take(MAX_FILENAME_LEN / 2).collect();
            (stem, ext)
        }
        None => (sanitized, String::new()),
    };
    let keep = MAX_FILENAME_LEN - ext.chars().count();
    let stem: String = stem.chars().take(keep).collect();
    format!("{}{}", stem, ext)
}

/// Extracts a date from a `/YYYY/MM/DD/` sequence in the URL path
///
/// Month and day may be one or two digits; invalid calendar dates are ignored.
pub fn date_from_path(url: &Url) -> Option<NaiveDate> {
    let segments: Vec<&str> = url.path().split('/').collect();

    // The day must be followed by another separator, so it cannot be the last segment
    for window in segments.windows(4) {
        let (year, month, day) = (window[0], window[1], window[2]);
        let valid_shape = year.len() == 4
            && (1..=2).contains(&month.len())
            && (1..=2).contains(&day.len())
            && [year, month, day]
                .iter()
                .all(|s| s.chars().all(|c| c.is_ascii_digit()));
        if !valid_shape {
            continue;
        }

        let (Ok(y), Ok(m), Ok(d)) = (year.parse(), month.parse(), day.parse()) else {
            continue;
        };
        match NaiveDate::from_ymd_opt(y, m, d) {
            Some(date) => return Some(date),
            None => {
                tracing::warn!(
                    "Invalid date {}-{}-{} in URL path {}, skipping date prefix",
                    year,
                    month,
                    day,
                    url.path()
                );
            }
        }
    }

    None
}

fn domain_dir(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown_domain").to_lowercase();
    let netloc = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    };
    sanitize_filename(&netloc)
}

fn with_date_prefix(filename: String, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => {
            let prefix = date.format("%Y-%m-%d").to_string();
            if filename.starts_with(&prefix) {
                filename
            } else {
                format!("{}_{}", prefix, filename)
            }
        }
        None => filename,
    }
}

/// Splits `name` into stem and extension (including the dot)
///
/// Names whose only dot is the first character have no extension.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx == name.len() - 1 {
        return None;
    }
    Some((&name[..idx], &name[idx..]))
}

/// True when `name` keeps a non-empty stem after sanitization
fn has_usable_stem(name: &str) -> bool {
    let stem = split_extension(name).map(|(stem, _)| stem).unwrap_or(name);
    !sanitize_filename(stem).is_empty()
}

fn filename_from_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let value = rest.split(';').next().unwrap_or(rest);
    let value = value.trim_matches(|c: char| c == '"' || c == '\'' || c == ' ');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/pdf" => Some(".pdf"),
        "application/msword" => Some(".doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some(".docx"),
        "application/vnd.ms-excel" => Some(".xls"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(".xlsx"),
        "text/csv" => Some(".csv"),
        _ => None,
    }
}
