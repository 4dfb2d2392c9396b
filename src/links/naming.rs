use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Slug tokens with three digit groups separated by letters, e.g. content hashes
static DEGENERATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d[a-z]*\d[a-z]*\d").expect("hardcoded regex pattern is valid")
});

/// Characters that cannot appear in a file name on common filesystems
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\\/*?:"<>|\x00-\x1f]"#).expect("hardcoded regex pattern is valid")
});

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Derives local file names from recipe and file URLs
///
/// The last path segment is split on `-`, auto-generated identifier tokens are
/// dropped, and the rest is joined with `_`:
///
/// ```
/// use hf_harvest::links::NamePolicy;
///
/// let policy = NamePolicy::new(".pdf");
/// assert_eq!(
///     policy.name_for("https://www.hellofresh.com/recipes/peppercorn-steak-w06-5857fcd16121bb11c124f383"),
///     "peppercorn_steak_w06.pdf"
/// );
/// ```
///
/// Naming never fails. When every token is dropped the name falls back to a
/// random token that is unique within the process.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    extension: String,
}

impl NamePolicy {
    /// Creates a policy appending `extension` (including the dot) to every name
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
        }
    }

    /// Produces the file name for a URL
    pub fn name_for(&self, url: &str) -> String {
        let segment = self.last_segment(url);

        let mut tokens: Vec<String> = segment
            .split('-')
            .filter(|token| !DEGENERATE_TOKEN.is_match(token))
            .map(|token| UNSAFE_CHARS.replace_all(token, "").into_owned())
            .filter(|token| !token.is_empty() && !token.chars().all(|c| c == '.'))
            .collect();

        if tokens.is_empty() {
            tokens.push(fallback_token());
        }

        format!("{}{}", tokens.join("_"), self.extension)
    }

    /// Final path segment without query, fragment or a trailing extension
    fn last_segment<'a>(&self, url: &'a str) -> &'a str {
        let path = url.split(['?', '#']).next().unwrap_or("");
        let segment = path.rsplit('/').next().unwrap_or("");

        segment
            .len()
            .checked_sub(self.extension.len())
            .and_then(|cut| {
                let tail = segment.get(cut..)?;
                if tail.eq_ignore_ascii_case(&self.extension) {
                    segment.get(..cut)
                } else {
                    None
                }
            })
            .unwrap_or(segment)
    }
}

/// A hex token that never repeats within the process
fn fallback_token() -> String {
    let sequence = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = hasher.finalize();

    // The sequence suffix keeps tokens distinct even if two digests collided
    format!("{}{:x}", hex::encode(&digest[..8]), sequence)
}
