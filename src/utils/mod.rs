use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?((www\.|m\.)?youtube\.com|youtu\.be)/\S+$").unwrap()
});

static DISPOSITION_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;\s]+))"#).unwrap()
});

/// Last millisecond value handed out by `unique_timestamp_millis`.
static LAST_FALLBACK_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Get current Unix timestamp in milliseconds
pub fn get_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Like `get_timestamp_millis`, but strictly increasing across calls in this process.
pub fn unique_timestamp_millis() -> u64 {
    let now = get_timestamp_millis();
    let previous = LAST_FALLBACK_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

/// Whether `input` looks like a YouTube watch or short link.
///
/// Accepts an optional `http(s)://` scheme, the `youtube.com` host (optionally
/// with `www.` or `m.`) or the `youtu.be` short host, and a non-empty path.
pub fn is_valid_video_url(input: &str) -> bool {
    VIDEO_URL_RE.is_match(input)
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// Returns `None` when there is no `filename` parameter or it is empty
/// after sanitizing.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let caps = DISPOSITION_FILENAME_RE.captures(header)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();

    let name = sanitize_filename(raw)
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `<prefix>_<epoch-millis>`, unique within this process.
pub fn fallback_filename(prefix: &str) -> String {
    format!("{}_{}", prefix, unique_timestamp_millis())
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = get_timestamp_millis();
        assert!(ts > 1_700_000_000_000); // Sanity check
    }

    #[test]
    fn test_unique_timestamps_never_repeat() {
        let mut previous = unique_timestamp_millis();
        for _ in 0..1000 {
            let next = unique_timestamp_millis();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.mp3"), "test_file.mp3");
        assert_eq!(sanitize_filename("normal-name.mp3"), "normal-name.mp3");
        assert_eq!(sanitize_filename("..\\..\\evil.exe"), ".._.._evil.exe");
    }

    #[test]
    fn test_valid_urls() {
        let valid = [
            "https://www.youtube.com/watch?v=abc123",
            "http://www.youtube.com/watch?v=abc123",
            "www.youtube.com/watch?v=abc123",
            "youtube.com/watch?v=abc123",
            "https://m.youtube.com/watch?v=abc123",
            "https://youtu.be/abc123",
            "youtu.be/abc123?t=10",
            "HTTPS://WWW.YOUTUBE.COM/WATCH?V=ABC123",
            "https://www.youtube.com/shorts/xyz",
        ];
        for url in valid {
            assert!(is_valid_video_url(url), "expected valid: {url}");
        }
    }

    #[test]
    fn test_invalid_urls() {
        let invalid = [
            "",
            "not a url",
            "https://www.youtube.com",
            "https://www.youtube.com/",
            "youtu.be",
            "https://youtu.be/",
            "https://vimeo.com/12345",
            "https://www.youtube.com.evil.com/watch?v=1",
            "https://notyoutube.com/watch?v=1",
            "ftp://www.youtube.com/watch?v=1",
            "https://www.youtube.com/watch?v=abc 123",
            " https://youtu.be/abc",
        ];
        for url in invalid {
            assert!(!is_valid_video_url(url), "expected invalid: {url}");
        }
    }

    #[test]
    fn test_non_ascii_filename() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="Café Señor.mp4""#),
            Some("Café Señor.mp4".to_string())
        );
    }

    #[test]
    fn test_filename_from_content_disposition() {
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="clip.mp4""#),
            Some("clip.mp4".to_string())
        );
        assert_eq!(
            filename_from_content_disposition(r#"attachment; FILENAME="My Song.mp3""#),
            Some("My Song.mp3".to_string())
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=demo.webm"),
            Some("demo.webm".to_string())
        );
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="../../etc/passwd""#),
            Some("_.._etc_passwd".to_string())
        );
    }

    #[test]
    fn test_unparseable_content_disposition() {
        assert_eq!(filename_from_content_disposition("attachment"), None);
        assert_eq!(filename_from_content_disposition(r#"attachment; filename="""#), None);
        assert_eq!(filename_from_content_disposition(r#"inline; filename="..""#), None);
        assert_eq!(filename_from_content_disposition(""), None);
    }

    use proptest::prelude::*;

    /// Hosts the validator accepts, in any letter case.
    fn accepted_host() -> impl Strategy<Value = String> {
        (
            prop_oneof![
                Just("youtube.com"),
                Just("www.youtube.com"),
                Just("m.youtube.com"),
                Just("youtu.be"),
            ],
            proptest::collection::vec(any::<bool>(), 16),
        )
            .prop_map(|(host, upper)| {
                host.chars()
                    .zip(upper.into_iter().cycle())
                    .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                    .collect::<String>()
            })
    }

    /// Lookalike and unrelated hosts.
    fn rejected_host() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("youtube.org".to_string()),
            Just("youtu.bee".to_string()),
            Just("notyoutube.com".to_string()),
            Just("www.youtube.com.evil.com".to_string()),
            Just("youtubecom".to_string()),
            Just("music.youtube.co".to_string()),
            "[a-z]{1,12}\\.(com|net|org|io)",
        ]
        .prop_filter("must not be an accepted host", |host| {
            !matches!(
                host.to_ascii_lowercase().as_str(),
                "youtube.com" | "www.youtube.com" | "m.youtube.com" | "youtu.be"
            )
        })
    }

    fn scheme() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just(""), Just("http://"), Just("https://"), Just("HTTPS://")]
    }

    proptest! {
        #[test]
        fn accepts_video_hosts_with_path(
            scheme in scheme(),
            host in accepted_host(),
            path in "[A-Za-z0-9_=?&.-]{1,24}",
        ) {
            let url = format!("{scheme}{host}/{path}");
            prop_assert!(is_valid_video_url(&url), "{}", url);
        }

        #[test]
        fn rejects_other_hosts(
            scheme in scheme(),
            host in rejected_host(),
            path in "[A-Za-z0-9_=?&.-]{1,24}",
        ) {
            let url = format!("{scheme}{host}/{path}");
            prop_assert!(!is_valid_video_url(&url), "{}", url);
        }

        #[test]
        fn rejects_bare_hosts(scheme in scheme(), host in accepted_host(), slash in any::<bool>()) {
            let url = format!("{scheme}{host}{}", if slash { "/" } else { "" });
            prop_assert!(!is_valid_video_url(&url), "{}", url);
        }

        #[test]
        fn rejects_whitespace_in_path(
            host in accepted_host(),
            head in "[a-z0-9]{1,8}",
            tail in "[a-z0-9]{0,8}",
        ) {
            let url = format!("https://{host}/{head} {tail}");
            prop_assert!(!is_valid_video_url(&url), "{}", url);
        }

        #[test]
        fn validator_never_panics(input in "\\PC*") {
            let _ = is_valid_video_url(&input);
        }
    }

    #[test]
    fn test_fallback_filename_shape() {
        let re = Regex::new(r"^krystalDownloader_\d+$").unwrap();
        let a = fallback_filename("krystalDownloader");
        let b = fallback_filename("krystalDownloader");
        assert!(re.is_match(&a), "{a}");
        assert!(re.is_match(&b), "{b}");
        assert_ne!(a, b);
    }
}
