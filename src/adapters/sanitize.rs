//! Log sanitization for patient identifiers and clinical values.
//!
//! The pipeline itself never logs raw feature values, but error messages and
//! third-party log lines can still carry them. These helpers scrub formatted
//! log output before it reaches the sink:
//! - Patient and record identifiers (UUIDs, MRNs)
//! - Contact details (emails, phone numbers)
//! - Dates of birth
//! - Clinical measurements written as `name=value` or `name: value`
//!
//! Input longer than [`MAX_SANITIZE_BYTES`] is truncated before scanning.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Compiled patterns, built on first use.
static PHI_PATTERNS: OnceLock<PhiPatterns> = OnceLock::new();

/// Maximum number of bytes sanitized per call.
pub const MAX_SANITIZE_BYTES: usize = 16 * 1024;

struct PhiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PhiPatterns {
    set: RegexSet,
    patterns: Vec<PhiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn get_patterns() -> &'static PhiPatterns {
    PHI_PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Clinical measurements: keep the name, drop the value
            (
                r"(?i)\b(glucose|hba1c|bmi|imc|blood[_ ]?pressure|sys_bp|hypertension|heart[_ ]?disease|age|weight|height|value)\b\s*[:=]\s*-?[0-9]+(?:\.[0-9]+)?",
                "${1}=[REDACTED]",
            ),
            // Dates of birth
            (
                r"(?i)\b(dob|birth[_ ]?date|date[_ ]of[_ ]birth)\b\s*[:=]\s*[0-9./-]{6,10}",
                "${1}=[REDACTED-DOB]",
            ),
            // Patient / request identifiers
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PhiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PhiPatterns { set, patterns }
    })
}

/// Replace identifiers and clinical values in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_SANITIZE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check whether a string contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_phi(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, MAX_SANITIZE_BYTES);
    get_patterns().set.is_match(prefix)
}

/// `MakeWriter` that scrubs every formatted event before it reaches `inner`.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Writer handed out per event. The fmt layer emits each event as one
/// complete line in a single write, so lines are sanitized as they arrive.
pub struct SanitizingWriter<W> {
    inner: W,
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let mut sanitized = sanitize(&text);
        if text.ends_with('\n') && !sanitized.ends_with('\n') {
            sanitized.push('\n');
        }
        self.inner.write_all(sanitized.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_clinical_values() {
        let sanitized = sanitize("rejected input glucose=412.5 bmi: 31 hba1c=7.1");
        assert!(!sanitized.contains("412.5"));
        assert!(!sanitized.contains("31"));
        assert!(!sanitized.contains("7.1"));
        assert!(sanitized.contains("glucose=[REDACTED]"));
        assert!(sanitized.contains("bmi=[REDACTED]"));
    }

    #[test]
    fn test_sanitize_identifiers() {
        let sanitized = sanitize("patient 550e8400-e29b-41d4-a716-446655440000 MRN:12345678");
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_contact_and_dob() {
        let sanitized = sanitize("contact jane@clinic.org dob=1961-04-02");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(sanitized.contains("dob=[REDACTED-DOB]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let line = "Inference complete: tier=HIGH";
        assert!(!contains_phi(line));
        assert_eq!(sanitize(line), line);
        assert!(contains_phi("glucose: 180"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let input = "x".repeat(64);
        let sanitized = sanitize_with_limit(&input, 16);
        assert!(sanitized.ends_with("[TRUNCATED]"));
        assert!(sanitized.starts_with(&"x".repeat(16)));
    }

    #[test]
    fn test_writer_sanitizes_each_event() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter { inner: &mut out };
            writer.write_all(b"scored glucose=200\n").expect("write");
            writer.write_all(b"rejected bmi=40\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "scored glucose=[REDACTED]\nrejected bmi=[REDACTED]\n");
    }

    #[test]
    fn test_writer_keeps_line_break_after_truncation() {
        let mut out = Vec::new();
        let line = format!("{}\n", "x".repeat(MAX_SANITIZE_BYTES + 10));
        SanitizingWriter { inner: &mut out }
            .write_all(line.as_bytes())
            .expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.ends_with("[TRUNCATED]\n"));
    }
}
