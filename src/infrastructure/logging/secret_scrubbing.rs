use regex::{Captures, Regex};
use std::fmt;
use std::io;
use std::sync::LazyLock;
use tracing_subscriber::fmt::MakeWriter;

// JWT-shaped backend keys: header.payload.signature, header starting with eyJ
static JWT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"eyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}").expect("valid regex")
});

// Opaque keys of the form sb_secret_... / sb_publishable_...
static OPAQUE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"sb_(?:secret|publishable)_[A-Za-z0-9_-]{10,}").expect("valid regex")
});

static BEARER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[A-Za-z0-9\-_\.\[\]]+").expect("valid regex"));

static KEY_FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(["']?(?:apikey|api_key|service_key|public_key|secret|token)["']?\s*[:=]\s*)["']?[A-Za-z0-9\-_\.]{12,}["']?"#,
    )
    .expect("valid regex")
});

/// Redacts backend credentials from text before it is printed or logged.
#[derive(Clone, Copy, Default)]
pub struct SecretScrubber;

impl SecretScrubber {
    pub const fn new() -> Self {
        Self
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = KEY_FIELD_PATTERN.replace_all(message, |caps: &Captures| {
            format!("{}[REDACTED]", &caps[1])
        });
        let scrubbed = BEARER_PATTERN.replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed = JWT_PATTERN.replace_all(&scrubbed, "[JWT_REDACTED]");
        OPAQUE_KEY_PATTERN
            .replace_all(&scrubbed, "[KEY_REDACTED]")
            .into_owned()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

/// `MakeWriter` that scrubs every formatted log line before writing it.
#[derive(Clone, Debug)]
pub struct ScrubbingMakeWriter<M> {
    inner: M,
}

impl<M> ScrubbingMakeWriter<M> {
    pub const fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for ScrubbingMakeWriter<M> {
    type Writer = ScrubbingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        ScrubbingWriter {
            inner: self.inner.make_writer(),
        }
    }
}

/// Writer produced by [`ScrubbingMakeWriter`].
pub struct ScrubbingWriter<W> {
    inner: W,
}

impl<W: io::Write> io::Write for ScrubbingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let scrubbed = SecretScrubber.scrub_message(&text);
        self.inner.write_all(scrubbed.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
