//! MIME composition: header block, multipart structure, and boundaries.

use std::fmt::Write as _;

use md5::{Digest, Md5};
use rand::Rng;

use crate::error::{ClientError, Result};
use crate::message::{BodyKind, Message};

/// Generate a 32-hex-character boundary token.
///
/// Hashes 32 concatenated pseudo-random decimal integers with MD5. The
/// token is a textual delimiter, not a security boundary; the statistical
/// uniqueness of the input is all that is relied upon.
pub(crate) fn boundary<R: Rng>(rng: &mut R) -> String {
    let mut seed = String::with_capacity(32 * 10);
    for _ in 0..32 {
        let _ = write!(seed, "{}", rng.gen::<u32>());
    }

    let digest = Md5::digest(seed.as_bytes());
    let mut token = String::with_capacity(32);
    for byte in digest {
        let _ = write!(token, "{byte:02x}");
    }

    token
}

/// Append one CRLF-terminated line.
fn put(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push_str("\r\n");
}

/// Render `message` into the complete RFC 2822 text sent as the DATA
/// payload. Fresh boundaries are drawn from `rng` on every call.
///
/// Attachments force a top-level `multipart/mixed` wrapper regardless of
/// the body kind; without them the body is flat (`text/plain`,
/// `text/html`) or a bare `multipart/alternative` pair.
pub(crate) fn render<R: Rng>(message: &Message, rng: &mut R) -> Result<String> {
    let Some(kind) = message.kind else {
        return Err(ClientError::InvalidState("message has no body kind"));
    };

    let mut out = String::with_capacity(1024);

    put(&mut out, format!("To: {}", message.to));
    put(&mut out, format!("From: {}", message.from));
    put(&mut out, format!("Subject: {}", message.subject));
    let reply_to = if message.reply_to.is_empty() {
        &message.from
    } else {
        &message.reply_to
    };
    put(&mut out, format!("Reply-To: {reply_to}"));
    if !message.read_receipt_to.is_empty() {
        put(
            &mut out,
            format!("Disposition-Notification-To: {}", message.read_receipt_to),
        );
    }
    for header in &message.headers {
        put(&mut out, format!("{}: {}", header.name(), header.value()));
    }
    put(&mut out, "MIME-Version: 1.0");

    let has_attachments = !message.attachments.is_empty();
    let mut alt = String::new();
    let mut mixed = String::new();

    if has_attachments {
        alt = boundary(rng);
        mixed = boundary(rng);
        put(
            &mut out,
            format!("Content-type: multipart/mixed; boundary=\"{mixed}\""),
        );
    } else {
        match kind {
            BodyKind::Text => put(&mut out, "Content-type: text/plain"),
            BodyKind::Html => put(&mut out, "Content-type: text/html"),
            BodyKind::TextAndHtml => {
                alt = boundary(rng);
                put(
                    &mut out,
                    format!("Content-type: multipart/alternative; boundary=\"{alt}\""),
                );
            }
        }
    }

    // RFC 2822 header/body separator.
    put(&mut out, "");

    if has_attachments {
        put(&mut out, format!("--{mixed}"));
        put(
            &mut out,
            format!("Content-type: multipart/alternative; boundary=\"{alt}\""),
        );
        put(&mut out, "");

        put(&mut out, format!("--{alt}"));
        match kind {
            BodyKind::Text => {
                put(&mut out, "Content-type: text/plain");
                put(&mut out, "");
                put(&mut out, &message.body_text);
            }
            BodyKind::Html => {
                put(&mut out, "Content-type: text/html");
                put(&mut out, "");
                put(&mut out, &message.body_html);
            }
            BodyKind::TextAndHtml => {
                put(&mut out, "Content-type: text/plain");
                put(&mut out, "");
                put(&mut out, &message.body_text);
                put(&mut out, "");

                put(&mut out, format!("--{alt}"));
                put(&mut out, "Content-type: text/html");
                put(&mut out, "");
                put(&mut out, &message.body_html);
            }
        }
        put(&mut out, "");
        put(&mut out, format!("--{alt}--"));
        put(&mut out, "");

        for attachment in &message.attachments {
            put(&mut out, format!("--{mixed}"));
            put(
                &mut out,
                format!(
                    "Content-Type: {}; name=\"{}\"",
                    attachment.mime_type(),
                    attachment.short_name()
                ),
            );
            put(&mut out, "Content-Transfer-Encoding: base64");
            put(
                &mut out,
                format!(
                    "Content-Disposition: attachment; filename=\"{}\"",
                    attachment.short_name()
                ),
            );
            put(&mut out, "");
            put(&mut out, attachment.base64());
            put(&mut out, "");
        }

        put(&mut out, format!("--{mixed}--"));
    } else {
        match kind {
            BodyKind::Text => put(&mut out, &message.body_text),
            BodyKind::Html => put(&mut out, &message.body_html),
            BodyKind::TextAndHtml => {
                put(&mut out, format!("--{alt}"));
                put(&mut out, "Content-type: text/plain");
                put(&mut out, "");
                put(&mut out, &message.body_text);

                put(&mut out, format!("--{alt}"));
                put(&mut out, "Content-type: text/html");
                put(&mut out, "");
                put(&mut out, &message.body_html);

                put(&mut out, format!("--{alt}--"));
            }
        }
    }

    Ok(out)
}
