use crate::config::MailConfig;
use crate::types::{DigestError, Result};
use chrono::{DateTime, Utc};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// SMTP delivery of the finished digest.
///
/// When a note URL exists the email is a short link message; otherwise the
/// full report goes out as plain text plus an HTML rendering. Both variants
/// are sent as a multipart/alternative message.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| DigestError::Mail(format!("SMTP relay setup failed: {e}")))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, config })
    }

    pub async fn send_digest(
        &self,
        note_url: Option<&str>,
        report: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let subject = format!("Daily Tech News Digest - {}", now.format("%Y-%m-%d"));
        let (plain, html) = match note_url {
            Some(url) => (link_email_text(url, now), link_email_html(url, now)),
            None => (report.to_string(), markdown_to_html(report)),
        };

        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| DigestError::Mail(format!("invalid sender address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in &self.config.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| DigestError::Mail(format!("invalid recipient {recipient}: {e}")))?;
            builder = builder.to(to);
        }
        debug!(recipients = self.config.recipients.len(), "Sending digest email");

        let message = builder
            .multipart(MultiPart::alternative_plain_html(plain, html))
            .map_err(|e| DigestError::Mail(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DigestError::Mail(e.to_string()))?;

        info!(
            recipients = self.config.recipients.len(),
            "Digest email delivered"
        );
        Ok(())
    }
}

fn link_email_text(note_url: &str, now: DateTime<Utc>) -> String {
    format!(
        "Today's tech news digest is ready.\n\n\
         Read the full report here: {note_url}\n\n\
         The report groups the day's stories by topic, highlights the most\n\
         important items and closes with a short trend analysis.\n\n\
         Generated automatically at {} UTC.\n",
        now.format("%Y-%m-%d %H:%M")
    )
}

fn link_email_html(note_url: &str, now: DateTime<Utc>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1>Daily Tech News Digest</h1>
  <p>Today's tech news digest is ready.</p>
  <p><a href="{note_url}" style="display: inline-block; padding: 12px 24px; background: #3498db; color: #fff; text-decoration: none; border-radius: 6px;">Read the full report</a></p>
  <p>The report groups the day's stories by topic, highlights the most important
  items and closes with a short trend analysis.</p>
  <hr>
  <p style="color: #7f8c8d; font-size: 0.9em;">Generated automatically at {} UTC.</p>
</body>
</html>"#,
        now.format("%Y-%m-%d %H:%M")
    )
}

/// Minimal markdown to HTML conversion for the full-report email body.
/// Covers the constructs the fallback renderer emits: headings, rules, list
/// items, bold spans and links.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut body = String::new();
    for line in markdown.lines() {
        let line = line.trim_end();
        if let Some(rest) = line.strip_prefix("### ") {
            body.push_str(&format!("<h3>{}</h3>\n", inline_html(rest)));
        } else if let Some(rest) = line.strip_prefix("## ") {
            body.push_str(&format!("<h2>{}</h2>\n", inline_html(rest)));
        } else if let Some(rest) = line.strip_prefix("# ") {
            body.push_str(&format!("<h1>{}</h1>\n", inline_html(rest)));
        } else if line == "---" {
            body.push_str("<hr>\n");
        } else if line.len() > 2
            && line.starts_with('*')
            && line.ends_with('*')
            && !line.starts_with("**")
        {
            // whole-line emphasis, e.g. the generated-at header
            body.push_str(&format!(
                "<p><em>{}</em></p>\n",
                inline_html(&line[1..line.len() - 1])
            ));
        } else if let Some(rest) = line.strip_prefix("- ") {
            body.push_str(&format!("<p>&bull; {}</p>\n", inline_html(rest)));
        } else if line.is_empty() {
            // collapse blank lines
        } else {
            body.push_str(&format!("<p>{}</p>\n", inline_html(line)));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: sans-serif; max-width: 800px; margin: 0 auto; padding: 20px;">
{body}</body>
</html>"#
    )
}

/// Convert `**bold**` and `[text](url)` spans.
fn inline_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        // [text](url)
        if let Some((label, after_label)) = rest[start + 1..].split_once(']') {
            if let Some(url_part) = after_label.strip_prefix('(') {
                if let Some((url, tail)) = url_part.split_once(')') {
                    out.push_str(&rest[..start]);
                    out.push_str(&format!("<a href=\"{url}\">{label}</a>"));
                    rest = tail;
                    continue;
                }
            }
        }
        out.push_str(&rest[..=start]);
        rest = &rest[start + 1..];
    }
    out.push_str(rest);

    replace_paired(&out, "**", "<strong>", "</strong>")
}

fn replace_paired(text: &str, marker: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find(marker) {
            Some(start) => match rest[start + marker.len()..].find(marker) {
                Some(len) => {
                    out.push_str(&rest[..start]);
                    out.push_str(open);
                    out.push_str(&rest[start + marker.len()..start + marker.len() + len]);
                    out.push_str(close);
                    rest = &rest[start + 2 * marker.len() + len..];
                }
                None => break,
            },
            None => break,
        }
    }
    out.push_str(rest);
    out
}
