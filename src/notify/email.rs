// src/notify/email.rs
use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{render, Delivery, DigestContext, DigestSink};
use crate::config::digest::{EmailCfg, SmtpCfg};

/// HTML digest over SMTP. The transport is built per delivery so a bad host
/// shows up as a failed sink rather than a startup error.
pub struct EmailSender {
    smtp: SmtpCfg,
    email: EmailCfg,
}

impl EmailSender {
    pub fn new(smtp: SmtpCfg, email: EmailCfg) -> Self {
        Self { smtp, email }
    }

    /// Reason to skip, if host, sender or recipients are missing.
    pub fn missing_config(&self) -> Option<&'static str> {
        if self.smtp.host.trim().is_empty() {
            Some("SMTP host not configured")
        } else if self.email.from.trim().is_empty() {
            Some("email sender not configured")
        } else if self.email.to.iter().all(|t| t.trim().is_empty()) {
            Some("no email recipients configured")
        } else {
            None
        }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self.smtp.host.trim();
        // secure = implicit TLS (465); otherwise STARTTLS (587)
        let mut builder = if self.smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .with_context(|| format!("invalid SMTP host {host}"))?;

        if let Some(port) = self.smtp.port {
            builder = builder.port(port);
        }
        if !self.smtp.user.is_empty() {
            builder = builder.credentials(Credentials::new(self.smtp.user.clone(), self.smtp.pass.clone()));
        }
        Ok(builder.build())
    }

    pub fn build_message(&self, ctx: &DigestContext) -> Result<Message> {
        let from: Mailbox = self
            .email
            .from
            .parse()
            .with_context(|| format!("invalid email from {:?}", self.email.from))?;

        let mut builder = Message::builder().from(from).subject(ctx.heading());
        let mut recipients = 0;
        for addr in self.email.to.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let to: Mailbox = addr
                .parse()
                .with_context(|| format!("invalid email recipient {addr:?}"))?;
            builder = builder.to(to);
            recipients += 1;
        }
        if recipients == 0 {
            return Err(anyhow!("no email recipients"));
        }

        builder
            .header(header::ContentType::TEXT_HTML)
            .body(render::render_email(ctx))
            .context("build email")
    }
}

#[async_trait::async_trait]
impl DigestSink for EmailSender {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, ctx: &DigestContext) -> Result<Delivery> {
        if let Some(reason) = self.missing_config() {
            return Ok(Delivery::Skipped(reason.to_string()));
        }
        let msg = self.build_message(ctx)?;
        let mailer = self.transport()?;
        let resp = mailer.send(msg).await.context("send email")?;
        let detail = resp.message().collect::<Vec<_>>().join(" ");
        Ok(Delivery::Delivered(format!("{} recipient(s): {detail}", self.email.to.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ctx() -> DigestContext {
        DigestContext {
            slug: "2025-06-10".into(),
            generated_at: Utc::now(),
            title: "AI Daily Digest".into(),
            page_url: "https://example.com/news/2025-06-10".into(),
            items: vec![],
        }
    }

    #[tokio::test]
    async fn skipped_without_host() {
        let s = EmailSender::new(SmtpCfg::default(), EmailCfg::default());
        let out = s.deliver(&ctx()).await.unwrap();
        assert_eq!(out, Delivery::Skipped("SMTP host not configured".into()));
    }

    #[test]
    fn message_carries_subject_and_recipients() {
        let s = EmailSender::new(
            SmtpCfg {
                host: "smtp.example.com".into(),
                ..SmtpCfg::default()
            },
            EmailCfg {
                from: "Digest <digest@example.com>".into(),
                to: vec!["a@example.com".into(), " ".into(), "b@example.com".into()],
            },
        );
        assert!(s.missing_config().is_none());
        let msg = s.build_message(&ctx()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("Subject:"));
    }

    #[test]
    fn bad_sender_is_an_error() {
        let s = EmailSender::new(
            SmtpCfg {
                host: "smtp.example.com".into(),
                ..SmtpCfg::default()
            },
            EmailCfg {
                from: "not an address".into(),
                to: vec!["a@example.com".into()],
            },
        );
        assert!(s.build_message(&ctx()).is_err());
    }
}
