use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Notifier, RunReport};

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} missing"))
}

impl EmailNotifier {
    /// `Ok(None)` when SMTP_HOST is unset. Once it is set, the remaining
    /// variables are required. NOTIFY_EMAIL_TO may hold a comma-separated list.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let user = required("SMTP_USER")?;
        let pass = required("SMTP_PASS")?;
        let from_addr = required("NOTIFY_EMAIL_FROM")?;
        let to_addrs = required("NOTIFY_EMAIL_TO")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .with_context(|| format!("invalid SMTP_HOST {host:?}"))?
            .credentials(Credentials::new(user, pass))
            .build();

        let from = from_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addrs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Mailbox>().with_context(|| format!("invalid recipient {s:?}")))
            .collect::<Result<Vec<Mailbox>>>()?;
        if to.is_empty() {
            anyhow::bail!("NOTIFY_EMAIL_TO has no recipients");
        }

        Ok(Some(Self { mailer, from, to }))
    }

    pub fn build_message(&self, report: &RunReport) -> Result<Message> {
        let mut b = Message::builder()
            .from(self.from.clone())
            .subject(report.subject())
            .header(header::ContentType::TEXT_PLAIN);
        for rcpt in &self.to {
            b = b.to(rcpt.clone());
        }
        b.body(report.body()).context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, report: &RunReport) -> Result<()> {
        let msg = self.build_message(report)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
