//! Account email notifications.
//!
//! Welcome and password-reset mail, behind a trait so handlers and the
//! collaborator directory can run against a recording mock in tests. The set
//! link in both bodies is keyed by the user's current credential hash, which
//! is what makes the link single-use: setting a password changes the hash and
//! invalidates the link.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use portal_core::error::Fault;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::models::User;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome_email(
        &self,
        user: &User,
        referrer: &User,
        base_url: &str,
    ) -> Result<(), Fault>;

    async fn send_reset_email(&self, user: &User, base_url: &str) -> Result<(), Fault>;
}

pub fn set_password_link(base_url: &str, password_hash: &str, reset: bool) -> String {
    let link = format!(
        "{}/users/set_password/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(password_hash)
    );
    if reset {
        format!("{}?reset=true", link)
    } else {
        link
    }
}

pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, Fault> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| Fault::Internal(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email notifier initialized");

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), Fault> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| Fault::Internal(e.into()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| Fault::Internal(e.into()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Fault::Internal(e.into()))?;

        // Send on the blocking pool so SMTP I/O never stalls the runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| Fault::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(Fault::Internal(anyhow::anyhow!(e.to_string())))
            }
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_welcome_email(
        &self,
        user: &User,
        referrer: &User,
        base_url: &str,
    ) -> Result<(), Fault> {
        let body = format!(
            "\n    Hi there {full_name}--\n\n    {referrer} has added you as a collaborator in \
             the genomics portal.\n\n    Please click this link to set up your account:\n    \
             {link}\n\n    Thanks!\n    ",
            full_name = user.display_name(),
            referrer = referrer.full_name_or_email(),
            link = set_password_link(base_url, &user.password_hash, false),
        );
        self.send(&user.email, "Set up your account", &body).await
    }

    async fn send_reset_email(&self, user: &User, base_url: &str) -> Result<(), Fault> {
        let body = format!(
            "\n        Hi there {full_name}--\n\n        Please click this link to reset your \
             password:\n        {link}\n        ",
            full_name = user.display_name(),
            link = set_password_link(base_url, &user.password_hash, true),
        );
        self.send(&user.email, "Reset your password", &body).await
    }
}

/// One recorded send, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub kind: SentEmailKind,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentEmailKind {
    Welcome,
    Reset,
}

/// Records sends; can be armed to fail with a given message.
#[derive(Default)]
pub struct MockNotifier {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail_with: Mutex<Option<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, user: &User, kind: SentEmailKind, base_url: &str, reset: bool) -> Result<(), Fault> {
        if let Some(message) = self.fail_with.lock().unwrap().take() {
            return Err(Fault::Internal(anyhow::anyhow!(message)));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: user.email.clone(),
            kind,
            link: set_password_link(base_url, &user.password_hash, reset),
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_welcome_email(
        &self,
        user: &User,
        _referrer: &User,
        base_url: &str,
    ) -> Result<(), Fault> {
        self.record(user, SentEmailKind::Welcome, base_url, false)
    }

    async fn send_reset_email(&self, user: &User, base_url: &str) -> Result<(), Fault> {
        self.record(user, SentEmailKind::Reset, base_url, true)
    }
}
