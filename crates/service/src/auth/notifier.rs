use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use super::errors::AuthError;

/// Plain-text email handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AuthError>;
}

/// SMTP notifier backed by lettre's blocking transport.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(cfg: &configs::EmailConfig) -> Result<Self, AuthError> {
        let builder = if cfg.starttls {
            SmtpTransport::starttls_relay(&cfg.host)
                .map_err(|e| AuthError::Internal(format!("smtp relay: {e}")))?
        } else {
            SmtpTransport::builder_dangerous(&cfg.host)
        };
        let mut builder = builder.port(cfg.port).timeout(Some(Duration::from_secs(10)));
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()));
        }
        let from: Mailbox = cfg
            .from
            .parse()
            .map_err(|e| AuthError::Internal(format!("invalid from address: {e}")))?;

        tracing::info!(host = %cfg.host, port = cfg.port, starttls = cfg.starttls, "smtp notifier initialized");
        Ok(Self { mailer: builder.build(), from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), AuthError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AuthError::Internal(format!("invalid recipient: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // lettre's SmtpTransport blocks; keep it off the async workers
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %email.to, subject = %email.subject, "email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %email.to, error = %e, "failed to send email");
                Err(AuthError::Internal(e.to_string()))
            }
        }
    }
}

/// In-memory notifier for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockNotifier {
        sent: Mutex<Vec<Email>>,
        fail: AtomicBool,
    }

    impl MockNotifier {
        /// A notifier whose every send fails.
        pub fn failing() -> Self {
            let n = Self::default();
            n.set_failing(true);
            n
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<Email> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, email: &Email) -> Result<(), AuthError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::Internal("smtp unavailable".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
