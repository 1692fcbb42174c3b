//! Background tasks
//!
//! Email delivery is decoupled from the request path: handlers enqueue
//! jobs on an in-process channel and return immediately; a worker task
//! drains the queue and talks SMTP. A failed send is logged as a failed
//! job and not retried.
//!
//! The daily greeting task runs on an interval, picks one random published
//! person and enqueues a greeting for every matching user.

use crate::config::GreetingConfig;
use crate::db::{person_repo, user_repo};
use crate::error::Result;
use crate::services::EmailService;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One unit of deliverable mail.
#[derive(Debug, Clone)]
pub enum EmailJob {
    Registration {
        email: String,
        username: String,
    },
    PasswordReset {
        email: String,
        subject: String,
        message: String,
    },
    Greeting {
        email: String,
        username: String,
        person_title: String,
    },
}

impl EmailJob {
    fn kind(&self) -> &'static str {
        match self {
            EmailJob::Registration { .. } => "registration",
            EmailJob::PasswordReset { .. } => "password_reset",
            EmailJob::Greeting { .. } => "greeting",
        }
    }
}

/// Cloneable handle for enqueueing mail from handlers.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::UnboundedSender<EmailJob>,
}

impl EmailQueue {
    /// Fire-and-forget enqueue. A closed queue is logged, never surfaced
    /// to the request path.
    pub fn enqueue(&self, job: EmailJob) {
        let kind = job.kind();
        if self.tx.send(job).is_err() {
            error!("email queue closed, {} job dropped", kind);
        }
    }
}

/// Spawn the email worker and return its queue handle.
pub fn start_email_worker(
    email_service: Arc<EmailService>,
) -> (EmailQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<EmailJob>();

    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let kind = job.kind();
            let result = match &job {
                EmailJob::Registration { email, username } => {
                    email_service.send_registration_email(email, username)
                }
                EmailJob::PasswordReset {
                    email,
                    subject,
                    message,
                } => email_service.send_password_reset_email(email, subject, message),
                EmailJob::Greeting {
                    email,
                    username,
                    person_title,
                } => email_service.send_greeting_email(email, username, person_title),
            };

            match result {
                Ok(()) => info!("{} email sent", kind),
                Err(e) => error!("{} email job failed: {}", kind, e),
            }
        }
    });

    (EmailQueue { tx }, handle)
}

/// One greeting round: pick a random published person and enqueue a mail
/// for every active user in the recipient domain. Returns the number of
/// greetings queued.
pub async fn run_greeting_round(
    pool: &PgPool,
    queue: &EmailQueue,
    recipient_domain: &str,
) -> Result<usize> {
    let person = match person_repo::random_published(pool).await? {
        Some(person) => person,
        None => {
            warn!("greeting round skipped, no published persons");
            return Ok(0);
        }
    };

    let users = user_repo::list_active_by_email_domain(pool, recipient_domain).await?;
    let count = users.len();

    for user in users {
        queue.enqueue(EmailJob::Greeting {
            email: user.email,
            username: user.username,
            person_title: person.title.clone(),
        });
    }

    info!(person = %person.title, count, "greeting round queued");
    Ok(count)
}

/// Spawn the interval-driven greeting job.
pub fn spawn_greeting_job(
    pool: PgPool,
    queue: EmailQueue,
    config: GreetingConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(config.interval_secs.max(1));
        loop {
            tokio::time::sleep(period).await;
            if let Err(e) = run_greeting_round(&pool, &queue, &config.recipient_domain).await {
                error!("greeting round failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_labels() {
        let job = EmailJob::Registration {
            email: "a@b.c".to_string(),
            username: "a".to_string(),
        };
        assert_eq!(job.kind(), "registration");
    }

    #[tokio::test]
    async fn test_enqueue_delivers_to_worker_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<EmailJob>();
        let queue = EmailQueue { tx };

        queue.enqueue(EmailJob::PasswordReset {
            email: "a@b.c".to_string(),
            subject: "Reset".to_string(),
            message: "body".to_string(),
        });

        let job = rx.recv().await.expect("job should arrive");
        assert_eq!(job.kind(), "password_reset");
    }

    #[tokio::test]
    async fn test_enqueue_after_close_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel::<EmailJob>();
        drop(rx);
        let queue = EmailQueue { tx };
        queue.enqueue(EmailJob::Registration {
            email: "a@b.c".to_string(),
            username: "a".to_string(),
        });
    }
}
