use async_trait::async_trait;
use std::sync::Mutex;

use super::{MailError, Mailer};

/// A mock mailer that records sent emails for testing purposes.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct MockMailer {
    pub sent_invitation_emails: Mutex<Vec<(String, String, String)>>,
    pub fail_send: bool,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_invitation_email(
        &self,
        to: &str,
        company_name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        if self.fail_send {
            return Err(MailError::Other("mock failure".into()));
        }
        self.sent_invitation_emails.lock().unwrap().push((
            to.to_string(),
            company_name.to_string(),
            token.to_string(),
        ));
        Ok(())
    }
}
