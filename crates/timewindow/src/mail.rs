//! Outbound mail.
//!
//! Delivery itself belongs to whatever transport the host application
//! configures; this module only assembles the message and hands it over.

use std::io::Read;

use tracing::{debug, warn};

use crate::error::{Result, TimeWindowError};

/// A file attached to a [`MailMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// Read all of `stream` into a generic binary attachment named `filename`.
    pub fn octet_stream<R: Read>(mut stream: R, filename: &str) -> Result<Self> {
        let mut content = Vec::new();
        stream.read_to_end(&mut content).map_err(|e| {
            TimeWindowError::Mail(format!("cannot read attachment '{filename}': {e}"))
        })?;
        Ok(Self {
            filename: filename.to_string(),
            content_type: "application/octet-stream".to_string(),
            content,
        })
    }

    /// The `Content-Disposition` header value for this attachment.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// A fully assembled outbound message. The body is always HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
    pub attachments: Vec<Attachment>,
}

/// Capability that delivers a message.
pub trait MailTransport {
    fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Assemble an HTML message and deliver it through `transport`.
///
/// # Errors
///
/// [`TimeWindowError::Mail`] if `recipients` is empty (the transport is not
/// called), or whatever the transport reports.
pub fn send_mail<M: MailTransport + ?Sized>(
    transport: &M,
    subject: &str,
    body: &str,
    from: &str,
    recipients: &[String],
    attachments: Vec<Attachment>,
) -> Result<()> {
    if recipients.is_empty() {
        warn!(subject, "refusing to send mail without recipients");
        return Err(TimeWindowError::Mail(format!(
            "no recipients for '{subject}'"
        )));
    }

    let message = MailMessage {
        subject: subject.to_string(),
        body: body.to_string(),
        from: from.to_string(),
        to: recipients.to_vec(),
        attachments,
    };
    transport.send(&message)?;
    debug!(subject, recipients = recipients.len(), "mail handed to transport");
    Ok(())
}
