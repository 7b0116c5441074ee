//! Confirmation and admin notifications.
//!
//! Messages are composed here; delivery belongs to a [`Mailer`] supplied by
//! the host.

use std::fmt;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::ics::CalendarInvite;
use crate::model::Reservation;
use crate::template::{render, TemplateValues};

pub const INVITE_FILENAME: &str = "reservation.ics";

/// Raw bytes per RFC 2047 encoded word; 45 bytes of base64 keep each word
/// under the 75-character limit.
const ENCODED_WORD_BYTES: usize = 45;

/// A display name and an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub name: String,
    pub address: String,
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

impl Mailbox {
    /// The mailbox as a header value: a non-ASCII name becomes encoded words,
    /// an ASCII name with specials is quoted.
    pub fn header_value(&self) -> String {
        if self.name.is_empty() {
            return self.address.clone();
        }
        let name = if !self.name.is_ascii() {
            encode_header_text(&self.name)
        } else if self.name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
            format!("\"{}\"", self.name.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            self.name.clone()
        };
        format!("{name} <{}>", self.address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailKind {
    /// Confirmation to the visitor, with the calendar invite attached.
    Client,
    /// Notice to the administrator.
    Admin,
}

/// A fully composed message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub kind: MailKind,
    pub to: String,
    pub from: Mailbox,
    pub subject: String,
    /// Extra headers (MIME), in order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OutgoingMail {
    /// Render as an RFC 5322 message (`.eml`).
    ///
    /// Fails when a header value carries a line break. Non-ASCII subjects and
    /// display names are written as RFC 2047 encoded words.
    pub fn to_eml(&self) -> Result<String> {
        let fields = [
            ("From", self.from.name.as_str()),
            ("From", self.from.address.as_str()),
            ("To", self.to.as_str()),
            ("Subject", self.subject.as_str()),
        ];
        let extra = self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()));
        for (name, value) in fields.into_iter().chain(extra) {
            if name.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
                return Err(BookingError::Mail(format!(
                    "header {} contains a line break",
                    name.trim()
                )));
            }
        }

        let mut out = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n",
            self.from.header_value(),
            self.to,
            encode_header_text(&self.subject)
        );
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        Ok(out)
    }
}

/// Mail transport.
pub trait Mailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

impl<M: Mailer + ?Sized> Mailer for &M {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        (**self).send(mail)
    }
}

/// Keeps every message in memory instead of delivering it.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Result<Vec<OutgoingMail>> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .map_err(|_| BookingError::Mail("outbox lock poisoned".into()))
    }
}

impl Mailer for MemoryOutbox {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| BookingError::Mail("outbox lock poisoned".into()))?
            .push(mail.clone());
        Ok(())
    }
}

/// The visitor's confirmation: HTML text plus the invite as an attachment.
pub fn compose_client_mail(
    reservation: &Reservation,
    config: &BookingConfig,
    invite: &CalendarInvite,
    boundary: &str,
) -> Result<OutgoingMail> {
    let values = TemplateValues::for_reservation(reservation, &config.date_format)?;
    let message = render(&config.mail.client_message, &values);

    let body = format!(
        "--{boundary}\r\n\
         Content-Type: text/html; charset=UTF-8\r\n\
         Content-Transfer-Encoding: 8bit\r\n\r\n\
         {html}\r\n\r\n\
         --{boundary}\r\n\
         Content-Type: text/calendar; method=REQUEST; name=\"{INVITE_FILENAME}\"\r\n\
         Content-Disposition: attachment; filename=\"{INVITE_FILENAME}\"\r\n\
         Content-Transfer-Encoding: 8bit\r\n\r\n\
         {ics}\r\n\
         --{boundary}--\r\n",
        html = html_paragraphs(&message),
        ics = invite.to_ics(),
    );

    Ok(OutgoingMail {
        kind: MailKind::Client,
        to: reservation.requester.email.clone(),
        from: config.sender(),
        subject: render(&config.mail.client_subject, &values),
        headers: vec![
            ("MIME-Version".into(), "1.0".into()),
            (
                "Content-Type".into(),
                format!("multipart/mixed; boundary=\"{boundary}\""),
            ),
        ],
        body,
    })
}

/// The administrator's plain-text notice.
pub fn compose_admin_mail(reservation: &Reservation, config: &BookingConfig) -> Result<OutgoingMail> {
    let values = TemplateValues::for_reservation(reservation, &config.date_format)?;
    Ok(OutgoingMail {
        kind: MailKind::Admin,
        to: config.admin_recipient().to_string(),
        from: config.sender(),
        subject: render(&config.mail.admin_subject, &values),
        headers: vec![
            ("MIME-Version".into(), "1.0".into()),
            ("Content-Type".into(), "text/plain; charset=UTF-8".into()),
        ],
        body: render(&config.mail.admin_message, &values),
    })
}

/// ASCII text passes through; anything else becomes base64 encoded words,
/// split on character boundaries and folded onto continuation lines.
fn encode_header_text(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(format!("=?UTF-8?B?{}?=", STANDARD.encode(&chunk)));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("=?UTF-8?B?{}?=", STANDARD.encode(&chunk)));
    }
    words.join("\r\n ")
}

/// HTML-escape text and turn newlines into `<br />` line breaks.
fn html_paragraphs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br />\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escapes_markup_and_breaks_lines() {
        assert_eq!(
            html_paragraphs("Hi <b>Jo</b> & co\nbye"),
            "Hi &lt;b&gt;Jo&lt;/b&gt; &amp; co<br />\nbye"
        );
    }

    #[test]
    fn mailbox_without_name_is_bare_address() {
        let mb = Mailbox {
            name: String::new(),
            address: "a@example.com".into(),
        };
        assert_eq!(mb.to_string(), "a@example.com");
        assert_eq!(mb.header_value(), "a@example.com");
    }

    fn mail(from_name: &str, subject: &str) -> OutgoingMail {
        OutgoingMail {
            kind: MailKind::Admin,
            to: "admin@example.com".into(),
            from: Mailbox {
                name: from_name.into(),
                address: "desk@example.com".into(),
            },
            subject: subject.into(),
            headers: vec![("MIME-Version".into(), "1.0".into())],
            body: "body".into(),
        }
    }

    #[test]
    fn eml_refuses_line_breaks_in_headers() {
        let injected = mail("Desk", "New booking from Jane\r\nBcc: evil@attacker.example");
        assert!(matches!(injected.to_eml(), Err(BookingError::Mail(_))));

        let bare_cr = mail("Desk\rX-Extra: 1", "Hello");
        assert!(matches!(bare_cr.to_eml(), Err(BookingError::Mail(_))));

        let mut header = mail("Desk", "Hello");
        header.headers.push(("X-Note".into(), "a\nb".into()));
        assert!(header.to_eml().is_err());
    }

    #[test]
    fn eml_keeps_ascii_headers_readable() {
        let eml = mail("The team", "New booking").to_eml().unwrap();
        assert!(eml.starts_with(
            "From: The team <desk@example.com>\r\nTo: admin@example.com\r\nSubject: New booking\r\n"
        ));
        assert!(eml.ends_with("\r\n\r\nbody"));
    }

    #[test]
    fn eml_encodes_non_ascii_name_and_subject() {
        let eml = mail("L'équipe", "Réservation confirmée").to_eml().unwrap();
        let name = format!("=?UTF-8?B?{}?=", STANDARD.encode("L'équipe"));
        let subject = format!("=?UTF-8?B?{}?=", STANDARD.encode("Réservation confirmée"));
        assert!(eml.contains(&format!("From: {name} <desk@example.com>\r\n")));
        assert!(eml.contains(&format!("Subject: {subject}\r\n")));
        assert!(eml.is_ascii());
    }

    #[test]
    fn long_non_ascii_subject_folds_into_several_words() {
        let subject = "é".repeat(40);
        let encoded = encode_header_text(&subject);
        let words: Vec<&str> = encoded.split("\r\n ").collect();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.len() <= 75));
        let decoded: Vec<u8> = words
            .iter()
            .flat_map(|w| {
                let inner = w.trim_start_matches("=?UTF-8?B?").trim_end_matches("?=");
                STANDARD.decode(inner).unwrap()
            })
            .collect();
        assert_eq!(String::from_utf8(decoded).unwrap(), subject);
    }

    #[test]
    fn ascii_name_with_specials_is_quoted() {
        let mb = Mailbox {
            name: "Smith, Jane".into(),
            address: "jane@example.com".into(),
        };
        assert_eq!(mb.header_value(), "\"Smith, Jane\" <jane@example.com>");
    }

    #[test]
    fn poisoned_outbox_reports_an_error() {
        let outbox = std::sync::Arc::new(MemoryOutbox::new());
        let clone = std::sync::Arc::clone(&outbox);
        let _ = std::thread::spawn(move || {
            let _guard = clone.sent.lock().unwrap();
            panic!("poison the outbox");
        })
        .join();
        assert!(matches!(outbox.sent(), Err(BookingError::Mail(_))));
        assert!(outbox.send(&mail("Desk", "Hello")).is_err());
    }
}
