//! A [`Mailer`] that writes each notification to a directory as an `.eml` file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use booking_engine::error::Result as BookingResult;
use booking_engine::mail::MailKind;
use booking_engine::{BookingError, Mailer, OutgoingMail};
use chrono::Utc;

pub struct DirOutbox {
    dir: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl DirOutbox {
    /// Create `dir` if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create outbox: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: Mutex::new(Vec::new()),
        })
    }

    pub fn written(&self) -> Result<Vec<PathBuf>> {
        self.written
            .lock()
            .map(|w| w.clone())
            .map_err(|_| anyhow::anyhow!("outbox lock poisoned"))
    }
}

impl Mailer for DirOutbox {
    fn send(&self, mail: &OutgoingMail) -> BookingResult<()> {
        let kind = match mail.kind {
            MailKind::Client => "client",
            MailKind::Admin => "admin",
        };
        let name = format!("{}-{kind}.eml", Utc::now().format("%Y%m%dT%H%M%S%3f"));
        let path = self.dir.join(name);

        fs::write(&path, mail.to_eml()?)
            .map_err(|e| BookingError::Mail(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), to = %mail.to, "notification written");

        self.written
            .lock()
            .map_err(|_| BookingError::Mail("outbox lock poisoned".into()))?
            .push(path);
        Ok(())
    }
}
