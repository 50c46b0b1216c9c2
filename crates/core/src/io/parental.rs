use tokio::sync::mpsc;

use crate::types::ParentalNotice;

/// Forward channel sender; the session pushes guardian notices here.
pub type ParentalSender = mpsc::UnboundedSender<ParentalNotice>;
/// Forward channel receiver, drained by an external notifier.
pub type ParentalReceiver = mpsc::UnboundedReceiver<ParentalNotice>;

/// Create a forward channel for parental notices.
pub fn channel() -> (ParentalSender, ParentalReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, thiserror::Error)]
#[error("parental notice channel closed")]
pub struct SinkError;

/// Append-only guardian audit trail. Core logic only writes to it;
/// `records` exists for the external collaborator.
#[derive(Debug, Default)]
pub struct ParentalLog {
    records: Vec<ParentalNotice>,
    forward: Option<ParentalSender>,
}

impl ParentalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every notice over `tx`.
    pub fn with_forward(tx: ParentalSender) -> Self {
        Self {
            records: Vec::new(),
            forward: Some(tx),
        }
    }

    /// Record a notice. The local record is always kept; the error only
    /// reports that forwarding failed.
    pub fn notify(&mut self, message: impl Into<String>) -> Result<(), SinkError> {
        let notice = ParentalNotice::new(message);
        tracing::info!(message = %notice.message, "parental notification");
        self.records.push(notice.clone());
        match &self.forward {
            Some(tx) => tx.send(notice).map_err(|_| SinkError),
            None => Ok(()),
        }
    }

    pub fn records(&self) -> &[ParentalNotice] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_appends_in_order() {
        let mut log = ParentalLog::new();
        log.notify("first").unwrap();
        log.notify("second").unwrap();
        let msgs: Vec<&str> = log.records().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn notify_forwards_to_channel() {
        let (tx, mut rx) = channel();
        let mut log = ParentalLog::with_forward(tx);
        log.notify("escalation").unwrap();
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.message, "escalation");
    }

    #[test]
    fn closed_channel_reports_error_but_keeps_record() {
        let (tx, rx) = channel();
        drop(rx);
        let mut log = ParentalLog::with_forward(tx);
        assert!(log.notify("lost").is_err());
        assert_eq!(log.len(), 1);
    }
}
