// Snapshot Replay
//
// Non-blocking counterpart of the stream channel: everything a
// fresh stream at `cursor` would deliver before it first waits.

use crate::channel::StreamItem;
use crate::log::{AppendLog, RecordStore};

/// Replay `[cursor, len)` as stream messages, in log order.
///
/// A cursor at or past the end yields nothing.
pub fn replay_from<S: RecordStore>(log: &AppendLog<S>, cursor: u64) -> Vec<StreamItem> {
    log.read_from(cursor)
        .into_iter()
        .map(|record| StreamItem { record })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::StreamChannel;
    use crate::config::ChannelConfig;
    use crate::log::Record;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn replay_from_middle() {
        let log = AppendLog::from_records([Record(10), Record(20), Record(30)]);
        let records: Vec<i64> = replay_from(&log, 1).iter().map(|i| i.record.0).collect();
        assert_eq!(records, vec![20, 30]);
    }

    #[test]
    fn replay_past_end_is_empty() {
        let log = AppendLog::from_records([Record(10)]);
        assert!(replay_from(&log, 1).is_empty());
        assert!(replay_from(&log, 40).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replay_matches_stream_backlog() {
        let log = Arc::new(AppendLog::from_records((0..20).map(Record)));
        let snapshot = replay_from(&log, 5);

        let mut channel = StreamChannel::open(log.clone(), 5, &ChannelConfig::default());
        let cancel = CancellationToken::new();
        for expected in snapshot {
            assert_eq!(channel.next(&cancel).await, Some(expected));
        }
        assert_eq!(channel.cursor(), log.len());
    }
}
