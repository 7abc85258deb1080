use std::collections::VecDeque;

use crate::{NoticeId, NoticeKind};

/// How long a notice stays fully visible before it starts to fade.
pub const NOTICE_VISIBLE_MS: u64 = 5_000;
/// How long the fade lasts before the notice is removed outright.
pub const NOTICE_FADE_MS: u64 = 300;
pub const DEFAULT_NOTICE_CAP: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub message: String,
    pub kind: NoticeKind,
    pub phase: NoticePhase,
    pub posted_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeEvent {
    Evicted(NoticeId),
    Faded(NoticeId),
    Expired(NoticeId),
}

/// Bounded queue of transient notices. Every phase change is driven by the
/// caller's clock (`now_ms`, milliseconds since app start); the board never
/// reads wall time itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    cap: usize,
    next_id: i64,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_CAP)
    }
}

impl NoticeBoard {
    pub fn new(cap: usize) -> Self {
        Self {
            notices: VecDeque::new(),
            cap: cap.max(1),
            next_id: 1,
        }
    }

    /// Posts a notice, evicting the oldest entry first when the board is at
    /// capacity.
    pub fn post(
        &mut self,
        message: impl Into<String>,
        kind: NoticeKind,
        now_ms: u64,
    ) -> (NoticeId, Vec<NoticeEvent>) {
        let mut events = Vec::new();
        while self.notices.len() >= self.cap {
            if let Some(evicted) = self.notices.pop_front() {
                events.push(NoticeEvent::Evicted(evicted.id));
            }
        }

        let id = NoticeId::new(self.next_id);
        self.next_id += 1;
        self.notices.push_back(Notice {
            id,
            message: message.into(),
            kind,
            phase: NoticePhase::Visible,
            posted_at_ms: now_ms,
        });
        (id, events)
    }

    /// Advances every notice's lifecycle to `now_ms`:
    /// Visible -> FadingOut after `NOTICE_VISIBLE_MS`, removal a further
    /// `NOTICE_FADE_MS` later.
    pub fn tick(&mut self, now_ms: u64) -> Vec<NoticeEvent> {
        let mut events = Vec::new();
        for notice in &mut self.notices {
            if notice.phase == NoticePhase::Visible
                && now_ms >= notice.posted_at_ms + NOTICE_VISIBLE_MS
            {
                notice.phase = NoticePhase::FadingOut;
                events.push(NoticeEvent::Faded(notice.id));
            }
        }
        self.notices.retain(|notice| {
            let expired = notice.phase == NoticePhase::FadingOut
                && now_ms >= notice.posted_at_ms + NOTICE_VISIBLE_MS + NOTICE_FADE_MS;
            if expired {
                events.push(NoticeEvent::Expired(notice.id));
            }
            !expired
        });
        events
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::{NOTICE_FADE_MS, NOTICE_VISIBLE_MS, NoticeBoard, NoticeEvent, NoticePhase};
    use crate::NoticeKind;

    #[test]
    fn posted_notice_is_visible_and_newest() {
        let mut board = NoticeBoard::default();
        board.post("saved", NoticeKind::Success, 0);
        let (id, _) = board.post("second", NoticeKind::Info, 10);

        assert_eq!(board.len(), 2);
        let newest = board.iter().last().expect("board has entries");
        assert_eq!(newest.id, id);
        assert_eq!(newest.phase, NoticePhase::Visible);
    }

    #[test]
    fn notice_fades_then_expires_on_schedule() {
        let mut board = NoticeBoard::default();
        let (id, _) = board.post("saved", NoticeKind::Success, 100);

        assert!(board.tick(100 + NOTICE_VISIBLE_MS - 1).is_empty());

        let events = board.tick(100 + NOTICE_VISIBLE_MS);
        assert_eq!(events, vec![NoticeEvent::Faded(id)]);
        assert_eq!(
            board.iter().next().map(|notice| notice.phase),
            Some(NoticePhase::FadingOut)
        );

        // Still present one tick before the fade completes.
        assert!(board.tick(100 + NOTICE_VISIBLE_MS + NOTICE_FADE_MS - 1).is_empty());
        assert_eq!(board.len(), 1);

        let events = board.tick(100 + NOTICE_VISIBLE_MS + NOTICE_FADE_MS);
        assert_eq!(events, vec![NoticeEvent::Expired(id)]);
        assert!(board.is_empty());
    }

    #[test]
    fn notices_stack_in_insertion_order() {
        let mut board = NoticeBoard::default();
        board.post("first", NoticeKind::Info, 0);
        board.post("second", NoticeKind::Info, 1);
        board.post("third", NoticeKind::Info, 2);

        let messages: Vec<&str> = board.iter().map(|notice| notice.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn board_at_capacity_evicts_the_oldest() {
        let mut board = NoticeBoard::new(2);
        let (first, _) = board.post("first", NoticeKind::Info, 0);
        board.post("second", NoticeKind::Info, 1);

        let (_, events) = board.post("third", NoticeKind::Info, 2);
        assert_eq!(events, vec![NoticeEvent::Evicted(first)]);
        assert_eq!(board.len(), 2);
        let messages: Vec<&str> = board.iter().map(|notice| notice.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "third"]);
    }

    #[test]
    fn zero_cap_is_clamped_to_one() {
        let mut board = NoticeBoard::new(0);
        assert_eq!(board.cap(), 1);
        board.post("only", NoticeKind::Info, 0);
        board.post("replacement", NoticeKind::Info, 1);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn stale_ticks_do_not_resurrect_expired_notices() {
        let mut board = NoticeBoard::default();
        board.post("gone", NoticeKind::Warning, 0);
        board.tick(NOTICE_VISIBLE_MS + NOTICE_FADE_MS + 1_000);
        assert!(board.is_empty());
        assert!(board.tick(u64::MAX).is_empty());
    }
}
