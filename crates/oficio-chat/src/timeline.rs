// SPDX-FileCopyrightText: 2026 Oficio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges messages and the current budget into one ordered timeline.
//!
//! Pure and deterministic: no I/O, no clock, inputs never mutated. The
//! budget slots into the conversation at the moment its quote was set
//! (`updated_at_ms`); a zero-price budget is a pending request placeholder
//! and never renders as a timeline entry.

use oficio_core::types::{Budget, Message};

/// What a timeline entry displays.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineKind {
    Message(Message),
    Budget(Budget),
}

/// A display-ready unit in the merged chat view.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineItem {
    /// Epoch-millisecond ordering key.
    pub sort_key: i64,
    /// Stable display id: `message:<id>` or `budget:<id>`.
    pub display_id: String,
    pub kind: TimelineKind,
}

/// Merge a chat's messages and its current budget into a chronologically
/// ordered, duplicate-free timeline.
///
/// Every message is included unconditionally. The budget is included only
/// when present with a price above zero. The sort is stable and ascending:
/// items sharing a millisecond keep their input relative order, messages
/// before the budget.
pub fn merge_timeline(messages: &[Message], budget: Option<&Budget>) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = messages
        .iter()
        .map(|msg| TimelineItem {
            sort_key: msg.created_at_ms,
            display_id: format!("message:{}", msg.id),
            kind: TimelineKind::Message(msg.clone()),
        })
        .collect();

    if let Some(budget) = budget
        && !budget.is_placeholder()
    {
        items.push(TimelineItem {
            sort_key: budget.timeline_key(),
            display_id: format!("budget:{}", budget.id),
            kind: TimelineKind::Budget(budget.clone()),
        });
    }

    items.sort_by_key(|item| item.sort_key);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use oficio_core::types::{BudgetStatus, ChatId, MessageId, MessageKind};
    use proptest::prelude::*;

    fn message(id: &str, created_at_ms: i64) -> Message {
        Message {
            id: MessageId(id.into()),
            chat_id: ChatId("chat-1".into()),
            sender_id: "client-1".into(),
            kind: MessageKind::Text,
            content: Some("hi".into()),
            media_ref: None,
            audio_duration_secs: None,
            created_at_ms,
            is_read: false,
        }
    }

    fn budget(id: &str, price: &str, created: i64, updated: i64) -> Budget {
        Budget {
            id: id.into(),
            chat_id: ChatId("chat-1".into()),
            service_id: "svc-1".into(),
            price: price.into(),
            description: None,
            status: BudgetStatus::Quoted,
            created_at_ms: created,
            updated_at_ms: updated,
            expires_at_ms: None,
        }
    }

    #[test]
    fn empty_inputs_yield_empty_timeline() {
        assert!(merge_timeline(&[], None).is_empty());
        // A zero-price budget is a placeholder, not an entry.
        assert!(merge_timeline(&[], Some(&budget("b1", "0", 500, 1500))).is_empty());
    }

    #[test]
    fn single_message_passes_through() {
        let messages = [message("1", 1000)];
        let timeline = merge_timeline(&messages, None);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].display_id, "message:1");
        assert_eq!(timeline[0].sort_key, 1000);
    }

    #[test]
    fn quoted_budget_sorts_by_updated_at() {
        let timeline = merge_timeline(&[], Some(&budget("b1", "150.00", 500, 1500)));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].display_id, "budget:b1");
        assert_eq!(timeline[0].sort_key, 1500);
    }

    #[test]
    fn budget_slots_between_messages() {
        let messages = [message("1", 1000), message("2", 2000)];
        let timeline = merge_timeline(&messages, Some(&budget("b1", "80.00", 100, 1500)));
        let ids: Vec<&str> = timeline.iter().map(|i| i.display_id.as_str()).collect();
        assert_eq!(ids, ["message:1", "budget:b1", "message:2"]);
    }

    #[test]
    fn millisecond_ties_keep_input_order() {
        let messages = [message("a", 1000), message("b", 1000)];
        let timeline = merge_timeline(&messages, Some(&budget("b1", "80.00", 100, 1000)));
        let ids: Vec<&str> = timeline.iter().map(|i| i.display_id.as_str()).collect();
        // Stable sort: messages in input order, budget (pushed last) after them.
        assert_eq!(ids, ["message:a", "message:b", "budget:b1"]);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let messages = [message("2", 2000), message("1", 1000)];
        let before = messages.to_vec();
        let _ = merge_timeline(&messages, None);
        assert_eq!(messages.to_vec(), before);
    }

    fn arb_messages() -> impl Strategy<Value = Vec<Message>> {
        prop::collection::vec((0i64..100_000, "[a-z0-9]{1,8}"), 0..24).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (ts, id))| message(&format!("{id}-{i}"), ts))
                .collect()
        })
    }

    fn arb_budget() -> impl Strategy<Value = Option<Budget>> {
        prop::option::of((0i64..100_000, 0i64..100_000, prop::bool::ANY).prop_map(
            |(created, updated, quoted)| {
                budget("b1", if quoted { "99.90" } else { "0" }, created, updated)
            },
        ))
    }

    proptest! {
        #[test]
        fn merge_is_deterministic(messages in arb_messages(), budget in arb_budget()) {
            let first = merge_timeline(&messages, budget.as_ref());
            let second = merge_timeline(&messages, budget.as_ref());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn merge_is_chronologically_ordered(messages in arb_messages(), budget in arb_budget()) {
            let timeline = merge_timeline(&messages, budget.as_ref());
            for pair in timeline.windows(2) {
                prop_assert!(pair[0].sort_key <= pair[1].sort_key);
            }
        }

        #[test]
        fn merge_includes_every_message_exactly_once(
            messages in arb_messages(),
            budget in arb_budget(),
        ) {
            let timeline = merge_timeline(&messages, budget.as_ref());
            let message_count = timeline
                .iter()
                .filter(|i| matches!(i.kind, TimelineKind::Message(_)))
                .count();
            prop_assert_eq!(message_count, messages.len());

            let budget_count = timeline
                .iter()
                .filter(|i| matches!(i.kind, TimelineKind::Budget(_)))
                .count();
            let expected = usize::from(budget.as_ref().is_some_and(|b| !b.is_placeholder()));
            prop_assert_eq!(budget_count, expected);
        }
    }
}
