use agentchat::api::ContextMessage;
use agentchat::history::ConversationHistory;
use agentchat::models::{ChatTurn, Role};

fn filled(capacity: usize, count: usize) -> ConversationHistory {
    let mut history = ConversationHistory::new(capacity);
    for i in 0..count {
        let turn = if i % 2 == 0 {
            ChatTurn::user(format!("question {}", i))
        } else {
            ChatTurn::assistant(format!("answer {}", i))
        };
        assert!(history.append(turn));
    }
    history
}

#[test]
fn test_blank_turns_are_dropped() {
    let mut history = ConversationHistory::new(5);

    assert!(!history.append(ChatTurn::user("")));
    assert!(!history.append(ChatTurn::assistant("   \n\t")));
    assert!(history.is_empty());

    assert!(history.append(ChatTurn::user("hello")));
    assert_eq!(history.len(), 1);
}

#[test]
fn test_oldest_turn_is_evicted_at_capacity() {
    let mut history = filled(3, 3);
    assert_eq!(history.len(), 3);

    history.append(ChatTurn::user("newest"));

    let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["answer 1", "question 2", "newest"]);
    assert_eq!(history.last().map(|t| t.content.as_str()), Some("newest"));
}

#[test]
fn test_length_never_exceeds_capacity() {
    let history = filled(20, 57);
    assert_eq!(history.len(), 20);
    assert_eq!(history.capacity(), 20);
    assert_eq!(history.iter().next().unwrap().content, "answer 37");
}

#[test]
fn test_context_on_empty_history() {
    let history = ConversationHistory::default();
    let context = history.build_context("hi", 10);
    assert_eq!(context, vec![ContextMessage::user("hi")]);
}

#[test]
fn test_context_window_takes_most_recent_turns() {
    let history = filled(20, 6);
    let context = history.build_context("next", 3);

    let expected = vec![
        ContextMessage {
            role: "assistant".to_string(),
            content: "answer 3".to_string(),
        },
        ContextMessage {
            role: "user".to_string(),
            content: "question 4".to_string(),
        },
        ContextMessage {
            role: "assistant".to_string(),
            content: "answer 5".to_string(),
        },
        ContextMessage::user("next"),
    ];
    assert_eq!(context, expected);
}

#[test]
fn test_context_is_bounded_and_ends_with_current_message() {
    let history = filled(20, 12);

    for window in 0..16 {
        let context = history.build_context("current", window);
        assert!(context.len() <= window + 1, "window {}", window);
        assert_eq!(context.len(), window.min(12) + 1);
        assert_eq!(context.last(), Some(&ContextMessage::user("current")));
    }
}

#[test]
fn test_system_turns_never_reach_the_context() {
    let mut history = ConversationHistory::new(10);
    history.append(ChatTurn::system("connected"));
    history.append(ChatTurn::user("a"));
    history.append(ChatTurn::system("agent restarted"));
    history.append(ChatTurn::assistant("b"));

    let context = history.build_context("c", 10);
    assert_eq!(context.len(), 3);
    assert!(context.iter().all(|m| m.role != "system"));

    // System turns are still kept in the log itself.
    assert_eq!(
        history.iter().filter(|t| t.role == Role::System).count(),
        2
    );
}

#[test]
fn test_building_context_does_not_change_history() {
    let history = filled(4, 4);
    let before: Vec<ChatTurn> = history.iter().cloned().collect();

    let _ = history.build_context("x", 2);

    let after: Vec<ChatTurn> = history.iter().cloned().collect();
    assert_eq!(before, after);
}
