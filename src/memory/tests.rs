use super::*;

fn memory(depth: usize) -> ConversationMemory {
    ConversationMemory::new(&MemoryConfig { depth })
}

fn turn(query: &str) -> ConversationTurn {
    ConversationTurn::new(query, Language::En, Intent::DataQuery)
}

#[test]
fn appends_in_order() {
    let mem = memory(10);
    mem.append("s1", turn("first"));
    mem.append("s1", turn("second"));
    mem.append("s1", turn("third"));

    let history = mem.history("s1");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].query, "first");
    assert_eq!(history[2].query, "third");
    assert_eq!(mem.last_turn("s1").unwrap().query, "third");
}

#[test]
fn evicts_oldest_at_depth() {
    let mem = memory(3);
    for i in 0..5 {
        mem.append("s1", turn(&format!("q{}", i)));
    }

    let history = mem.history("s1");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].query, "q2");
    assert_eq!(history[2].query, "q4");
}

#[test]
fn sessions_are_isolated() {
    let mem = memory(10);
    mem.append("alice", turn("temperature today"));
    mem.append("bob", turn("humidity yesterday"));

    assert_eq!(mem.history("alice").len(), 1);
    assert_eq!(mem.history("bob").len(), 1);
    assert_eq!(mem.history("alice")[0].query, "temperature today");
    assert!(mem.history("carol").is_empty());
    assert!(mem.last_turn("carol").is_none());
}

#[test]
fn last_entity_skips_unresolved_turns() {
    let mem = memory(10);
    mem.append("s1", turn("soil?").with_entity("soil_moisture"));
    mem.append("s1", turn("what about yesterday?"));

    assert_eq!(mem.last_entity("s1"), Some("soil_moisture".to_string()));

    mem.append("s1", turn("pests this week").with_entity("pest_count"));
    assert_eq!(mem.last_entity("s1"), Some("pest_count".to_string()));
}

#[test]
fn zero_depth_is_clamped_to_one() {
    let mem = memory(0);
    mem.append("s1", turn("a"));
    mem.append("s1", turn("b"));
    assert_eq!(mem.depth_of("s1"), 1);
    assert_eq!(mem.history("s1")[0].query, "b");
}

#[test]
fn clear_session_drops_history() {
    let mem = memory(10);
    mem.append("s1", turn("a"));
    assert_eq!(mem.session_count(), 1);

    mem.clear_session("s1");
    assert!(mem.history("s1").is_empty());
    assert_eq!(mem.session_count(), 0);
}

#[test]
fn concurrent_appends_respect_depth() {
    let mem = std::sync::Arc::new(memory(10));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let mem = mem.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    mem.append("shared", turn(&format!("w{}q{}", worker, i)));
                    mem.append(&format!("own{}", worker), turn("private"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // The shared session saw 100 appends but holds exactly its depth.
    assert_eq!(mem.depth_of("shared"), 10);
    // Per-worker sessions stayed isolated.
    for worker in 0..4 {
        assert_eq!(mem.depth_of(&format!("own{}", worker)), 10);
    }
}

#[test]
fn turn_builder_carries_metadata() {
    let t = ConversationTurn::new("دمای امروز", Language::Fa, Intent::DataQuery)
        .with_translated("temperature today")
        .with_entity("temperature")
        .with_time_token("today")
        .with_success(true);

    assert_eq!(t.translated_query.as_deref(), Some("temperature today"));
    assert_eq!(t.entity.as_deref(), Some("temperature"));
    assert_eq!(t.time_token.as_deref(), Some("today"));
    assert!(t.success);

    let earlier = ConversationTurn::new("a", Language::En, Intent::DataQuery);
    let later = ConversationTurn::new("b", Language::En, Intent::DataQuery);
    // now_v7 ids are time-ordered.
    assert!(later.id > earlier.id);
}
