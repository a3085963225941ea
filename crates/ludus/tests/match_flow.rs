//! End-to-end matchmaking, submission and finalization flows against
//! the in-memory store, with bot timers compressed to zero for tests.

use std::sync::Arc;

use arbiter::Submission;
use colosseum_common::{ArenaError, GameMode, Language, MatchStatus, TestCase};
use ludus::clock::SystemClock;
use ludus::store::PlayerStore;
use ludus::{EngineConfig, MatchEngine, MemoryStore, StaticPool, SubmitOutcome};
use vulcan::{Executor, SandboxConfig};

struct Harness {
    engine: MatchEngine,
    store: Arc<MemoryStore>,
}

async fn harness_with_grace(bot_grace_secs: u64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let pool = StaticPool::new();
    pool.seed(store.as_ref()).await.unwrap();
    let config = EngineConfig {
        min_players: 2,
        max_players: 15,
        race_size: 5,
        lobby_code_len: 6,
        lobby_code_retries: 10,
        default_time_limit_secs: 1500,
        bot_grace_secs,
        bot_base_secs: 0,
        rating_floor: 0,
    };
    let engine = MatchEngine::new(
        config,
        Arc::new(SystemClock),
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
        Arc::clone(&store) as _,
        Arc::new(pool),
        Arc::new(Executor::new(SandboxConfig {
            python_bin: "python3".into(),
            default_timeout_secs: 10,
            max_timeout_secs: 30,
        })),
    );
    Harness { engine, store }
}

/// Bot timers pushed out far enough to never fire during the test
async fn harness() -> Harness {
    harness_with_grace(3600).await
}

fn cases(inputs: &[&str]) -> Vec<TestCase> {
    inputs
        .iter()
        .map(|i| TestCase {
            input: (*i).to_string(),
            expected: "ok".to_string(),
        })
        .collect()
}

/// Five cases, three edge-case inputs: quality exactly 100
fn strong_cases() -> Vec<TestCase> {
    cases(&["0", "-1", "[]", "a", "b"])
}

/// Three cases, two edge-case inputs: quality exactly 60
fn weak_cases() -> Vec<TestCase> {
    cases(&["0", "-1", "x"])
}

fn test_master_submission(test_cases: Vec<TestCase>) -> Submission {
    Submission {
        language: Language::Python,
        test_cases: Some(test_cases),
        ..Submission::default()
    }
}

async fn finish_race(
    h: &Harness,
    match_id: colosseum_common::MatchId,
    user: &str,
    test_cases: fn() -> Vec<TestCase>,
) -> SubmitOutcome {
    let total = h.engine.get_match(match_id).await.unwrap().total_problems;
    let mut last = None;
    for _ in 0..total {
        let outcome = h
            .engine
            .submit(match_id, user, test_master_submission(test_cases()))
            .await
            .unwrap();
        last = Some(outcome);
    }
    last.unwrap()
}

#[tokio::test]
async fn test_quick_match_pairs_two_humans() {
    let h = harness().await;
    let opened = h
        .engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    assert_eq!(opened.status, MatchStatus::Waiting);

    let joined = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();
    assert_eq!(joined.id, opened.id);
    assert_eq!(joined.status, MatchStatus::Active);
    assert_eq!(joined.players.len(), 2);
}

#[tokio::test]
async fn test_rejection_leaves_progress_untouched() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    // One plain case scores 10, far below the 60 bar
    let err = h
        .engine
        .submit(m.id, "alice", test_master_submission(cases(&["x"])))
        .await
        .unwrap_err();
    match err {
        ArenaError::EvaluationRejected(reason) => {
            assert!(reason.contains("10/100"), "{reason}");
        }
        other => panic!("expected evaluation rejection, got {other}"),
    }

    let fresh = h.engine.get_match(m.id).await.unwrap();
    let slot = fresh.player("alice").unwrap();
    assert_eq!(slot.current_problem_index, 0);
    assert_eq!(slot.score, 0);
    assert!(slot.submissions.is_empty());
}

#[tokio::test]
async fn test_accepted_submission_advances_and_hands_back_next_problem() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    let outcome = h
        .engine
        .submit(m.id, "alice", test_master_submission(strong_cases()))
        .await
        .unwrap();
    match outcome {
        SubmitOutcome::Progressed {
            final_score,
            next_problem,
        } => {
            // Quality 100 plus the near-instant time bonus of 50
            assert_eq!(final_score, 150);
            assert_eq!(next_problem.id, m.problem_ids[1]);
        }
        SubmitOutcome::Finished { .. } => panic!("first problem should not finish the race"),
    }

    let fresh = h.engine.get_match(m.id).await.unwrap();
    let slot = fresh.player("alice").unwrap();
    assert_eq!(slot.current_problem_index, 1);
    assert_eq!(slot.problems_solved, 1);
    assert_eq!(slot.test_cases_score, Some(100));
    assert!(!slot.completed);
}

#[tokio::test]
async fn test_first_finisher_never_ends_the_match() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    let outcome = finish_race(&h, m.id, "alice", strong_cases).await;
    match outcome {
        SubmitOutcome::Finished {
            match_completed, ..
        } => assert!(!match_completed),
        SubmitOutcome::Progressed { .. } => panic!("race should be finished"),
    }
    let fresh = h.engine.get_match(m.id).await.unwrap();
    assert_eq!(fresh.status, MatchStatus::Active);
    assert!(fresh.player("alice").unwrap().completed);

    let outcome = finish_race(&h, m.id, "bob", weak_cases).await;
    match outcome {
        SubmitOutcome::Finished { match_completed, .. } => assert!(match_completed),
        SubmitOutcome::Progressed { .. } => panic!("race should be finished"),
    }
    let fresh = h.engine.get_match(m.id).await.unwrap();
    assert_eq!(fresh.status, MatchStatus::Completed);
    assert_eq!(fresh.winner_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_head_to_head_elo_is_symmetric_and_floored() {
    let h = harness().await;
    // Bob starts barely above the floor
    h.store.get_or_create("bob", "bob").await.unwrap();
    h.store.adjust_rating("bob", -995, 0).await.unwrap();

    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    finish_race(&h, m.id, "alice", strong_cases).await;
    finish_race(&h, m.id, "bob", weak_cases).await;

    let alice = h.store.get("alice").await.unwrap();
    let bob = h.store.get("bob").await.unwrap();
    // Heavy favorite beating a 5-rated player earns the minimum 10
    assert_eq!(alice.rating, 1010);
    // Bob's symmetric -10 would go negative; the floor holds at 0
    assert_eq!(bob.rating, 0);
    // 100 base + under-25%-of-limit tier + no-hints bonus
    assert_eq!(alice.xp, 200);
    assert_eq!(bob.xp, 0);
}

#[tokio::test]
async fn test_faster_finisher_wins_head_to_head_despite_lower_score() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    // Bob races through with barely-passing cases; alice takes longer
    // but scores higher on every problem
    finish_race(&h, m.id, "bob", weak_cases).await;
    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    finish_race(&h, m.id, "alice", strong_cases).await;

    let done = h.engine.get_match(m.id).await.unwrap();
    assert_eq!(done.status, MatchStatus::Completed);
    assert!(done.player("alice").unwrap().score > done.player("bob").unwrap().score);
    // The clock decides a matchmade 1v1, not the score
    assert_eq!(done.winner_id.as_deref(), Some("bob"));
    assert_eq!(done.player("bob").unwrap().rank, Some(1));
    assert_eq!(done.player("alice").unwrap().rank, Some(2));

    let alice = h.store.get("alice").await.unwrap();
    let bob = h.store.get("bob").await.unwrap();
    // Evenly matched, no hints: 16 + 10 either way
    assert_eq!(bob.rating, 1026);
    assert_eq!(alice.rating, 974);
    assert_eq!(bob.xp, 200);
    assert_eq!(alice.xp, 0);
}

#[tokio::test]
async fn test_slot_score_tracks_latest_submission() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    h.engine
        .submit(m.id, "alice", test_master_submission(strong_cases()))
        .await
        .unwrap();
    h.engine
        .submit(m.id, "alice", test_master_submission(weak_cases()))
        .await
        .unwrap();

    let fresh = h.engine.get_match(m.id).await.unwrap();
    let slot = fresh.player("alice").unwrap();
    // The slot carries the latest accepted score, not a running sum
    assert_eq!(slot.score, 110);
    assert_eq!(slot.submissions.len(), 2);
    assert_eq!(slot.submissions[0].score, 150);
    assert_eq!(slot.submissions[1].score, 110);
}

#[tokio::test]
async fn test_hint_flags_slot_and_shrinks_awards() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::TestMaster)
        .await
        .unwrap();

    let hint = h.engine.use_hint(m.id, "alice").await.unwrap();
    assert!(!hint.is_empty());
    let fresh = h.engine.get_match(m.id).await.unwrap();
    assert!(fresh.player("alice").unwrap().used_hints);
    assert!(!fresh.player("bob").unwrap().used_hints);

    finish_race(&h, m.id, "alice", strong_cases).await;
    finish_race(&h, m.id, "bob", weak_cases).await;

    let alice = h.store.get("alice").await.unwrap();
    // rating_change(1000, 1000, hints) = 16, and no 50-XP hint bonus
    assert_eq!(alice.rating, 1016);
    assert_eq!(alice.xp, 150);
}

#[tokio::test]
async fn test_bot_fills_slot_and_finalize_is_idempotent() {
    let h = harness_with_grace(0).await;
    let m = h
        .engine
        .quick_match("alice", "alice", GameMode::TestMaster)
        .await
        .unwrap();
    assert_eq!(m.status, MatchStatus::Waiting);

    // Grace window and bot solve time are both zero in the harness
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let fresh = h.engine.get_match(m.id).await.unwrap();
    assert_eq!(fresh.status, MatchStatus::Active);
    let bot = fresh.players.iter().find(|p| p.is_bot).unwrap();
    assert!(bot.completed);
    assert_eq!(bot.problems_solved, fresh.total_problems);
    let bot_id = bot.user_id.clone();

    // The bot finishing alone must not end the match
    assert!(!h.engine.finalize_if_complete(m.id).await.unwrap());

    finish_race(&h, m.id, "alice", strong_cases).await;
    let done = h.engine.get_match(m.id).await.unwrap();
    assert_eq!(done.status, MatchStatus::Completed);
    // An instantly-finishing bot beats the human on the clock
    assert_eq!(done.winner_id.as_deref(), Some(bot_id.as_str()));

    // Later attempts are no-ops
    assert!(!h.engine.finalize_if_complete(m.id).await.unwrap());
    assert!(h.engine.complete_bot(m.id).await.is_ok());

    // Losing to the bot costs rating; the bot itself has no profile
    let alice = h.store.get("alice").await.unwrap();
    assert!(alice.rating < 1000);
    assert!(h.store.get(&bot_id).await.is_err());
}

#[tokio::test]
async fn test_standard_race_end_to_end_with_reference_solutions() {
    let h = harness().await;
    h.engine
        .quick_match("alice", "alice", GameMode::Standard)
        .await
        .unwrap();
    let m = h
        .engine
        .quick_match("bob", "bob", GameMode::Standard)
        .await
        .unwrap();

    for i in 0..m.total_problems {
        let fresh = h.engine.get_match(m.id).await.unwrap();
        let problem_id = fresh.problem_ids[fresh.player("alice").unwrap().current_problem_index];
        let problem = ludus::store::ProblemStore::get(h.store.as_ref(), problem_id)
            .await
            .unwrap();
        let solution = problem.reference_code[&Language::Python].clone();
        let outcome = h
            .engine
            .submit(
                m.id,
                "alice",
                Submission {
                    code: solution,
                    language: Language::Python,
                    ..Submission::default()
                },
            )
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::Progressed { final_score, .. } => {
                assert!(final_score >= 100, "problem {i} scored {final_score}");
            }
            SubmitOutcome::Finished { .. } => assert_eq!(i, m.total_problems - 1),
        }
    }
    let fresh = h.engine.get_match(m.id).await.unwrap();
    let slot = fresh.player("alice").unwrap();
    assert!(slot.completed);
    assert_eq!(slot.problems_solved, fresh.total_problems);
}
