//! Warren Headless Simulation Harness
//!
//! Drives the full transition engine against the in-memory store,
//! entirely in-process and on a stepped clock. No HTTP involved.
//!
//! Usage:
//!   cargo run -p warren-simtest
//!   cargo run -p warren-simtest -- --verbose

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use warren_logic::pipeline::DenyReason;
use warren_logic::worldcheck;
use warren_logic::{ActorId, ConnectionId, EntranceId, RoomId};

use warren_server::engine::{Clock, EngineError, TransitionEngine, TransitionOutcome};
use warren_server::entities::{Connection, Entrance, PlayerState, Room};
use warren_server::events::{EventSink, TransitionEvent};
use warren_server::memory::MemoryStore;
use warren_server::seed::{self, actors, rooms};
use warren_server::store::{
    EntranceRepository, PlayerRepository, RoomRepository, StoreError, TransitionCommit,
};

const T0: i64 = 1_700_000_000;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct StepClock(AtomicI64);

impl StepClock {
    fn set(&self, now: i64) {
        self.0.store(now, Ordering::Relaxed);
    }
}

impl Clock for StepClock {
    fn now_unix(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<TransitionEvent>>);

impl RecordingSink {
    fn count(&self) -> usize {
        self.0.lock().map(|events| events.len()).unwrap_or(0)
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: TransitionEvent) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }
}

struct Rig {
    store: Arc<MemoryStore>,
    clock: Arc<StepClock>,
    events: Arc<RecordingSink>,
    engine: TransitionEngine,
}

fn rig() -> Rig {
    let store = Arc::new(MemoryStore::new());
    seed::seed_demo_world(&store).expect("seeding a fresh store cannot conflict");
    let clock = Arc::new(StepClock(AtomicI64::new(T0)));
    let events = Arc::new(RecordingSink::default());
    let engine = TransitionEngine::with_clock(
        store.clone(),
        Arc::new(seed::demo_keyring()),
        events.clone(),
        clock.clone(),
    );
    Rig {
        store,
        clock,
        events,
        engine,
    }
}

fn refusal_result(name: &str, outcome: &TransitionOutcome, want: DenyReason) -> TestResult {
    let passed = !outcome.success && outcome.reason == Some(want);
    TestResult {
        name: name.into(),
        passed,
        detail: format!(
            "want {:?}, got {:?} ({})",
            want, outcome.reason, outcome.message
        ),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Warren Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Seeded world structure
    results.extend(validate_world_structure(verbose));

    // 2. Guard refusal sweep
    results.extend(validate_guard_refusals(verbose));

    // 3. Resident tour across the warren
    results.extend(validate_resident_tour(verbose));

    // 4. Cooldowns and hourly ceilings over synthetic time
    results.extend(validate_throttles(verbose));

    // 5. Read-only preview against its write twin
    results.extend(validate_preview(verbose));

    // 6. Commit atomicity under store failure
    results.extend(validate_atomicity(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. World structure ──────────────────────────────────────────────────

fn validate_world_structure(verbose: bool) -> Vec<TestResult> {
    println!("--- World Structure ---");
    let mut results = Vec::new();

    let rig = rig();
    let counts = rig.store.counts().unwrap_or((0, 0, 0, 0));
    results.push(TestResult {
        name: "world_record_counts".into(),
        passed: counts == (6, 11, 10, 3),
        detail: format!(
            "{} rooms, {} entrances, {} connections, {} players",
            counts.0, counts.1, counts.2, counts.3
        ),
    });

    let Ok((room_snaps, entrance_snaps, connection_snaps)) = rig.store.graph_snapshot() else {
        results.push(TestResult {
            name: "world_snapshot".into(),
            passed: false,
            detail: "graph snapshot failed".into(),
        });
        return results;
    };
    let findings = worldcheck::validate_all(&room_snaps, &entrance_snaps, &connection_snaps);
    let errors = findings
        .iter()
        .filter(|f| f.severity == worldcheck::Severity::Error)
        .count();
    let warnings = findings.len() - errors;

    results.push(TestResult {
        name: "world_no_structural_errors".into(),
        passed: worldcheck::is_sound(&findings),
        detail: format!("{} errors, {} warnings", errors, warnings),
    });

    // The seed carries two deliberate oddities the validator must spot:
    // the lounge alcove (dead end) and the door into the closed old wing.
    let categories: Vec<&str> = findings.iter().map(|f| f.category).collect();
    results.push(TestResult {
        name: "world_known_warnings_flagged".into(),
        passed: categories.contains(&"dead_end") && categories.contains(&"closed_room"),
        detail: format!("warning categories: {:?}", categories),
    });

    if verbose {
        for finding in &findings {
            println!("  [{:?}] {}", finding.severity, finding.message);
        }
    }

    results
}

// ── 2. Guard refusals ───────────────────────────────────────────────────

fn validate_guard_refusals(_verbose: bool) -> Vec<TestResult> {
    println!("--- Guard Refusals ---");
    let mut results = Vec::new();

    let rig = rig();
    let visitor = actors::VISITOR;

    // All of these refuse without ever moving the visitor.
    let disabled = rig.engine.attempt_transition(visitor, 110).unwrap();
    results.push(refusal_result("guard_door_disabled", &disabled, DenyReason::DoorDisabled));

    let dead_end = rig.engine.attempt_transition(visitor, 109).unwrap();
    results.push(refusal_result("guard_no_connection", &dead_end, DenyReason::NoConnection));

    let keyless = rig.engine.attempt_transition(visitor, 105).unwrap();
    results.push(refusal_result("guard_requires_key", &keyless, DenyReason::RequiresKey));

    let not_listed = rig.engine.attempt_transition(visitor, 106).unwrap();
    results.push(refusal_result("guard_allow_list", &not_listed, DenyReason::AccessDenied));

    // Door 107 carries a resident-level marking; markings are data and
    // never refuse. From the lobby the attempt dies on resolution alone.
    let marked = rig.engine.attempt_transition(visitor, 107).unwrap();
    results.push(refusal_result(
        "guard_level_marking_never_refuses",
        &marked,
        DenyReason::InvalidDestination,
    ));

    let after_denials = rig.store.player(visitor).unwrap().unwrap();
    results.push(TestResult {
        name: "guard_denials_leave_state".into(),
        passed: after_denials.current_room == Some(rooms::LOBBY)
            && after_denials.energy == 8
            && after_denials.version == 0,
        detail: format!(
            "room {:?}, energy {}, version {}",
            after_denials.current_room, after_denials.energy, after_denials.version
        ),
    });

    // One paid hop into the studio, then the wallet runs dry.
    let into_studio = rig.engine.attempt_transition(visitor, 101).unwrap();
    results.push(TestResult {
        name: "guard_paid_hop_succeeds".into(),
        passed: into_studio.success && into_studio.energy_cost == Some(5),
        detail: into_studio.message.clone(),
    });

    let closed_wing = rig.engine.attempt_transition(visitor, 108).unwrap();
    results.push(refusal_result(
        "guard_invalid_destination",
        &closed_wing,
        DenyReason::InvalidDestination,
    ));

    let broke = rig.engine.attempt_transition(visitor, 102).unwrap();
    results.push(refusal_result("guard_insufficient_energy", &broke, DenyReason::InsufficientEnergy));

    let stranded = rig.store.player(visitor).unwrap().unwrap();
    results.push(TestResult {
        name: "guard_denied_hop_charges_nothing".into(),
        passed: stranded.current_room == Some(rooms::STUDIO) && stranded.energy == 3,
        detail: format!(
            "room {:?}, energy {}",
            stranded.current_room, stranded.energy
        ),
    });

    let unknown = rig.engine.attempt_transition(visitor, 999);
    results.push(TestResult {
        name: "guard_unknown_entrance_is_an_error".into(),
        passed: matches!(unknown, Err(EngineError::UnknownEntrance(999))),
        detail: format!("{:?}", unknown.err()),
    });

    results
}

// ── 3. Resident tour ────────────────────────────────────────────────────

fn validate_resident_tour(verbose: bool) -> Vec<TestResult> {
    println!("--- Resident Tour ---");
    let mut results = Vec::new();

    let rig = rig();
    let resident = actors::RESIDENT;

    // Lobby -> studio -> lounge -> roof, checking arrival points.
    let hops: [(EntranceId, RoomId, (i32, i32), i32); 3] = [
        (101, rooms::STUDIO, (0, 6), 95),
        (103, rooms::LOUNGE, (0, 5), 92),
        (107, rooms::ROOF, (7, 0), 91), // 92 - 6 cost + 5 boost
    ];

    for (entrance, want_room, want_position, want_energy) in hops {
        let outcome = rig.engine.attempt_transition(resident, entrance).unwrap();
        let player = rig.store.player(resident).unwrap().unwrap();
        let landed = (player.position_x, player.position_y);
        results.push(TestResult {
            name: format!("tour_entrance_{}", entrance),
            passed: outcome.success
                && player.current_room == Some(want_room)
                && landed == want_position
                && player.energy == want_energy,
            detail: format!(
                "room {:?} at {:?}, energy {}",
                player.current_room, landed, player.energy
            ),
        });
        if verbose {
            println!("  {}", outcome.message);
        }
    }

    let rested = rig.store.player(resident).unwrap().unwrap();
    results.push(TestResult {
        name: "tour_roof_reward_and_boost".into(),
        passed: rested.productivity == 35 && rested.social == 30 && rested.version == 3,
        detail: format!(
            "productivity {}, social {}, version {}",
            rested.productivity, rested.social, rested.version
        ),
    });

    results.push(TestResult {
        name: "tour_every_commit_announced".into(),
        passed: rig.events.count() == 3,
        detail: format!("{} events recorded", rig.events.count()),
    });

    results
}

// ── 4. Throttles over synthetic time ────────────────────────────────────

fn validate_throttles(_verbose: bool) -> Vec<TestResult> {
    println!("--- Throttles ---");
    let mut results = Vec::new();

    let rig = rig();
    let resident = actors::RESIDENT;

    // Reach the roof door and use it once at T0.
    for entrance in [101u64, 103, 107] {
        let outcome = rig.engine.attempt_transition(resident, entrance).unwrap();
        assert!(outcome.success, "tour hop {} failed: {}", entrance, outcome.message);
    }

    // The roof door rests for five minutes after a passage.
    let still_warm = rig.engine.attempt_transition(resident, 107).unwrap();
    let resting = !still_warm.success
        && still_warm.reason == Some(DenyReason::CooldownActive)
        && still_warm.message.contains("300s");
    results.push(TestResult {
        name: "throttle_cooldown_holds".into(),
        passed: resting,
        detail: still_warm.message.clone(),
    });

    rig.clock.set(T0 + 300);
    let cooled = rig.engine.attempt_transition(resident, 107).unwrap();
    results.push(TestResult {
        name: "throttle_cooldown_elapses".into(),
        passed: cooled.success,
        detail: cooled.message.clone(),
    });

    // Back in the lounge. The studio door allows three passages an hour;
    // one is already on the log from the way in.
    let second = rig.engine.attempt_transition(resident, 103).unwrap();
    let third = rig.engine.attempt_transition(resident, 103).unwrap();
    results.push(TestResult {
        name: "throttle_ceiling_fills".into(),
        passed: second.success && third.success,
        detail: "two more passages fit under the ceiling".into(),
    });

    let over = rig.engine.attempt_transition(resident, 103).unwrap();
    let capped = !over.success
        && over.reason == Some(DenyReason::UsageLimitExceeded)
        && over.message.contains("3300s");
    results.push(TestResult {
        name: "throttle_ceiling_bites".into(),
        passed: capped,
        detail: over.message.clone(),
    });

    // Once the T0 use ages out of the trailing hour, the door frees up.
    rig.clock.set(T0 + 3601);
    let freed = rig.engine.attempt_transition(resident, 103).unwrap();
    results.push(TestResult {
        name: "throttle_window_ages_out".into(),
        passed: freed.success,
        detail: freed.message.clone(),
    });

    let door = rig.store.entrance(103).unwrap().unwrap();
    results.push(TestResult {
        name: "throttle_use_log_pruned".into(),
        passed: door.usage_count == 4 && door.recent_uses == vec![T0 + 300, T0 + 300, T0 + 3601],
        detail: format!(
            "{} lifetime uses, log {:?}",
            door.usage_count, door.recent_uses
        ),
    });

    results
}

// ── 5. Preview vs attempt ───────────────────────────────────────────────

fn validate_preview(verbose: bool) -> Vec<TestResult> {
    println!("--- Preview ---");
    let mut results = Vec::new();

    let rig = rig();

    // The resident holds the machine room key, the visitor does not.
    // Same lobby, different accessibility on the same door.
    let for_resident = rig.engine.available_transitions(actors::RESIDENT).unwrap();
    let for_visitor = rig.engine.available_transitions(actors::VISITOR).unwrap();

    let ids: Vec<EntranceId> = for_resident.iter().map(|e| e.entrance).collect();
    results.push(TestResult {
        name: "preview_lists_enabled_exits".into(),
        passed: ids == vec![101, 105],
        detail: format!("lobby listing: {:?} (disabled door 110 excluded)", ids),
    });

    let keyed_for_resident = for_resident.iter().find(|e| e.entrance == 105);
    let keyed_for_visitor = for_visitor.iter().find(|e| e.entrance == 105);
    let split = match (keyed_for_resident, keyed_for_visitor) {
        (Some(r), Some(v)) => {
            r.accessible
                && r.energy_cost == Some(4)
                && !v.accessible
                && v.reason == Some(DenyReason::RequiresKey)
                && v.energy_cost == Some(4)
        }
        _ => false,
    };
    results.push(TestResult {
        name: "preview_keyring_splits_access".into(),
        passed: split,
        detail: "door 105 accessible with the key, refused without".into(),
    });

    // Calling the listing twice changes nothing and returns the same data.
    let again = rig.engine.available_transitions(actors::RESIDENT).unwrap();
    let identical = serde_json::to_string(&for_resident).ok() == serde_json::to_string(&again).ok();
    let untouched = rig
        .store
        .player(actors::RESIDENT)
        .unwrap()
        .unwrap()
        .version
        == 0
        && rig.store.entrance(101).unwrap().unwrap().usage_count == 0
        && rig.events.count() == 0;
    results.push(TestResult {
        name: "preview_is_idempotent_and_read_only".into(),
        passed: identical && untouched,
        detail: format!("identical={} untouched={}", identical, untouched),
    });

    // The custodian's only way out is the allow-listed door, and the
    // listing agrees with a real attempt.
    let for_custodian = rig.engine.available_transitions(actors::CUSTODIAN).unwrap();
    let out = for_custodian.iter().find(|e| e.entrance == 106);
    let listed_open = out.map(|e| e.accessible && e.target_room == Some(rooms::LOBBY));
    let walked = rig.engine.attempt_transition(actors::CUSTODIAN, 106).unwrap();
    results.push(TestResult {
        name: "preview_agrees_with_attempt".into(),
        passed: listed_open == Some(true) && walked.success,
        detail: format!("listed accessible: {:?}, attempt: {}", listed_open, walked.message),
    });

    if verbose {
        match serde_json::to_string_pretty(&for_resident) {
            Ok(json) => println!("  resident lobby listing:\n{}", json),
            Err(err) => println!("  listing did not serialize: {}", err),
        }
    }

    results
}

// ── 6. Atomicity under store failure ────────────────────────────────────

/// Delegates reads to a healthy seeded store and refuses every commit.
struct FailingStore {
    inner: MemoryStore,
}

impl RoomRepository for FailingStore {
    fn room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        self.inner.room(id)
    }
}

impl EntranceRepository for FailingStore {
    fn entrance(&self, id: EntranceId) -> Result<Option<Entrance>, StoreError> {
        self.inner.entrance(id)
    }

    fn entrances_in_room(&self, room: RoomId) -> Result<Vec<Entrance>, StoreError> {
        self.inner.entrances_in_room(room)
    }

    fn connection(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError> {
        self.inner.connection(id)
    }
}

impl PlayerRepository for FailingStore {
    fn player(&self, actor: ActorId) -> Result<Option<PlayerState>, StoreError> {
        self.inner.player(actor)
    }
}

impl TransitionCommit for FailingStore {
    fn commit_transition(
        &self,
        _player: &PlayerState,
        _entrance: &Entrance,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("harness: commit refused".to_string()))
    }
}

fn validate_atomicity(_verbose: bool) -> Vec<TestResult> {
    println!("--- Atomicity ---");
    let mut results = Vec::new();

    let inner = MemoryStore::new();
    seed::seed_demo_world(&inner).expect("seeding a fresh store cannot conflict");
    let failing = Arc::new(FailingStore { inner });
    let events = Arc::new(RecordingSink::default());
    let engine = TransitionEngine::with_clock(
        failing.clone(),
        Arc::new(seed::demo_keyring()),
        events.clone(),
        Arc::new(StepClock(AtomicI64::new(T0))),
    );

    let outcome = engine.attempt_transition(actors::RESIDENT, 101).unwrap();
    results.push(TestResult {
        name: "atomicity_fault_is_system_error".into(),
        passed: !outcome.success && outcome.reason == Some(DenyReason::SystemError),
        detail: outcome.message.clone(),
    });

    let player = failing.inner.player(actors::RESIDENT).unwrap().unwrap();
    let door = failing.inner.entrance(101).unwrap().unwrap();
    results.push(TestResult {
        name: "atomicity_nothing_mutated".into(),
        passed: player.current_room == Some(rooms::LOBBY)
            && player.energy == 100
            && player.version == 0
            && door.usage_count == 0
            && door.last_opened.is_none(),
        detail: format!(
            "room {:?}, energy {}, door uses {}",
            player.current_room, player.energy, door.usage_count
        ),
    });

    results.push(TestResult {
        name: "atomicity_no_event_published".into(),
        passed: events.count() == 0,
        detail: format!("{} events recorded", events.count()),
    });

    results
}
