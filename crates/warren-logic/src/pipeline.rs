//! The transition guard chain - every rule between "actor taps a door"
//! and "state may change", in enforcement order.
//!
//! [`evaluate`] is the decision behind a real traversal; [`preview`] is
//! its read-only twin for listing a room's exits. Both are pure functions
//! over a [`TransitionContext`] snapshot the orchestrator assembles from
//! fresh store reads; nothing here performs I/O or mutates anything.
//!
//! # Guard Order
//!
//! | # | Guard | Denial |
//! |---|-------|--------|
//! | 1 | entrance enabled | `DOOR_DISABLED` |
//! | 2 | connection present | `NO_CONNECTION` |
//! | 3 | access policy (locks, keys, allow-lists) | per check |
//! | 4 | usage ceiling | `USAGE_LIMIT_EXCEEDED` |
//! | 5 | cooldown | `COOLDOWN_ACTIVE` |
//! | 6 | target resolves and is active | `INVALID_DESTINATION` |
//! | 7 | cost computed, energy covers it | `INSUFFICIENT_ENERGY` |
//!
//! The first failing guard wins; a disabled door reports `DOOR_DISABLED`
//! even when the actor also could not afford it. Preview differs in one
//! deliberate way: throttle state is reported alongside each entry but
//! never flips its accessibility, so a door on cooldown still lists as
//! reachable.

use serde::{Deserialize, Serialize};

use crate::access::{self, AccessDenial, PassRequest};
use crate::graph::{self, Link};
use crate::throttle;
use crate::vitals::{self, Vitals};
use crate::{ActorId, EntranceId, RoomId};

/// Machine-readable refusal codes, serialized exactly as the HTTP
/// surface reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    DoorDisabled,
    NoConnection,
    RequiresKey,
    DoorLocked,
    AccessDenied,
    UsageLimitExceeded,
    CooldownActive,
    InvalidDestination,
    InsufficientEnergy,
    SystemError,
}

impl DenyReason {
    pub fn as_code(&self) -> &'static str {
        match self {
            DenyReason::DoorDisabled => "DOOR_DISABLED",
            DenyReason::NoConnection => "NO_CONNECTION",
            DenyReason::RequiresKey => "REQUIRES_KEY",
            DenyReason::DoorLocked => "DOOR_LOCKED",
            DenyReason::AccessDenied => "ACCESS_DENIED",
            DenyReason::UsageLimitExceeded => "USAGE_LIMIT_EXCEEDED",
            DenyReason::CooldownActive => "COOLDOWN_ACTIVE",
            DenyReason::InvalidDestination => "INVALID_DESTINATION",
            DenyReason::InsufficientEnergy => "INSUFFICIENT_ENERGY",
            DenyReason::SystemError => "SYSTEM_ERROR",
        }
    }
}

/// Facts about the acting player, snapshotted at read time.
#[derive(Debug, Clone)]
pub struct ActorFacts {
    pub actor: ActorId,
    pub current_room: Option<RoomId>,
    pub tier: u8,
    pub vitals: Vitals,
    /// Inventory collaborator answer for this entrance's key. False when
    /// no key is configured.
    pub holds_key: bool,
}

/// Facts about the entrance under evaluation.
#[derive(Debug, Clone)]
pub struct EntranceFacts {
    pub entrance: EntranceId,
    pub face: u8,
    pub enabled: bool,
    pub locked: bool,
    pub required_key: Option<String>,
    pub allowed_actors: Vec<ActorId>,
    pub required_tier: u8,
    pub cooldown_secs: u32,
    pub max_usage_per_hour: u32,
    pub last_opened: Option<i64>,
    pub recent_uses: Vec<i64>,
    pub energy_cost_modifier: i32,
}

/// One endpoint room of the connection, when its record was found.
#[derive(Debug, Clone)]
pub struct RoomFacts {
    pub id: RoomId,
    pub name: String,
    pub active: bool,
}

/// The entrance's connection, when it has one.
#[derive(Debug, Clone)]
pub struct LinkFacts {
    pub link: Link,
    pub energy_cost: i32,
}

/// Everything one guard-chain run looks at.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub now: i64,
    pub actor: ActorFacts,
    pub entrance: EntranceFacts,
    pub connection: Option<LinkFacts>,
    pub from_room: Option<RoomFacts>,
    pub to_room: Option<RoomFacts>,
}

/// A fully guarded traversal, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub target_room: RoomId,
    pub target_name: String,
    pub energy_cost: i32,
}

/// A typed refusal: machine code plus human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenyReason,
    pub message: String,
}

impl Denial {
    fn new(reason: DenyReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Run the full guard chain for a real traversal attempt.
pub fn evaluate(ctx: &TransitionContext) -> Result<Approval, Denial> {
    if !ctx.entrance.enabled {
        return Err(Denial::new(
            DenyReason::DoorDisabled,
            "This door is disabled.",
        ));
    }

    let Some(connection) = &ctx.connection else {
        return Err(Denial::new(
            DenyReason::NoConnection,
            "This door does not lead anywhere.",
        ));
    };

    let pass = access::check_pass(&pass_request(ctx));
    if let Some(denial) = pass.denial {
        return Err(Denial::new(access_reason(denial), denial.message()));
    }

    let usage = throttle::check_usage(
        ctx.entrance.max_usage_per_hour,
        &ctx.entrance.recent_uses,
        ctx.now,
    );
    if !usage.allowed {
        let retry = usage.retry_after_secs.unwrap_or(0);
        return Err(Denial::new(
            DenyReason::UsageLimitExceeded,
            format!("This door has hit its hourly limit; try again in {retry}s."),
        ));
    }

    let cooldown = throttle::check_cooldown(
        ctx.entrance.cooldown_secs,
        ctx.entrance.last_opened,
        ctx.now,
    );
    if !cooldown.allowed {
        let retry = cooldown.retry_after_secs.unwrap_or(0);
        return Err(Denial::new(
            DenyReason::CooldownActive,
            format!("This door is resting; ready in {retry}s."),
        ));
    }

    let target = resolve_destination(ctx, connection)?;

    let cost = graph::transition_cost(connection.energy_cost, ctx.entrance.energy_cost_modifier);
    if !vitals::can_afford(&ctx.actor.vitals, cost) {
        return Err(Denial::new(
            DenyReason::InsufficientEnergy,
            format!(
                "Not enough energy: need {}, have {}.",
                cost, ctx.actor.vitals.energy
            ),
        ));
    }

    Ok(Approval {
        target_room: target.id,
        target_name: target.name.clone(),
        energy_cost: cost,
    })
}

/// One listing entry for a room exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionPreview {
    pub entrance: EntranceId,
    pub face: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_room: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_cost: Option<i32>,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cooldown_remaining_secs: i64,
    pub uses_last_hour: u32,
}

/// Evaluate one entrance for a room listing without touching anything.
///
/// Accessibility reflects structure and access policy only. Cooldown and
/// window usage are surfaced as data for the caller to render.
pub fn preview(ctx: &TransitionContext) -> TransitionPreview {
    let mut entry = TransitionPreview {
        entrance: ctx.entrance.entrance,
        face: ctx.entrance.face,
        target_room: None,
        target_name: None,
        energy_cost: None,
        accessible: false,
        reason: None,
        message: None,
        cooldown_remaining_secs: throttle::cooldown_remaining(
            ctx.entrance.cooldown_secs,
            ctx.entrance.last_opened,
            ctx.now,
        ),
        uses_last_hour: throttle::uses_in_window(&ctx.entrance.recent_uses, ctx.now),
    };

    // Callers list enabled entrances; report honestly if one slips in.
    if !ctx.entrance.enabled {
        entry.reason = Some(DenyReason::DoorDisabled);
        entry.message = Some("This door is disabled.".to_string());
        return entry;
    }

    let Some(connection) = &ctx.connection else {
        entry.reason = Some(DenyReason::NoConnection);
        entry.message = Some("This door does not lead anywhere.".to_string());
        return entry;
    };

    match resolve_destination(ctx, connection) {
        Ok(target) => {
            entry.target_room = Some(target.id);
            entry.target_name = Some(target.name.clone());
            entry.energy_cost = Some(graph::transition_cost(
                connection.energy_cost,
                ctx.entrance.energy_cost_modifier,
            ));
        }
        Err(denial) => {
            entry.reason = Some(denial.reason);
            entry.message = Some(denial.message);
            return entry;
        }
    }

    let pass = access::check_pass(&pass_request(ctx));
    match pass.denial {
        None => entry.accessible = true,
        Some(denial) => {
            entry.reason = Some(access_reason(denial));
            entry.message = Some(denial.message().to_string());
        }
    }

    entry
}

fn pass_request(ctx: &TransitionContext) -> PassRequest {
    PassRequest {
        actor: ctx.actor.actor,
        actor_tier: ctx.actor.tier,
        holds_key: ctx.actor.holds_key,
        locked: ctx.entrance.locked,
        required_key: ctx.entrance.required_key.clone(),
        allowed_actors: ctx.entrance.allowed_actors.clone(),
        required_tier: ctx.entrance.required_tier,
    }
}

fn access_reason(denial: AccessDenial) -> DenyReason {
    match denial {
        AccessDenial::RequiresKey => DenyReason::RequiresKey,
        AccessDenial::Locked => DenyReason::DoorLocked,
        AccessDenial::NotAllowed => DenyReason::AccessDenied,
    }
}

fn resolve_destination<'a>(
    ctx: &'a TransitionContext,
    connection: &LinkFacts,
) -> Result<&'a RoomFacts, Denial> {
    let Some(current) = ctx.actor.current_room else {
        return Err(Denial::new(
            DenyReason::InvalidDestination,
            "You are not in any room.",
        ));
    };
    let Some(target_id) = graph::resolve_target(current, &connection.link) else {
        return Err(Denial::new(
            DenyReason::InvalidDestination,
            "You cannot take this door from here.",
        ));
    };
    let target = [ctx.from_room.as_ref(), ctx.to_room.as_ref()]
        .into_iter()
        .flatten()
        .find(|room| room.id == target_id);
    match target {
        Some(room) if room.active => Ok(room),
        Some(_) => Err(Denial::new(
            DenyReason::InvalidDestination,
            "The room beyond is closed off.",
        )),
        None => Err(Denial::new(
            DenyReason::InvalidDestination,
            "The room beyond no longer exists.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::access_levels;

    const NOW: i64 = 1_700_000_000;
    const ACTOR: ActorId = 11;
    const LOBBY: RoomId = 1;
    const STUDIO: RoomId = 2;

    fn room(id: RoomId, name: &str, active: bool) -> RoomFacts {
        RoomFacts {
            id,
            name: name.to_string(),
            active,
        }
    }

    /// A context that passes every guard: lobby to studio, cost 5.
    fn passing_ctx() -> TransitionContext {
        TransitionContext {
            now: NOW,
            actor: ActorFacts {
                actor: ACTOR,
                current_room: Some(LOBBY),
                tier: access_levels::RESIDENT,
                vitals: Vitals {
                    energy: 50,
                    productivity: 10,
                    social: 10,
                },
                holds_key: false,
            },
            entrance: EntranceFacts {
                entrance: 101,
                face: crate::constants::facings::EAST,
                enabled: true,
                locked: false,
                required_key: None,
                allowed_actors: Vec::new(),
                required_tier: access_levels::PUBLIC,
                cooldown_secs: 0,
                max_usage_per_hour: 0,
                last_opened: None,
                recent_uses: Vec::new(),
                energy_cost_modifier: 0,
            },
            connection: Some(LinkFacts {
                link: Link {
                    from_room: LOBBY,
                    to_room: STUDIO,
                    bidirectional: true,
                },
                energy_cost: 5,
            }),
            from_room: Some(room(LOBBY, "Lobby", true)),
            to_room: Some(room(STUDIO, "Studio", true)),
        }
    }

    fn reason_of(ctx: &TransitionContext) -> DenyReason {
        match evaluate(ctx) {
            Err(denial) => denial.reason,
            Ok(approval) => panic!("expected a denial, got {approval:?}"),
        }
    }

    #[test]
    fn clean_traversal_is_approved() {
        let approval = evaluate(&passing_ctx()).unwrap();
        assert_eq!(approval.target_room, STUDIO);
        assert_eq!(approval.target_name, "Studio");
        assert_eq!(approval.energy_cost, 5);
    }

    #[test]
    fn disabled_door_denies_first() {
        let mut ctx = passing_ctx();
        ctx.entrance.enabled = false;
        // Stack every other failure behind it; the disabled check wins.
        ctx.entrance.locked = true;
        ctx.actor.vitals.energy = 0;
        ctx.connection = None;
        assert_eq!(reason_of(&ctx), DenyReason::DoorDisabled);
    }

    #[test]
    fn dead_end_reports_no_connection() {
        let mut ctx = passing_ctx();
        ctx.connection = None;
        assert_eq!(reason_of(&ctx), DenyReason::NoConnection);
    }

    #[test]
    fn locked_door_with_key_configured_wants_the_key() {
        let mut ctx = passing_ctx();
        ctx.entrance.locked = true;
        ctx.entrance.required_key = Some("brass-key".to_string());
        assert_eq!(reason_of(&ctx), DenyReason::RequiresKey);

        ctx.actor.holds_key = true;
        assert!(evaluate(&ctx).is_ok());
    }

    #[test]
    fn locked_door_without_key_path_is_door_locked() {
        let mut ctx = passing_ctx();
        ctx.entrance.locked = true;
        assert_eq!(reason_of(&ctx), DenyReason::DoorLocked);
    }

    #[test]
    fn allow_list_maps_to_access_denied() {
        let mut ctx = passing_ctx();
        ctx.entrance.allowed_actors = vec![99];
        assert_eq!(reason_of(&ctx), DenyReason::AccessDenied);
    }

    #[test]
    fn access_level_markings_do_not_gate_traversal() {
        let mut ctx = passing_ctx();
        ctx.entrance.required_tier = access_levels::OWNER;
        assert!(evaluate(&ctx).is_ok());
    }

    #[test]
    fn usage_ceiling_denies_before_cooldown() {
        let mut ctx = passing_ctx();
        ctx.entrance.max_usage_per_hour = 2;
        ctx.entrance.recent_uses = vec![NOW - 100, NOW - 50];
        ctx.entrance.cooldown_secs = 300;
        ctx.entrance.last_opened = Some(NOW - 50);
        assert_eq!(reason_of(&ctx), DenyReason::UsageLimitExceeded);
    }

    #[test]
    fn cooldown_denies_with_remaining_seconds() {
        let mut ctx = passing_ctx();
        ctx.entrance.cooldown_secs = 300;
        ctx.entrance.last_opened = Some(NOW - 60);
        let denial = evaluate(&ctx).unwrap_err();
        assert_eq!(denial.reason, DenyReason::CooldownActive);
        assert!(denial.message.contains("240s"));
    }

    #[test]
    fn reverse_traversal_rides_the_bidirectional_flag() {
        let mut ctx = passing_ctx();
        ctx.actor.current_room = Some(STUDIO);
        let approval = evaluate(&ctx).unwrap();
        assert_eq!(approval.target_room, LOBBY);

        let mut ctx = passing_ctx();
        ctx.actor.current_room = Some(STUDIO);
        if let Some(connection) = ctx.connection.as_mut() {
            connection.link.bidirectional = false;
        }
        assert_eq!(reason_of(&ctx), DenyReason::InvalidDestination);
    }

    #[test]
    fn actor_in_an_unrelated_room_cannot_take_the_door() {
        let mut ctx = passing_ctx();
        ctx.actor.current_room = Some(77);
        assert_eq!(reason_of(&ctx), DenyReason::InvalidDestination);
    }

    #[test]
    fn actor_in_no_room_cannot_take_any_door() {
        let mut ctx = passing_ctx();
        ctx.actor.current_room = None;
        assert_eq!(reason_of(&ctx), DenyReason::InvalidDestination);
    }

    #[test]
    fn inactive_destination_is_closed_off() {
        let mut ctx = passing_ctx();
        ctx.to_room = Some(room(STUDIO, "Studio", false));
        let denial = evaluate(&ctx).unwrap_err();
        assert_eq!(denial.reason, DenyReason::InvalidDestination);
        assert!(denial.message.contains("closed off"));
    }

    #[test]
    fn missing_destination_record_is_invalid() {
        let mut ctx = passing_ctx();
        ctx.to_room = None;
        assert_eq!(reason_of(&ctx), DenyReason::InvalidDestination);
    }

    #[test]
    fn modifier_raises_and_discounts_floor_at_zero() {
        let mut ctx = passing_ctx();
        ctx.entrance.energy_cost_modifier = 3;
        assert_eq!(evaluate(&ctx).unwrap().energy_cost, 8);

        ctx.entrance.energy_cost_modifier = -20;
        assert_eq!(evaluate(&ctx).unwrap().energy_cost, 0);
    }

    #[test]
    fn exact_energy_is_enough() {
        let mut ctx = passing_ctx();
        ctx.actor.vitals.energy = 5;
        assert!(evaluate(&ctx).is_ok());

        ctx.actor.vitals.energy = 4;
        let denial = evaluate(&ctx).unwrap_err();
        assert_eq!(denial.reason, DenyReason::InsufficientEnergy);
        assert!(denial.message.contains("need 5, have 4"));
    }

    #[test]
    fn preview_mirrors_a_clean_approval() {
        let entry = preview(&passing_ctx());
        assert!(entry.accessible);
        assert_eq!(entry.target_room, Some(STUDIO));
        assert_eq!(entry.target_name.as_deref(), Some("Studio"));
        assert_eq!(entry.energy_cost, Some(5));
        assert_eq!(entry.reason, None);
        assert_eq!(entry.cooldown_remaining_secs, 0);
        assert_eq!(entry.uses_last_hour, 0);
    }

    #[test]
    fn preview_reports_access_denials() {
        let mut ctx = passing_ctx();
        ctx.entrance.locked = true;
        ctx.entrance.required_key = Some("brass-key".to_string());
        let entry = preview(&ctx);
        assert!(!entry.accessible);
        assert_eq!(entry.reason, Some(DenyReason::RequiresKey));
        // Cost is still shown for an inaccessible door.
        assert_eq!(entry.energy_cost, Some(5));
    }

    #[test]
    fn preview_reports_throttle_state_without_enforcing_it() {
        let mut ctx = passing_ctx();
        ctx.entrance.cooldown_secs = 300;
        ctx.entrance.last_opened = Some(NOW - 60);
        ctx.entrance.max_usage_per_hour = 1;
        ctx.entrance.recent_uses = vec![NOW - 60];

        let entry = preview(&ctx);
        assert!(entry.accessible);
        assert_eq!(entry.cooldown_remaining_secs, 240);
        assert_eq!(entry.uses_last_hour, 1);

        // The same snapshot denies a real attempt.
        assert_eq!(reason_of(&ctx), DenyReason::UsageLimitExceeded);
    }

    #[test]
    fn preview_marks_dead_ends() {
        let mut ctx = passing_ctx();
        ctx.connection = None;
        let entry = preview(&ctx);
        assert!(!entry.accessible);
        assert_eq!(entry.reason, Some(DenyReason::NoConnection));
        assert_eq!(entry.target_room, None);
        assert_eq!(entry.energy_cost, None);
    }

    #[test]
    fn preview_marks_one_way_doors_from_the_far_side() {
        let mut ctx = passing_ctx();
        ctx.actor.current_room = Some(STUDIO);
        if let Some(connection) = ctx.connection.as_mut() {
            connection.link.bidirectional = false;
        }
        let entry = preview(&ctx);
        assert!(!entry.accessible);
        assert_eq!(entry.reason, Some(DenyReason::InvalidDestination));
    }

    #[test]
    fn deny_codes_serialize_screaming_snake() {
        for (reason, code) in [
            (DenyReason::DoorDisabled, "DOOR_DISABLED"),
            (DenyReason::NoConnection, "NO_CONNECTION"),
            (DenyReason::RequiresKey, "REQUIRES_KEY"),
            (DenyReason::DoorLocked, "DOOR_LOCKED"),
            (DenyReason::AccessDenied, "ACCESS_DENIED"),
            (DenyReason::UsageLimitExceeded, "USAGE_LIMIT_EXCEEDED"),
            (DenyReason::CooldownActive, "COOLDOWN_ACTIVE"),
            (DenyReason::InvalidDestination, "INVALID_DESTINATION"),
            (DenyReason::InsufficientEnergy, "INSUFFICIENT_ENERGY"),
            (DenyReason::SystemError, "SYSTEM_ERROR"),
        ] {
            assert_eq!(reason.as_code(), code);
        }
    }

    #[test]
    fn acceptance_guard_order_is_stable() {
        // One context, failures peeled off front to back.
        let mut ctx = passing_ctx();
        ctx.entrance.enabled = false;
        ctx.entrance.locked = true;
        ctx.entrance.required_key = Some("brass-key".to_string());
        ctx.entrance.max_usage_per_hour = 1;
        ctx.entrance.recent_uses = vec![NOW - 10];
        ctx.entrance.cooldown_secs = 600;
        ctx.entrance.last_opened = Some(NOW - 10);
        ctx.actor.vitals.energy = 0;

        assert_eq!(reason_of(&ctx), DenyReason::DoorDisabled);

        ctx.entrance.enabled = true;
        assert_eq!(reason_of(&ctx), DenyReason::RequiresKey);

        ctx.actor.holds_key = true;
        assert_eq!(reason_of(&ctx), DenyReason::UsageLimitExceeded);

        ctx.entrance.recent_uses.clear();
        assert_eq!(reason_of(&ctx), DenyReason::CooldownActive);

        ctx.entrance.last_opened = None;
        assert_eq!(reason_of(&ctx), DenyReason::InsufficientEnergy);

        ctx.actor.vitals.energy = 5;
        assert!(evaluate(&ctx).is_ok());
    }
}
