use super::*;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn unknown_user_can_place() {
    let gate = CooldownGate::new();
    assert!(gate.can_place("u1", NOW));
    assert_eq!(gate.cooldown_end("u1"), None);
    assert_eq!(gate.remaining_secs("u1", NOW), 0);
}

#[test]
fn default_duration_is_ten_seconds() {
    assert_eq!(CooldownGate::default().duration_ms(), 10_000);
}

#[test]
fn start_blocks_until_end() {
    let mut gate = CooldownGate::new();
    let end = gate.start("u1", NOW);
    assert_eq!(end, NOW + 10_000);
    assert!(!gate.can_place("u1", NOW));
    assert!(!gate.can_place("u1", NOW + 9_999));
    assert!(gate.can_place("u1", NOW + 10_000));
}

#[test]
fn cooldown_five_seconds_out_blocks_then_clears() {
    let mut gate = CooldownGate::new();
    assert!(gate.seed_from_last_placement("u1", NOW - 5_000, NOW));
    assert_eq!(gate.cooldown_end("u1"), Some(NOW + 5_000));
    assert!(!gate.can_place("u1", NOW));
    assert!(gate.can_place("u1", NOW + 5_001));
}

#[test]
fn users_are_independent() {
    let mut gate = CooldownGate::new();
    gate.start("u1", NOW);
    assert!(!gate.can_place("u1", NOW + 1));
    assert!(gate.can_place("u2", NOW + 1));
}

#[test]
fn restart_extends_from_new_now() {
    let mut gate = CooldownGate::new();
    gate.start("u1", NOW);
    gate.start("u1", NOW + 20_000);
    assert_eq!(gate.cooldown_end("u1"), Some(NOW + 30_000));
}

#[test]
fn stale_last_placement_does_not_seed() {
    let mut gate = CooldownGate::new();
    assert!(!gate.seed_from_last_placement("u1", NOW - 10_000, NOW));
    assert!(!gate.seed_from_last_placement("u1", NOW - 60_000, NOW));
    assert_eq!(gate.cooldown_end("u1"), None);
    assert!(gate.can_place("u1", NOW));
}

#[test]
fn seeding_never_shortens_a_local_cooldown() {
    let mut gate = CooldownGate::new();
    gate.start("u1", NOW);
    assert!(gate.seed_from_last_placement("u1", NOW - 8_000, NOW));
    assert_eq!(gate.cooldown_end("u1"), Some(NOW + 10_000));
}

#[test]
fn remaining_secs_rounds_up() {
    let mut gate = CooldownGate::new();
    gate.start("u1", NOW);
    assert_eq!(gate.remaining_secs("u1", NOW), 10);
    assert_eq!(gate.remaining_secs("u1", NOW + 1), 10);
    assert_eq!(gate.remaining_secs("u1", NOW + 1_000), 9);
    assert_eq!(gate.remaining_secs("u1", NOW + 9_001), 1);
    assert_eq!(gate.remaining_secs("u1", NOW + 10_000), 0);
    assert_eq!(gate.remaining_secs("u1", NOW + 50_000), 0);
}

#[test]
fn remaining_ms_never_negative() {
    let mut gate = CooldownGate::with_duration(500);
    gate.start("u1", NOW);
    assert_eq!(gate.remaining_ms("u1", NOW + 200), 300);
    assert_eq!(gate.remaining_ms("u1", NOW + 2_000), 0);
}
