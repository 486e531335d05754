//! Colosseum - Demo Battle Runner
//!
//! Builds two demo teams, runs a full battle with a greedy scripted coach
//! on both sides, prints every resolved event, and audits the event log by
//! replaying it from scratch.

use clap::Parser;
use std::path::PathBuf;

use colosseum::battle::{
    AttackStyle, Battle, BattleEvent, BattleSetup, CombatantState, CoreStats, EventStore,
    JsonlStore, MemoryStore, PlannedAction, ResolvedAction, Team,
};
use colosseum::core::config::BattleConfig;
use colosseum::core::error::Result;
use colosseum::core::types::CombatantId;
use colosseum::economy::reachable_hexes;
use colosseum::sight::visible_combatants;

#[derive(Parser, Debug)]
#[command(name = "colosseum", about = "Hex-grid tactical combat engine demo")]
struct Args {
    /// RNG seed for the battle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Round cap before the battle is called a draw
    #[arg(long, default_value_t = 30)]
    max_rounds: u32,

    /// Directory for the persisted event log (JSONL); in-memory if unset
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "colosseum=info".into()),
        ))
        .init();

    let args = Args::parse();
    tracing::info!(seed = args.seed, "starting demo battle");

    let mut config = BattleConfig::default();
    config.max_rounds = args.max_rounds;

    let (team_a, team_b) = demo_teams();
    let setup = BattleSetup::new(config, team_a, team_b, args.seed)?;
    let battle_id = setup.battle_id;

    let mut store: Box<dyn EventStore> = match &args.log_dir {
        Some(dir) => Box::new(JsonlStore::new(dir)?),
        None => Box::new(MemoryStore::new()),
    };

    let mut battle = Battle::with_default_bench(setup)?;

    println!("=== COLOSSEUM ===");
    println!("Battle {} | seed {}\n", battle_id.0, args.seed);

    while let Some(actor) = battle.current_actor() {
        let plan = greedy_plan(&battle, actor);
        let events = battle.submit_turn(actor, plan)?;
        for event in &events {
            store.append(battle_id, event)?;
            println!("{}", describe(&battle, event));
        }
    }

    // Event-sourcing audit: the log alone must rebuild the live state,
    // both from memory and from the persisted copy
    battle.verify_replay()?;
    let persisted = store.load_log(battle_id)?;
    colosseum::battle::verify_replay(battle.setup(), &persisted, battle.snapshot())?;

    let result = battle.result().expect("battle ran to completion");
    println!("\n=== RESULT ===");
    match result.winner {
        Some(team) => {
            let name = battle
                .snapshot()
                .teams
                .iter()
                .find(|t| t.id == team)
                .map(|t| t.name.as_str())
                .unwrap_or("?");
            println!("Winner: {}", name);
        }
        None => println!("Draw"),
    }
    println!(
        "Rounds: {} | Events: {} | Replay audit: OK",
        result.rounds, result.event_count
    );
    for (id, health) in &result.final_health {
        let name = battle
            .snapshot()
            .combatant(*id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!("  {:<10} {:>3} hp", name, health);
    }

    Ok(())
}

/// Two 3v3 rosters; Loki's adherence is low on purpose
fn demo_teams() -> (Team, Team) {
    let mut team_a = Team::new("Olympians");
    let a = team_a.id;
    for (name, attack, defense, speed, adherence) in [
        ("Achilles", 52, 24, 88, 85),
        ("Atalanta", 44, 18, 95, 90),
        ("Heracles", 58, 30, 62, 70),
    ] {
        team_a.combatants.push(CombatantState::new(
            a,
            name,
            CoreStats {
                attack,
                defense,
                speed,
                max_health: 100,
            },
            adherence,
        ));
    }

    let mut team_b = Team::new("Tricksters");
    let b = team_b.id;
    for (name, attack, defense, speed, adherence) in [
        ("Loki", 48, 20, 84, 35),
        ("Morgana", 46, 22, 78, 65),
        ("Raven", 40, 26, 70, 80),
    ] {
        team_b.combatants.push(CombatantState::new(
            b,
            name,
            CoreStats {
                attack,
                defense,
                speed,
                max_health: 100,
            },
            adherence,
        ));
    }

    (team_a, team_b)
}

/// Greedy coach: hit the nearest visible enemy, otherwise close distance
fn greedy_plan(battle: &Battle, actor: CombatantId) -> PlannedAction {
    let snapshot = battle.snapshot();
    let config = &battle.setup().config;
    let Some(pos) = snapshot.grid.position_of(actor) else {
        return PlannedAction::Defend;
    };
    let team = snapshot.team_of(actor);

    let visible = visible_combatants(&snapshot.grid, pos, config.vision_range, &[actor]);
    let Some(target) = visible.iter().find(|v| snapshot.team_of(v.id) != team) else {
        return PlannedAction::Defend;
    };

    if target.distance <= config.attack_range {
        return PlannedAction::Attack {
            target: target.id,
            style: AttackStyle::Strike,
        };
    }

    let ap = snapshot.ap.get(&actor).map(|a| a.remaining).unwrap_or(0);
    let step = reachable_hexes(&snapshot.grid, actor, pos, ap)
        .into_iter()
        .filter(|hex| !snapshot.grid.terrain_at(*hex).is_hazard())
        .min_by_key(|hex| (hex.distance(&target.position), hex.q, hex.r));

    match step {
        Some(to) => PlannedAction::Move { to },
        None => PlannedAction::Defend,
    }
}

fn name_of(battle: &Battle, id: CombatantId) -> String {
    battle
        .snapshot()
        .combatant(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("{:?}", id))
}

fn describe(battle: &Battle, event: &BattleEvent) -> String {
    let actor = name_of(battle, event.actor);
    let body = match &event.action {
        ResolvedAction::Moved { to } => format!("{} moves to ({}, {})", actor, to.q, to.r),
        ResolvedAction::Attacked { target, damage, .. } => format!(
            "{} hits {} for {} damage{}",
            actor,
            name_of(battle, *target),
            damage.total,
            if damage.critical { " (critical!)" } else { "" }
        ),
        ResolvedAction::MovedAndAttacked {
            to, target, damage, ..
        } => format!(
            "{} charges to ({}, {}) and hits {} for {}",
            actor,
            to.q,
            to.r,
            name_of(battle, *target),
            damage.total
        ),
        ResolvedAction::Defended => format!("{} braces", actor),
        ResolvedAction::SpecialUsed {
            ability,
            target,
            damage,
        } => format!(
            "{} unleashes {} on {} for {}",
            actor,
            ability,
            name_of(battle, *target),
            damage.total
        ),
        ResolvedAction::Deviated { kind } => {
            let ruling = event
                .ruling
                .as_ref()
                .map(|r| format!(" | {} rules: {}", r.judge, r.narrative))
                .unwrap_or_default();
            format!("{} goes rogue ({:?}){}", actor, kind, ruling)
        }
        ResolvedAction::Rejected { reason } => {
            format!("{}'s order is thrown out ({:?})", actor, reason)
        }
    };
    let hazard = if event.hazard_triggered {
        " [the perimeter bites]"
    } else {
        ""
    };
    format!("[r{} #{:>3}] {}{}", event.round, event.seq, body, hazard)
}
