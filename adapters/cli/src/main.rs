#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that builds a tactical grid scenario and queries it.

mod config;
mod map;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use tactical_grid_core::{Command, Event, GridIndex, MovementType};
use tactical_grid_rendering::{present, Color, CursorProjector, HeadlessInstances};
use tactical_grid_system_builder::GridBuilder;
use tactical_grid_system_pathfinding::Pathfinder;
use tactical_grid_system_selection::{SelectionController, SelectionInput};
use tactical_grid_world::{self as world, query, World};
use tracing::warn;

use config::ScenarioConfig;

/// Builds a tactical grid from a scenario file and runs queries against it.
#[derive(Parser)]
#[command(name = "tactical-grid", version, long_about = None)]
struct Cli {
    /// Scenario file describing the grid and its terrain
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print the cheapest path between two tiles
    Path {
        /// Starting tile as COLUMN,ROW
        #[arg(value_parser = parse_index)]
        from: GridIndex,
        /// Destination tile as COLUMN,ROW
        #[arg(value_parser = parse_index)]
        to: GridIndex,
        /// Movement type of the unit, e.g. "GROUND | AERIAL"
        #[arg(long, value_parser = parse_movement, default_value = "GROUND")]
        movement: MovementType,
        /// Largest height difference crossed in one step
        #[arg(long, default_value_t = 1)]
        jump: u32,
    },
    /// List the tiles reachable within a movement budget
    Range {
        /// Origin tile as COLUMN,ROW
        #[arg(value_parser = parse_index)]
        from: GridIndex,
        /// Movement budget; defaults to the scenario's selection range
        #[arg(long)]
        budget: Option<u32>,
        /// Movement type of the unit
        #[arg(long, value_parser = parse_movement, default_value = "GROUND")]
        movement: MovementType,
        /// Largest height difference crossed in one step
        #[arg(long, default_value_t = 1)]
        jump: u32,
    },
    /// Draw the grid, optionally confirming a tile to reveal its movement range
    Show {
        /// Tile to hover and confirm as COLUMN,ROW
        #[arg(long, value_parser = parse_index)]
        select: Option<GridIndex>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scenario = ScenarioConfig::load(&cli.config)?;
    let mut session = Session::build(&scenario)?;

    match cli.action {
        Action::Path {
            from,
            to,
            movement,
            jump,
        } => {
            let mut pathfinder = Pathfinder::new();
            let Some(path) = pathfinder.find_path(&session.world, from, to, movement, jump, None)
            else {
                bail!("no path from {from} to {to} for {}", movement_name(movement));
            };

            let cost = path.cost();
            let steps = path.into_steps();
            let route: Vec<String> = steps.iter().map(ToString::to_string).collect();
            println!("cost {cost}: {}", route.join(" -> "));
            let marks: BTreeMap<_, _> = steps.into_iter().map(|index| (index, '+')).collect();
            print!("{}", session.render(&scenario, &marks));
        }
        Action::Range {
            from,
            budget,
            movement,
            jump,
        } => {
            let budget = budget.unwrap_or(scenario.selection.range);
            let mut pathfinder = Pathfinder::new();
            let reached = pathfinder.tiles_in_range(&session.world, from, budget, movement, jump);
            if reached.is_empty() {
                bail!("{from} is not part of the grid");
            }

            let listed: Vec<String> = reached.iter().map(ToString::to_string).collect();
            println!("{} tiles within {budget}: {}", reached.len(), listed.join(" "));
            let marks: BTreeMap<_, _> = reached.iter().map(|index| (*index, '*')).collect();
            print!("{}", session.render(&scenario, &marks));
        }
        Action::Show { select } => {
            let mut controller = SelectionController::new(scenario.selection);
            let cursor = TileCursor {
                world: &session.world,
                target: select,
            }
            .project_cursor();

            let mut commands = Vec::new();
            controller.handle(&session.world, SelectionInput::new(cursor, true), &mut commands);
            session.apply(commands)?;

            let mut marks = session.highlighted_marks();
            if let Some(hovered) = controller.hovered() {
                let _ = marks.insert(hovered, '@');
            }
            print!("{}", session.render(&scenario, &marks));
            print_legend(&scenario);
        }
    }

    Ok(())
}

/// World plus the headless instance store mirroring it.
struct Session {
    world: World,
    instances: HeadlessInstances,
}

impl Session {
    fn build(scenario: &ScenarioConfig) -> Result<Self> {
        let origin = Vec3::ZERO;
        let mut probe = scenario.probe(origin);
        let mut commands = Vec::new();
        let _ = GridBuilder::default()
            .build(Some(&scenario.grid), origin, Some(&mut probe), &mut commands)
            .context("failed to build scenario grid")?;

        let mut session = Self {
            world: World::with_scheme(scenario.grid.scheme),
            instances: HeadlessInstances::new(),
        };
        session.apply(commands)?;
        Ok(session)
    }

    fn apply(&mut self, commands: Vec<Command>) -> Result<()> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        for event in &events {
            if let Event::CommandRejected { reason } = event {
                warn!(%reason, "scenario command rejected");
            }
        }
        present(&events, &mut self.instances).context("failed to mirror grid instances")
    }

    fn highlighted_marks(&self) -> BTreeMap<GridIndex, char> {
        self.instances
            .highlighted()
            .filter_map(|handle| query::tile_for_handle(&self.world, handle))
            .map(|index| (index, '*'))
            .collect()
    }

    fn render(&self, scenario: &ScenarioConfig, marks: &BTreeMap<GridIndex, char>) -> String {
        let columns = i32::try_from(scenario.grid.columns).unwrap_or(i32::MAX);
        let rows = i32::try_from(scenario.grid.rows).unwrap_or(i32::MAX);
        map::render(&self.world, columns, rows, marks)
    }
}

/// Cursor resting on the centre of a chosen tile.
struct TileCursor<'a> {
    world: &'a World,
    target: Option<GridIndex>,
}

impl CursorProjector for TileCursor<'_> {
    fn project_cursor(&mut self) -> Option<Vec3> {
        let tile = query::tile(self.world, self.target?)?;
        Some(tile.translation())
    }
}

fn print_legend(scenario: &ScenarioConfig) {
    let mut seen = Vec::new();
    for entry in &scenario.terrain {
        if seen.contains(&entry.movement) {
            continue;
        }
        seen.push(entry.movement);
        let color = Color::from(entry.movement.volume_color());
        println!("{} {}", color.to_hex(), movement_name(entry.movement));
    }
}

fn movement_name(movement: MovementType) -> String {
    let mut name = String::new();
    if bitflags::parser::to_writer(&movement, &mut name).is_err() || name.is_empty() {
        return "NONE".to_owned();
    }
    name
}

fn parse_index(value: &str) -> Result<GridIndex, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected COLUMN,ROW, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(GridIndex::new(column, row))
}

fn parse_movement(value: &str) -> Result<MovementType, String> {
    bitflags::parser::from_str(value).map_err(|error| format!("invalid movement `{value}`: {error}"))
}
