use anyhow::Result;

use nba_props_terminal::board::{output_cells, output_columns};
use nba_props_terminal::config::{Config, LiveMode};
use nba_props_terminal::logging::init_stderr_logging;
use nba_props_terminal::pipeline::{CycleRequest, run_cycle};

// Runs a single refresh cycle without the terminal UI and prints the board.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_stderr_logging();

    let config = Config::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mode = if args.iter().any(|a| a == "--sim") {
        LiveMode::Simulated
    } else {
        config.live_mode
    };
    let game_id = parse_game_arg(&args).or_else(|| config.game_id.clone());

    let report = run_cycle(&config, &CycleRequest { mode, game_id })?;
    for note in &report.notes {
        eprintln!("{note}");
    }
    if let Some(game) = &report.game {
        println!("Game: {}", game.label());
    }

    let board = &report.board;
    let mut table = vec![output_columns(&board.line_categories)];
    for row in board.sorted_by_minutes() {
        table.push(output_cells(row, &board.line_categories));
    }
    print_aligned(&table);

    if !board.unmatched_line_keys.is_empty() {
        println!();
        println!("Sportsbook players not in live stats:");
        for key in &board.unmatched_line_keys {
            println!("  {key}");
        }
    }
    Ok(())
}

fn parse_game_arg(args: &[String]) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(id) = arg.strip_prefix("--game=") {
            let trimmed = id.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == "--game"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn print_aligned(table: &[Vec<String>]) {
    let cols = table.first().map(Vec::len).unwrap_or(0);
    let widths = (0..cols)
        .map(|c| {
            table
                .iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();
    for row in table {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}
