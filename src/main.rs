use ai_2048_mc::engine::{Board, Move};
use ai_2048_mc::search::{SearchConfig, Selector};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let cfg = args.search_config();
    let mut selector = match args.seed {
        Some(seed) => Selector::with_seed(cfg, seed)?,
        None => Selector::new(cfg)?,
    };
    log::info!("depth {}, samples {}, workers {}", cfg.depth, cfg.samples, cfg.workers);

    match args.cmd.unwrap_or(Cmd::Play { steps: None, quiet: false }) {
        Cmd::Play { steps, quiet } => play(&mut selector, args.seed, steps, quiet),
        Cmd::Advise => {
            let stdin = io::stdin();
            advise(&mut selector, &mut stdin.lock(), &mut io::stdout())
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ai-2048-mc", about = "2048 player using parallel Monte-Carlo voting")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    /// Search depth per trial
    #[arg(long, global = true, default_value_t = 6)]
    depth: u32,

    /// Trials per decision (default: 2 x workers)
    #[arg(long, global = true)]
    samples: Option<u64>,

    /// Worker threads (default: available parallelism)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Seed for tile spawns and search workers
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        let workers = self.workers.unwrap_or(defaults.workers);
        SearchConfig { depth: self.depth, samples: self.samples.unwrap_or(2 * workers as u64), workers }
    }
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play a full game from two random tiles (default)
    Play {
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Show a status spinner instead of printing every board
        #[arg(long)]
        quiet: bool,
    },
    /// Recommend moves for a game played elsewhere; reads tiles and moves from stdin
    Advise,
}

fn play(selector: &mut Selector, seed: Option<u64>, steps: Option<u64>, quiet: bool) -> anyhow::Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut board = Board::EMPTY;
    board.place_random(&mut rng);
    board.place_random(&mut rng);

    let pb = if quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        println!("{}\n", board);
        None
    };

    let start = Instant::now();
    let mut moves: u64 = 0;
    let mut peak_nodes: u64 = 0;
    loop {
        let Some(dir) = selector.select(&board) else {
            if pb.is_none() { println!("Couldn't find good direction. Game over"); }
            break;
        };
        peak_nodes = peak_nodes.max(selector.last_stats().peak_nodes);
        board.shift(dir);
        moves += 1;
        if !board.place_random(&mut rng) {
            if pb.is_none() { println!("Couldn't place piece. Game over"); }
            break;
        }
        match &pb {
            Some(pb) => {
                let rate = moves as f64 / start.elapsed().as_secs_f64().max(1e-6);
                pb.set_message(format!("{} | moves/sec: {:.1} | score: {}", moves, rate, board.score()));
            }
            None => println!("Moving {}\n{}\n", dir, board),
        }
        if steps.is_some_and(|limit| moves >= limit) {
            break;
        }
    }

    if let Some(pb) = pb { pb.finish_and_clear(); }
    println!("After {} moves:\n{}", moves, board);
    println!("Highest tile: {}, largest tree: {} nodes", board.highest_tile(), peak_nodes);
    Ok(())
}

fn advise<R: BufRead, W: Write>(selector: &mut Selector, input: &mut R, out: &mut W) -> anyhow::Result<()> {
    let mut board = Board::EMPTY;
    writeln!(out, "{}", board)?;
    writeln!(out, "Requesting initial game state")?;
    for _ in 0..2 {
        let (row, col, val) = request_tile(input, out)?;
        board.set_tile(row, col, val).context("initial tile")?;
    }
    writeln!(out, "{}", board)?;

    loop {
        match selector.select(&board) {
            Some(dir) => writeln!(out, "I recommend moving {}", dir)?,
            None => writeln!(out, "I couldn't find a good direction")?,
        }
        let Some(dir) = request_direction(input, out)? else { break };
        if !board.shift(dir) {
            log::warn!("{} does not change the board", dir);
        }
        writeln!(out, "{}", board)?;
        let (row, col, val) = request_tile(input, out)?;
        board.set_tile(row, col, val).context("spawned tile")?;
    }
    writeln!(out, "{}", board)?;
    Ok(())
}

/// Read one non-empty line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line).context("reading stdin")? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(line.trim().to_string()));
        }
    }
}

fn request_tile<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<(usize, usize, u32)> {
    write!(out, "Enter the row, column, and value of the tile, separated by spaces: ")?;
    out.flush()?;
    let line = read_line(input)?.context("input ended while waiting for a tile")?;
    parse_tile(&line)
}

fn request_direction<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> anyhow::Result<Option<Move>> {
    write!(out, "Enter which direction you want to go (l, r, u, d): ")?;
    out.flush()?;
    match read_line(input)? {
        Some(line) => parse_direction(&line).map(Some),
        None => Ok(None),
    }
}

fn parse_tile(line: &str) -> anyhow::Result<(usize, usize, u32)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [row, col, val] = parts.as_slice() else {
        bail!("expected `row col value`, got {line:?}");
    };
    let row = row.parse().with_context(|| format!("bad row {row:?}"))?;
    let col = col.parse().with_context(|| format!("bad column {col:?}"))?;
    let val = val.parse().with_context(|| format!("bad value {val:?}"))?;
    Ok((row, col, val))
}

fn parse_direction(s: &str) -> anyhow::Result<Move> {
    Ok(match s {
        "l" => Move::Left,
        "r" => Move::Right,
        "u" => Move::Up,
        "d" => Move::Down,
        other => bail!("invalid direction {other:?}"),
    })
}
