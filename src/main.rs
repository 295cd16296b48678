//! Eartrain command-line front end.
//!
//! Runs the exercises on stdin/stdout, plays and exports rhythm patterns,
//! manages presets and prints fretboard maps.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use eartrain::audio::{export_wav, render_pattern, LiveSink, RecordingSink, SoundSet, TONE_ENVELOPE};
use eartrain::config::{default_config_path, AppConfig};
use eartrain::exercise::{Answer, Click, IntervalExercise, MelodyExercise};
use eartrain::generate::{MarkingMode, Melody, MelodyNote, MelodySource};
use eartrain::playback::{CursorEvent, PlaybackScheduler, TapTempo};
use eartrain::preset::{PresetDraft, PresetKind, PresetStore, SaveScope};
use eartrain::rhythm::{CellState, RhythmPattern, Tempo};
use eartrain::theory::{
    arpeggio_pitches, fretboard_notes, Arpeggio, FretPosition, GuitarString, Note, PitchClass, RootRole, ScaleType,
    MAX_FRET,
};

const EXPORT_SAMPLE_RATE: u32 = 44_100;
/// Blocks kept queued on the device ahead of the wall clock.
const LEAD_BLOCKS: f64 = 2.0;
/// Resolution of the dry-run clock.
const DRY_RUN_STEP: f64 = 0.005;

#[derive(Parser)]
#[command(name = "eartrain")]
#[command(about = "Ear training and rhythm practice for guitarists", long_about = None)]
struct Cli {
    /// Config file (default: ~/.eartrain/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Name notes played after a C4 reference
    Interval {
        /// Number of questions (overrides config)
        #[arg(short, long)]
        count: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Print prompts instead of playing them
        #[arg(long)]
        no_audio: bool,
    },

    /// Find melody notes on the fretboard
    Melody {
        /// Generate melodies instead of using the library
        #[arg(long)]
        random: bool,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        no_audio: bool,
    },

    /// Play, preview or export a rhythm pattern
    Rhythm(RhythmArgs),

    /// Manage rhythm presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Print scale positions on the fretboard
    Positions {
        #[arg(short, long)]
        root: PitchClass,

        /// major or minor
        #[arg(short, long, default_value = "major")]
        scale: ScaleType,

        /// Only show one arpeggio: I, IV, V, i, iv, v or dim
        #[arg(short, long)]
        arpeggio: Option<Arpeggio>,

        /// Highest fret shown
        #[arg(short, long, default_value = "12")]
        frets: u8,
    },

    /// Tap tempo: press Enter on the beat, `q` to quit
    Tap,
}

#[derive(Args)]
struct RhythmArgs {
    /// Pattern notation, e.g. "ASSS 0.5:AS"
    #[arg(short, long, conflicts_with = "preset")]
    pattern: Option<String>,

    /// Preset id or name
    #[arg(long)]
    preset: Option<String>,

    /// Time signature of the explorer grid, e.g. "3/4"
    #[arg(long, conflicts_with_all = ["pattern", "preset"])]
    signature: Option<String>,

    /// Cells per beat of the explorer grid
    #[arg(long, conflicts_with_all = ["pattern", "preset"])]
    subdivision: Option<usize>,

    /// Preset collection searched by --preset
    #[arg(long, default_value = "advancedSubdivisions")]
    kind: PresetKind,

    #[arg(short, long)]
    bpm: Option<u32>,

    #[arg(long)]
    sound_set: Option<SoundSet>,

    /// Loops to play before stopping (forever when absent)
    #[arg(short, long)]
    loops: Option<u32>,

    /// Render to a WAV file instead of playing
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Print scheduled hits instead of playing
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum PresetAction {
    /// List presets of every source
    List {
        #[arg(long, default_value = "advancedSubdivisions")]
        kind: PresetKind,
    },
    /// Save a pattern as a preset
    Save {
        name: String,
        /// Pattern notation
        pattern: String,

        #[arg(long, default_value = "advancedSubdivisions")]
        kind: PresetKind,

        #[arg(short, long, default_value = "120")]
        bpm: u32,

        /// Save to the shared collection, presenting this credential
        #[arg(long)]
        global: Option<String>,
    },
    /// Delete a local preset
    Delete {
        id: String,

        #[arg(long, default_value = "advancedSubdivisions")]
        kind: PresetKind,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    };
    tracing::debug!(path = ?cli.config.clone().or_else(default_config_path), "config loaded");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)).context("installing Ctrl-C handler")?;

    match cli.command {
        Commands::Interval { count, seed, no_audio } => run_interval(&config, count, seed, no_audio, &running),
        Commands::Melody { random, seed, no_audio } => run_melody(&config, random, seed, no_audio, &running),
        Commands::Rhythm(args) => run_rhythm(&config, args, &running),
        Commands::Presets { action } => run_presets(&config, action),
        Commands::Positions {
            root,
            scale,
            arpeggio,
            frets,
        } => {
            print_positions(root, scale, arpeggio, frets.min(MAX_FRET));
            Ok(())
        }
        Commands::Tap => run_tap(),
    }
}

fn resolve_seed(cli: Option<u64>, config: &AppConfig) -> u64 {
    cli.or(config.seed).unwrap_or_else(rand::random)
}

/// Real-time playback on the default output device.
struct Player {
    scheduler: PlaybackScheduler<LiveSink>,
    block: usize,
    epoch: Instant,
    /// Wall-clock time, relative to `epoch`, up to which audio is queued.
    queued: f64,
}

impl Player {
    fn open(config: &AppConfig, seed: u64) -> Result<Self> {
        let sink = LiveSink::open(seed, config.audio.volume).context("opening audio output")?;
        let sample_rate = sink.sample_rate();
        let mut scheduler = PlaybackScheduler::with_sample_rate(sink, sample_rate);
        scheduler.set_lookahead(config.audio.lookahead_seconds());
        scheduler.set_sound_set(config.sound_set)?;
        scheduler.init()?;
        Ok(Self {
            scheduler,
            block: config.audio.block_size.max(64),
            epoch: Instant::now(),
            queued: 0.0,
        })
    }

    fn block_seconds(&self) -> f64 {
        self.block as f64 / self.scheduler.sink().sample_rate() as f64
    }

    /// Render one block and hand it to the device, pacing to real time.
    fn step(&mut self) -> Result<()> {
        let block = self.block_seconds();
        self.scheduler.advance(block)?;
        self.scheduler.sink_mut().pump(self.block)?;

        let elapsed = self.epoch.elapsed().as_secs_f64();
        // After an idle gap the device has drained, so the lead restarts from now.
        self.queued = self.queued.max(elapsed) + block;
        let lead = self.queued - elapsed - LEAD_BLOCKS * block;
        if lead > 0.0 {
            thread::sleep(Duration::from_secs_f64(lead));
        }
        Ok(())
    }

    /// Play notes one per beat and return once their release has rung out.
    fn play_notes(&mut self, notes: &[Note], tempo: Tempo, running: &AtomicBool) -> Result<()> {
        let melody = Melody {
            id: 0,
            name: "prompt".to_string(),
            difficulty: None,
            notes: notes
                .iter()
                .map(|&note| MelodyNote { note, position: None })
                .collect(),
            tags: Vec::new(),
        };
        self.scheduler.play_melody(&melody, tempo)?;
        while running.load(Ordering::SeqCst) && self.scheduler.is_playing() {
            self.step()?;
        }
        let mut tail = TONE_ENVELOPE.release;
        while running.load(Ordering::SeqCst) && tail > 0.0 {
            self.step()?;
            tail -= self.block_seconds();
        }
        Ok(())
    }

    fn close(self) {
        drop(self.scheduler.dispose());
    }
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn run_interval(
    config: &AppConfig,
    count: Option<usize>,
    seed: Option<u64>,
    no_audio: bool,
    running: &AtomicBool,
) -> Result<()> {
    let seed = resolve_seed(seed, config);
    let mut settings = config.interval.clone();
    if let Some(count) = count {
        settings.num_questions = count;
    }
    let mut exercise = IntervalExercise::new(settings, ChaCha8Rng::seed_from_u64(seed))?;
    let mut player = if no_audio { None } else { Some(Player::open(config, seed)?) };

    println!("Name each note after the reference C4. `r` replays, `q` quits.");
    let mut asked = 0;
    while running.load(Ordering::SeqCst) && !exercise.is_complete() {
        if asked != exercise.question() {
            asked = exercise.question();
            println!("\nQuestion {}/{}", asked, exercise.num_questions());
            prompt(&mut player, &exercise.prompt(), config.tempo, running)?;
        }
        let Some(input) = read_line("> ")? else { break };
        match input.as_str() {
            "q" => break,
            "r" => prompt(&mut player, &exercise.prompt(), config.tempo, running)?,
            text => match text.parse::<PitchClass>() {
                Ok(pitch) => match exercise.answer(pitch)? {
                    Answer::Correct { first_try: true } => println!("Correct!"),
                    Answer::Correct { first_try: false } => println!("Correct, after a miss"),
                    Answer::Incorrect => println!("Not quite, try again"),
                },
                Err(err) => println!("{err}"),
            },
        }
    }

    let stats = exercise.stats();
    println!(
        "\n{} of {} right first time ({:.0}%)",
        stats.first_try,
        stats.solved,
        stats.first_try_percent()
    );
    if let Some(player) = player {
        player.close();
    }
    Ok(())
}

fn prompt(player: &mut Option<Player>, notes: &[Note], tempo: Tempo, running: &AtomicBool) -> Result<()> {
    match player {
        Some(player) => player.play_notes(notes, tempo, running),
        None => {
            let names: Vec<String> = notes.iter().map(|n| n.to_string()).collect();
            println!("(playing {})", names.join(" "));
            Ok(())
        }
    }
}

/// `E:3`, `A5`, `e 12`. String labels follow the nut: `E` is low, `e` high.
fn parse_position(input: &str) -> Result<FretPosition> {
    let input = input.trim();
    let mut chars = input.chars();
    let label = chars.next().ok_or_else(|| anyhow!("empty position"))?;
    let string = GuitarString::ALL
        .into_iter()
        .find(|s| s.label().starts_with(label))
        .ok_or_else(|| anyhow!("unknown string '{label}'"))?;
    let fret: u8 = chars
        .as_str()
        .trim_start_matches([':', ' '])
        .parse()
        .with_context(|| format!("bad fret in '{input}'"))?;
    if fret > MAX_FRET {
        bail!("fret {fret} is past the last fret ({MAX_FRET})");
    }
    Ok(FretPosition::new(string, fret))
}

fn run_melody(
    config: &AppConfig,
    random: bool,
    seed: Option<u64>,
    no_audio: bool,
    running: &AtomicBool,
) -> Result<()> {
    let seed = resolve_seed(seed, config);
    let mut settings = config.melody.clone();
    if random {
        settings.source = MelodySource::Random;
    }
    let mut exercise = MelodyExercise::new(settings, ChaCha8Rng::seed_from_u64(seed))?;
    let mut player = if no_audio { None } else { Some(Player::open(config, seed)?) };

    println!("Find each note on the fretboard as <string>:<fret>, e.g. A:3. `r` replays, `n` skips, `q` quits.");
    if exercise.marking() == MarkingMode::Free {
        println!("Pick the note you are placing with #<number>.");
    }
    let mut shown = None;
    while running.load(Ordering::SeqCst) && !exercise.is_complete() {
        let notes: Vec<Note> = exercise.melody().notes.iter().map(|n| n.note).collect();
        if shown != Some(exercise.question()) {
            shown = Some(exercise.question());
            println!("\nMelody {}/{}: {}", exercise.question(), exercise.num_melodies(), exercise.melody());
            prompt(&mut player, &notes, config.tempo, running)?;
        }
        println!("Next: note {} ({})", exercise.target() + 1, notes[exercise.target()]);
        let Some(input) = read_line("> ")? else { break };
        match input.as_str() {
            "q" => break,
            "r" => prompt(&mut player, &notes, config.tempo, running)?,
            "n" => {
                if !exercise.next_melody()? {
                    break;
                }
            }
            text if text.starts_with('#') => match text[1..].parse::<usize>() {
                Ok(n) if n > 0 => {
                    if let Err(err) = exercise.select(n - 1) {
                        println!("{err}");
                    }
                }
                _ => println!("expected #<note number>"),
            },
            text => {
                let position = match parse_position(text) {
                    Ok(position) => position,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                match exercise.click(position)? {
                    Click::Correct {
                        melody_complete: true, ..
                    } => {
                        println!("Melody complete!");
                        if !exercise.next_melody()? {
                            break;
                        }
                    }
                    Click::Correct { .. } => println!("Correct"),
                    Click::Incorrect => println!("Not there"),
                }
            }
        }
    }

    let stats = exercise.stats();
    println!(
        "\n{} of {} notes found first time ({:.0}%)",
        stats.first_try,
        stats.solved,
        stats.first_try_percent()
    );
    if let Some(player) = player {
        player.close();
    }
    Ok(())
}

#[cfg(feature = "remote")]
fn open_store(config: &AppConfig) -> PresetStore {
    let store = PresetStore::new(config.presets.dir.clone());
    match &config.presets.global_url {
        Some(url) => store.with_global(
            Box::new(eartrain::preset::HttpGlobalStore::new(url.clone())),
            config.presets.global_credential.clone(),
        ),
        None => store,
    }
}

#[cfg(not(feature = "remote"))]
fn open_store(config: &AppConfig) -> PresetStore {
    if config.presets.global_url.is_some() {
        tracing::warn!("global_url is set but this build has no `remote` feature");
    }
    PresetStore::new(config.presets.dir.clone())
}

/// All-normal grid of four single-cell beats, reshaped by the given options.
fn explorer_grid(signature: Option<&str>, subdivision: Option<usize>) -> Result<RhythmPattern> {
    let mut grid = RhythmPattern::uniform(4, 1, CellState::Normal)?;
    if let Some(signature) = signature {
        grid.apply_time_signature(signature)?;
    }
    if let Some(subdivision) = subdivision {
        grid.set_subdivision(subdivision)?;
    }
    Ok(grid)
}

fn run_rhythm(config: &AppConfig, args: RhythmArgs, running: &AtomicBool) -> Result<()> {
    let (pattern, preset_bpm) = match (&args.pattern, &args.preset) {
        (Some(notation), _) => (notation.parse::<RhythmPattern>()?, None),
        (None, Some(name)) => {
            let presets = open_store(config).list(args.kind);
            let preset = presets
                .find(name)
                .ok_or_else(|| anyhow!("no {} preset '{name}'", args.kind))?;
            (preset.pattern.clone(), Some(preset.bpm))
        }
        (None, None) if args.signature.is_some() || args.subdivision.is_some() => {
            (explorer_grid(args.signature.as_deref(), args.subdivision)?, None)
        }
        (None, None) => (RhythmPattern::advanced_default(), None),
    };
    let tempo = match args.bpm {
        Some(bpm) => Tempo::new(bpm)?,
        None => preset_bpm.unwrap_or(config.tempo),
    };
    let sound_set = args.sound_set.unwrap_or(config.sound_set);
    let seed = resolve_seed(args.seed, config);
    println!("{pattern}  @ {tempo} ({}) with {sound_set}", tempo.marking());

    if let Some(path) = &args.export {
        let loops = args.loops.unwrap_or(1);
        let samples = render_pattern(&pattern, tempo, sound_set, loops, EXPORT_SAMPLE_RATE, seed)?;
        export_wav(path, &samples, EXPORT_SAMPLE_RATE, 1)?;
        println!("wrote {} ({} samples)", path.display(), samples.len());
        return Ok(());
    }

    if args.dry_run {
        return dry_run(&pattern, tempo, sound_set, args.loops.unwrap_or(1));
    }

    let mut player = Player::open(config, seed)?;
    player.scheduler.set_sound_set(sound_set)?;
    player.scheduler.play_pattern(&pattern, tempo)?;
    let end = args
        .loops
        .map(|n| player.scheduler.now() + player.scheduler.loop_length() * n as f64);
    println!("playing, Ctrl-C to stop");
    while running.load(Ordering::SeqCst) {
        if end.is_some_and(|end| player.scheduler.now() >= end) {
            break;
        }
        player.step()?;
    }
    player.scheduler.stop();
    player.close();
    Ok(())
}

fn dry_run(pattern: &RhythmPattern, tempo: Tempo, sound_set: SoundSet, loops: u32) -> Result<()> {
    let mut scheduler = PlaybackScheduler::with_sample_rate(RecordingSink::new(), 1_000);
    scheduler.set_lookahead(0.0);
    scheduler.set_sound_set(sound_set)?;
    scheduler.on_cursor(|event| {
        if let CursorEvent::Enter(position) = event {
            tracing::debug!(?position, "cursor");
        }
    });
    scheduler.play_pattern(pattern, tempo)?;
    let end = scheduler.loop_length() * loops as f64;
    while scheduler.now() + DRY_RUN_STEP <= end {
        scheduler.advance(DRY_RUN_STEP)?;
    }
    scheduler.stop();

    for hit in scheduler.sink().scheduled() {
        if hit.time < end {
            let accent = if hit.phrase_start { " +3dB" } else { "" };
            println!("{:>8.3}s  {:?}{accent}", hit.time, hit.sound);
        }
    }
    Ok(())
}

fn run_presets(config: &AppConfig, action: PresetAction) -> Result<()> {
    let mut store = open_store(config);
    match action {
        PresetAction::List { kind } => {
            let presets = store.list(kind);
            if presets.is_empty() {
                println!("no {kind} presets");
            }
            for p in presets.all() {
                println!("{:<32} {:<24} {:>3} bpm  {:?}  {}", p.id, p.name, p.bpm.bpm(), p.source, p.pattern);
            }
        }
        PresetAction::Save {
            name,
            pattern,
            kind,
            bpm,
            global,
        } => {
            let draft = PresetDraft::new(name, Tempo::new(bpm)?, pattern.parse()?);
            let scope = match global {
                Some(credential) => SaveScope::Global { credential },
                None => SaveScope::Local,
            };
            let preset = store.save(kind, draft, scope)?;
            println!("saved {} as {}", preset.name, preset.id);
        }
        PresetAction::Delete { id, kind } => {
            if store.delete_local(kind, &id)? {
                println!("deleted {id}");
            } else {
                bail!("no local {kind} preset with id {id}");
            }
        }
    }
    Ok(())
}

fn print_positions(root: PitchClass, scale: ScaleType, arpeggio: Option<Arpeggio>, frets: u8) {
    let notes = fretboard_notes(root, scale, frets);
    let filter = arpeggio.map(|a| arpeggio_pitches(a, root, scale));

    print!("   ");
    for fret in 0..=frets {
        print!("{fret:>4}");
    }
    println!();
    for string in GuitarString::ALL.into_iter().rev() {
        print!("{:>2} ", string.label());
        for fret in 0..=frets {
            let cell = notes
                .iter()
                .find(|n| n.position == FretPosition::new(string, fret))
                .filter(|n| filter.as_ref().map_or(true, |set| set.contains(&n.pitch)))
                .map(|n| {
                    let mark = match n.root {
                        Some(RootRole::Major) => "*",
                        Some(RootRole::Minor) => "'",
                        None if n.pentatonic => "",
                        None => ".",
                    };
                    format!("{}{mark}", n.pitch)
                })
                .unwrap_or_else(|| "-".to_string());
            print!("{cell:>4}");
        }
        println!();
    }
    println!("\n{root} {scale}: * major root, ' minor root, . outside the pentatonic");
}

fn run_tap() -> Result<()> {
    let start = Instant::now();
    let mut taps = TapTempo::new();
    println!("Press Enter on each beat, `q` to quit.");
    while let Some(input) = read_line("")? {
        if input == "q" {
            break;
        }
        match taps.tap(start.elapsed()) {
            Some(tempo) => println!("{tempo} ({})", tempo.marking()),
            None => println!("tap {}", taps.len()),
        }
    }
    Ok(())
}
