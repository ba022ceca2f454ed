// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pedalsteel::config::{LibraryEvent, LibraryWatcher};
use pedalsteel::copedent::Control;
use pedalsteel::engine::{decipher, find_chord_voicings, find_scale_on_fretboard, ChordQuery};
use pedalsteel::music::{find_scales_for_chord, ChordType, Spelling};
use pedalsteel::{Copedent, CopedentLibrary, SearchSettings};

fn print_usage() {
    println!("pedalsteel - Pedal steel copedent explorer");
    println!();
    println!("Usage: pedalsteel [--file <library.yaml>] [--settings <settings.toml>] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  --controls                     List pedals, levers and mechanisms");
    println!("  --splits                       List detected splits and their resolutions");
    println!("  --find <root> <chord> [N]      Find voicings, e.g. --find E4 maj7 2");
    println!("  --decipher <fret> [controls]   Name the chords at a fret, e.g. --decipher 3 P1 P2");
    println!("  --scale <root> <scale> [ctrl]  Map a scale up to the scale fret limit");
    println!("  --scales-for <chord>           Scales containing a chord type");
    println!("  --watch <file>                 Reload a library file whenever it changes");
    println!("  --help                         Show this help message");
    println!();
    println!("Without --file the built-in Emmons E9 is used.");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Split control ids into pedals, levers and mechanisms by looking them up
fn classify_controls(
    copedent: &Copedent,
    ids: &[String],
) -> Result<(Vec<String>, Vec<String>, Vec<String>)> {
    let mut pedals = Vec::new();
    let mut levers = Vec::new();
    let mut mechanisms = Vec::new();
    for id in ids {
        if copedent.pedal(id).is_some() {
            pedals.push(id.clone());
        } else if copedent.knee_lever(id).is_some() {
            levers.push(id.clone());
        } else if copedent.mechanism(id).is_some() {
            mechanisms.push(id.clone());
        } else {
            return Err(anyhow!("Unknown control: {}", id));
        }
    }
    Ok((pedals, levers, mechanisms))
}

fn show_splits(copedent: &Copedent) {
    println!("{} ({} splits)", copedent.name, copedent.splits().len());
    for split in copedent.splits() {
        let [a, b] = &split.conflicting_controls;
        println!(
            "  string {:>2} {:<4} {} + {}: {:?} ({:+})",
            split.string_id,
            split.open_note.to_string(),
            a.id,
            b.id,
            split.is_included_in_calculation,
            split.manual_semitone_change
        );
    }
}

fn find(
    copedent: &Copedent,
    settings: &SearchSettings,
    root: &str,
    chord: &str,
    n: Option<usize>,
) -> Result<()> {
    let chord_type =
        ChordType::from_symbol(chord).ok_or_else(|| anyhow!("Unknown chord: {}", chord))?;
    let results_per_fret = n.unwrap_or(settings.results_per_fret);
    let query = ChordQuery::new(root, chord_type.intervals(), results_per_fret)?;
    let voicings = find_chord_voicings(copedent, &query, settings.max_fret, None)?;
    let spelling = Spelling::for_root(query.root.pitch());

    println!("{}{} on {}: {} voicings", root, chord_type.symbol(), copedent.name, voicings.len());
    for voicing in &voicings {
        let controls: Vec<&str> = voicing.controls().collect();
        let notes: Vec<String> = voicing
            .notes
            .iter()
            .filter(|n| n.is_played_in_voicing)
            .map(|n| format!("{}:{}", n.string_id, n.final_note.spelled(spelling)))
            .collect();
        println!(
            "  fret {:>2}  {:<16} {}",
            voicing.fret,
            if controls.is_empty() { "open".to_string() } else { controls.join("+") },
            notes.join(" ")
        );
    }
    Ok(())
}

fn show_decipher(copedent: &Copedent, fret: u8, controls: &[String]) -> Result<()> {
    let (pedals, levers, mechanisms) = classify_controls(copedent, controls)?;
    let chords = decipher(copedent, fret, &pedals, &levers, &mechanisms)?;
    if chords.is_empty() {
        println!("No chord found");
    }
    for chord in chords.iter().take(10) {
        println!("  {:<10} strings {:?}", chord.name, chord.chord_tone_strings);
    }
    Ok(())
}

fn show_scale(
    copedent: &Copedent,
    settings: &SearchSettings,
    root: &str,
    scale: &str,
    controls: &[String],
) -> Result<()> {
    let (pedals, levers, mechanisms) = classify_controls(copedent, controls)?;
    let positions = find_scale_on_fretboard(
        copedent,
        root,
        scale,
        &pedals,
        &levers,
        &mechanisms,
        settings.scale_max_fret,
    )?;
    for string in copedent.strings() {
        let frets: Vec<String> = positions
            .iter()
            .filter(|p| p.string_id == string.id)
            .map(|p| format!("{}({})", p.fret, p.note_name))
            .collect();
        println!("  {:>2} {:<4} {}", string.id, string.open_note.to_string(), frets.join(" "));
    }
    Ok(())
}

fn watch(path: &str) -> Result<()> {
    let library = CopedentLibrary::load(path)?;
    println!("Watching {} ({} copedents, Ctrl+C to stop)", path, library.copedents.len());
    let watcher = LibraryWatcher::new(path, None)?;
    while let Some(event) = watcher.recv() {
        match event {
            LibraryEvent::Reloaded(library) => {
                println!("Reloaded: {} copedents", library.copedents.len());
                if let Some(copedent) = library.selected() {
                    show_splits(copedent);
                }
            }
            LibraryEvent::Error(message) => eprintln!("{}", message),
            LibraryEvent::FileDeleted(path) => println!("Deleted: {:?}", path),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let mut args: Vec<String> = env::args().collect();

    let library = match args.iter().position(|a| a == "--file") {
        Some(i) if i + 1 < args.len() => {
            let path = args.remove(i + 1);
            args.remove(i);
            CopedentLibrary::load(path)?
        }
        Some(_) => return Err(anyhow!("--file requires a path")),
        None => CopedentLibrary::builtin()?,
    };
    let settings = match args.iter().position(|a| a == "--settings") {
        Some(i) if i + 1 < args.len() => {
            let path = args.remove(i + 1);
            args.remove(i);
            SearchSettings::load(path)?
        }
        Some(_) => return Err(anyhow!("--settings requires a path")),
        None => SearchSettings::default(),
    };

    if args.len() < 2 {
        println!("pedalsteel - Pedal steel copedent explorer");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let copedent = library
        .selected()
        .ok_or_else(|| anyhow!("The library has no copedents"))?;

    match args[1].as_str() {
        "--splits" => show_splits(copedent),
        "--find" => {
            if args.len() < 4 {
                eprintln!("Error: --find requires a root note and a chord, e.g. --find E4 maj");
                std::process::exit(1);
            }
            let n = match args.get(4) {
                Some(n) => Some(n.parse().map_err(|_| anyhow!("Invalid result count: {}", n))?),
                None => None,
            };
            find(copedent, &settings, &args[2], &args[3], n)?;
        }
        "--decipher" => {
            if args.len() < 3 {
                eprintln!("Error: --decipher requires a fret number");
                std::process::exit(1);
            }
            let fret: u8 = args[2]
                .parse()
                .map_err(|_| anyhow!("Invalid fret number: {}", args[2]))?;
            show_decipher(copedent, fret, &args[3..])?;
        }
        "--scale" => {
            if args.len() < 4 {
                eprintln!("Error: --scale requires a root and a scale, e.g. --scale A mixolydian");
                std::process::exit(1);
            }
            show_scale(copedent, &settings, &args[2], &args[3], &args[4..])?;
        }
        "--scales-for" => {
            if args.len() < 3 {
                eprintln!("Error: --scales-for requires a chord, e.g. --scales-for 7");
                std::process::exit(1);
            }
            let chord = ChordType::from_symbol(&args[2])
                .ok_or_else(|| anyhow!("Unknown chord: {}", args[2]))?;
            for scale in find_scales_for_chord(chord.intervals()) {
                println!("  {}", scale);
            }
        }
        "--watch" => {
            if args.len() < 3 {
                eprintln!("Error: --watch requires a library file");
                std::process::exit(1);
            }
            watch(&args[2])?;
        }
        "--controls" => {
            for control in copedent.all_controls() {
                let changes: Vec<String> = control
                    .changes()
                    .iter()
                    .map(|(s, d)| format!("{}:{:+}", s, d))
                    .collect();
                println!("  {:<5} {:<20} {}", control.id(), control.name(), changes.join(" "));
            }
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
