use std::collections::{BTreeSet, HashMap};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use cheat_tools::{base_name, list_file_entries, list_file_names, print_bold, print_error, print_warning};

use crate::Args;
use crate::config::Config;

const CHEAT_FILE_EXTENSION: &str = ".cht";

/// Number of leading characters compared by the fallback match.
const FALLBACK_PREFIX_CHARS: usize = 10;

#[derive(Debug)]
pub struct CheatMatch {
    roms_dir: PathBuf,
    cheats_dir: PathBuf,
    output_dir: PathBuf,
    config: Config,
}

/// Which strategy selected a cheat file for a ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchStrategy {
    Exact,
    SmartPrefix,
    FallbackPrefix,
}

/// Outcome of matching one ROM name against the cheat name list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MatchResult {
    /// A cheat file was selected and the destination name was free.
    Assigned {
        destination: String,
        source: String,
        strategy: MatchStrategy,
    },
    /// A cheat file was selected but the destination name was already taken.
    Conflict { destination: String },
    /// The exact-match cheat file is the ROM file itself, nothing to copy.
    SelfMatch,
    /// No strategy produced a cheat file.
    NoMatch,
}

/// One ROM name together with its match result, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RomMatch {
    rom_name: String,
    result: MatchResult,
}

/// Result of matching all ROM names against all cheat names.
#[derive(Debug, Default)]
struct MatchOutcome {
    matches: Vec<RomMatch>,
    /// Destination names attempted more than once, in first-collision order.
    conflicts: Vec<String>,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::SmartPrefix => write!(f, "smart"),
            Self::FallbackPrefix => write!(f, "fallback"),
        }
    }
}

impl MatchOutcome {
    fn assignments(&self) -> impl Iterator<Item = (&str, &str, MatchStrategy)> {
        self.matches.iter().filter_map(|rom_match| match &rom_match.result {
            MatchResult::Assigned {
                destination,
                source,
                strategy,
            } => Some((destination.as_str(), source.as_str(), *strategy)),
            _ => None,
        })
    }

    fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().filter_map(|rom_match| match rom_match.result {
            MatchResult::NoMatch => Some(rom_match.rom_name.as_str()),
            _ => None,
        })
    }
}

impl CheatMatch {
    pub fn new(args: Args) -> Result<Self> {
        let roms_dir = cheat_tools::resolve_input_path(args.roms.as_deref())?;
        let cheats_dir = cheat_tools::resolve_input_path(args.cheats.as_deref())?;
        for dir in [&roms_dir, &cheats_dir] {
            if !dir.is_dir() {
                anyhow::bail!("Input path is not a directory: '{}'", dir.display());
            }
        }
        let config = Config::from_args(&args);
        let output_dir = cheats_dir.join(&config.output_dir_name);
        if config.debug {
            eprintln!("{config}");
            eprintln!("ROMs:   {}", roms_dir.display());
            eprintln!("Cheats: {}", cheats_dir.display());
            eprintln!("Output: {}", output_dir.display());
        }
        Ok(Self {
            roms_dir,
            cheats_dir,
            output_dir,
            config,
        })
    }

    pub fn run(&self) -> Result<()> {
        let rom_names = list_file_names(&self.roms_dir)?;
        // Matching runs on the normalized names, copying on the names as they
        // exist on disk.
        let cheat_entries: Vec<_> = list_file_entries(&self.cheats_dir)?
            .into_iter()
            .filter(|(name, _)| name.ends_with(CHEAT_FILE_EXTENSION))
            .collect();
        let cheat_names: Vec<String> = cheat_entries.iter().map(|(name, _)| name.clone()).collect();
        let source_names: HashMap<&str, &OsStr> = cheat_entries
            .iter()
            .map(|(name, original)| (name.as_str(), original.as_os_str()))
            .collect();

        if self.config.verbose {
            println!("{} ROM file(s), {} cheat file(s)", rom_names.len(), cheat_names.len());
        }

        if self.config.dryrun {
            print_bold!("DRYRUN: not copying files");
        } else {
            self.reset_output_dir()?;
        }

        let outcome = Self::match_names(&rom_names, &cheat_names);
        let copied = self.process_matches(&outcome, &source_names);

        if !outcome.conflicts.is_empty() {
            print_bold!("Conflicting files:");
            for destination in &outcome.conflicts {
                println!("{destination}");
            }
        }

        let unmatched = outcome.unmatched().count();
        println!(
            "{}",
            format!(
                "Copied {copied} cheat file(s), {unmatched} unmatched, {} conflict(s)",
                outcome.conflicts.len()
            )
            .bold()
        );

        Ok(())
    }

    /// Log each match result and copy assigned cheat files to the output directory.
    ///
    /// `source_names` maps normalized cheat names to the names on disk.
    /// Copy failures are reported per file and do not stop processing.
    /// Returns the number of files copied.
    fn process_matches(&self, outcome: &MatchOutcome, source_names: &HashMap<&str, &OsStr>) -> usize {
        let mut copied = 0;
        for rom_match in &outcome.matches {
            println!("Finding cheat for: {}", rom_match.rom_name);
            match &rom_match.result {
                MatchResult::Assigned {
                    destination,
                    source,
                    strategy,
                } => {
                    match strategy {
                        MatchStrategy::Exact => println!("  Exact match: {}", source.green()),
                        MatchStrategy::SmartPrefix | MatchStrategy::FallbackPrefix => {
                            println!("  Match found using {strategy} algorithm: {}", source.green());
                            println!("  Matching '{}' to '{}'", base_name(destination), base_name(source));
                        }
                    }
                    if !self.config.dryrun {
                        let source_path = source_names.get(source.as_str()).map_or_else(
                            || self.cheats_dir.join(source),
                            |original| self.cheats_dir.join(original),
                        );
                        if self.copy_cheat_file(&source_path, source, destination) {
                            copied += 1;
                        }
                    }
                }
                MatchResult::Conflict { destination } => {
                    print_warning!("  File name collision: {destination}");
                }
                MatchResult::SelfMatch => {
                    if self.config.verbose {
                        println!("  Cheat file is the ROM file itself, skipping");
                    }
                }
                MatchResult::NoMatch => {
                    print_warning!("  No match found for: {}", rom_match.rom_name);
                }
            }
        }
        copied
    }

    /// Copy one cheat file into the output directory under the destination name.
    fn copy_cheat_file(&self, source_path: &Path, source: &str, destination: &str) -> bool {
        let destination_path = self.output_dir.join(destination);
        match std::fs::copy(source_path, &destination_path) {
            Ok(_) => {
                if self.config.verbose {
                    println!("  Copied to '{}': {destination}", self.config.output_dir_name);
                }
                true
            }
            Err(e) => {
                print_error!("Failed to copy '{source}' to '{destination}': {e}");
                false
            }
        }
    }

    /// Delete and recreate the output directory so each run starts from scratch.
    fn reset_output_dir(&self) -> Result<()> {
        if self.output_dir.exists() {
            std::fs::remove_dir_all(&self.output_dir)
                .with_context(|| format!("Failed to delete output directory: '{}'", self.output_dir.display()))?;
            println!("Deleted existing output directory");
        }
        std::fs::create_dir(&self.output_dir)
            .with_context(|| format!("Failed to create output directory: '{}'", self.output_dir.display()))?;
        println!("Created output directory: {}", self.output_dir.display());
        Ok(())
    }

    /// Match each ROM name to a cheat name.
    ///
    /// Both input lists are expected to be sorted lexicographically:
    /// ROM order decides which ROM wins a destination name,
    /// and the fallback strategy picks the first cheat name in list order.
    ///
    /// The strategies are tried in fixed priority order per ROM:
    /// exact name match, shortest uniquely matching prefix, then a
    /// fixed-length prefix comparison. The first strategy to produce
    /// a cheat name wins.
    fn match_names(rom_names: &[String], cheat_names: &[String]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut assigned: BTreeSet<String> = BTreeSet::new();

        for rom_name in rom_names {
            let base = base_name(rom_name);
            let selected = find_exact(base, cheat_names)
                .map(|name| (name, MatchStrategy::Exact))
                .or_else(|| find_smart_prefix(base, cheat_names).map(|name| (name, MatchStrategy::SmartPrefix)))
                .or_else(|| find_fallback_prefix(base, cheat_names).map(|name| (name, MatchStrategy::FallbackPrefix)));

            let result = match selected {
                None => MatchResult::NoMatch,
                Some((cheat_name, _)) if cheat_name == rom_name.as_str() => MatchResult::SelfMatch,
                Some((cheat_name, strategy)) => {
                    let destination = format!("{base}{CHEAT_FILE_EXTENSION}");
                    if assigned.contains(&destination) {
                        if !outcome.conflicts.contains(&destination) {
                            outcome.conflicts.push(destination.clone());
                        }
                        MatchResult::Conflict { destination }
                    } else {
                        assigned.insert(destination.clone());
                        MatchResult::Assigned {
                            destination,
                            source: cheat_name.to_string(),
                            strategy,
                        }
                    }
                }
            };
            outcome.matches.push(RomMatch {
                rom_name: rom_name.clone(),
                result,
            });
        }

        outcome
    }
}

/// Find a cheat name that is exactly the ROM base name plus the cheat extension.
fn find_exact<'a>(base: &str, cheat_names: &'a [String]) -> Option<&'a str> {
    let wanted = format!("{base}{CHEAT_FILE_EXTENSION}");
    cheat_names.iter().find(|name| **name == wanted).map(String::as_str)
}

/// Find the cheat name selected by the shortest uniquely matching prefix.
///
/// Prefix lengths are tried shortest first, so the first length with exactly
/// one matching cheat name is authoritative. The zero-length prefix matches
/// every cheat name and can therefore only select when the list has a single
/// entry. That oddity is kept as is.
fn find_smart_prefix<'a>(base: &str, cheat_names: &'a [String]) -> Option<&'a str> {
    for prefix in char_prefixes(base) {
        let mut matches = cheat_names.iter().filter(|name| name.starts_with(prefix));
        if let (Some(only_match), None) = (matches.next(), matches.next()) {
            return Some(only_match);
        }
    }
    None
}

/// Find the first cheat name whose leading characters equal the ROM base name's.
///
/// Both sides are truncated to at most `FALLBACK_PREFIX_CHARS` characters and
/// compared for equality. First match in list order wins, ties are not
/// detected.
fn find_fallback_prefix<'a>(base: &str, cheat_names: &'a [String]) -> Option<&'a str> {
    let prefix = char_prefix(base, FALLBACK_PREFIX_CHARS);
    cheat_names
        .iter()
        .find(|name| char_prefix(name, FALLBACK_PREFIX_CHARS) == prefix)
        .map(String::as_str)
}

/// All prefixes of a string from empty to the full string, on char boundaries.
fn char_prefixes(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices().map(|(i, _)| &s[..i]).chain(std::iter::once(s))
}

/// The first `max_chars` characters of a string, or the whole string if shorter.
fn char_prefix(s: &str, max_chars: usize) -> &str {
    s.char_indices().nth(max_chars).map_or(s, |(i, _)| &s[..i])
}
