use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use itertools::Itertools;
use unicode_normalization::UnicodeNormalization;

/// Format bool value as a coloured string.
#[must_use]
pub fn colorize_bool(value: bool) -> ColoredString {
    if value { "true".green() } else { "false".red() }
}

/// Get the base name of a filename: everything before the last '.'.
///
/// If the filename contains no dot, the whole name is returned.
///
/// ```rust
/// use cheat_tools::base_name;
///
/// assert_eq!(base_name("Chrono Trigger (USA).sfc"), "Chrono Trigger (USA)");
/// assert_eq!(base_name("no extension"), "no extension");
/// assert_eq!(base_name("archive.tar.gz"), "archive.tar");
/// ```
#[must_use]
pub fn base_name(file_name: &str) -> &str {
    file_name.rfind('.').map_or(file_name, |index| &file_name[..index])
}

/// List the regular files of a directory as (normalized name, original name)
/// pairs, sorted by the normalized name.
///
/// Hidden files (leading '.') are skipped.
/// The normalized name is NFC so composed and decomposed Unicode forms of the
/// same name compare equal (macOS directory listings are NFD). The original
/// name is the one the filesystem reported and must be used for file
/// operations: on Linux a decomposed filename only resolves under its
/// original bytes.
pub fn list_file_entries(dir: &Path) -> Result<Vec<(String, OsString)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: '{}'", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let original = entry.file_name();
            let name = normalized_file_name(&original);
            if !name.starts_with('.') {
                entries.push((name, original));
            }
        }
    }
    Ok(entries.into_iter().sorted().collect())
}

/// List the names of regular files in a directory, sorted lexicographically.
///
/// Hidden files (leading '.') are skipped and names are NFC normalized,
/// see [`list_file_entries`].
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    Ok(list_file_entries(dir)?.into_iter().map(|(name, _)| name).collect())
}

/// Convert a filename to a String with special characters retained instead of decomposed.
///
/// Rust uses Unicode NFD (Normalization Form Decomposed) by default,
/// which converts special chars like "å" to "a\u{30a}",
/// which then get printed as a regular "a".
/// Use NFC (Normalization Form Composed) from unicode_normalization crate
/// to retain the correct format and not cause issues later on.
/// <https://github.com/unicode-rs/unicode-normalization>
#[must_use]
pub fn normalized_file_name(name: &OsStr) -> String {
    os_str_to_string(name).nfc().collect()
}

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Resolves the provided input path to a directory or file to an absolute path.
///
/// If `path` is `None`, the current working directory is used.
/// The function verifies that the provided path exists and is accessible,
/// returning an error if it does not.
/// ```rust
/// use std::path::{Path, PathBuf};
/// use cheat_tools::resolve_input_path;
///
/// let path = Path::new("src");
/// let absolute_path = resolve_input_path(Some(path)).unwrap();
/// ```
#[inline]
pub fn resolve_input_path(path: Option<&Path>) -> Result<PathBuf> {
    let input_path = path
        .map(|p| p.to_str().unwrap_or(""))
        .unwrap_or_default()
        .trim()
        .to_string();

    let filepath = if input_path.is_empty() {
        env::current_dir().context("Failed to get current working directory")?
    } else {
        PathBuf::from(input_path)
    };
    if !filepath.exists() {
        anyhow::bail!(
            "Input path does not exist or is not accessible: '{}'",
            filepath.display()
        );
    }

    let absolute_input_path = dunce::canonicalize(&filepath)?;

    // Canonicalize fails for network drives on Windows :(
    if path_to_string(&absolute_input_path).starts_with(r"\\?") && !path_to_string(&filepath).starts_with(r"\\?") {
        Ok(filepath)
    } else {
        Ok(absolute_input_path)
    }
}

/// Convert given path to string with invalid Unicode handling.
pub fn path_to_string(path: &Path) -> String {
    path.to_str().map_or_else(
        || path.to_string_lossy().to_string().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

#[inline]
pub fn print_bold(message: &str) {
    println!("{}", message.bold());
}

#[macro_export]
macro_rules! print_bold {
    ($($arg:tt)*) => {
        $crate::print_bold(&format!($($arg)*))
    };
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Generate a shell completion script for the given shell.
pub fn generate_shell_completion(shell: Shell, mut command: Command, install: bool, command_name: &str) -> Result<()> {
    if install {
        let out_dir = get_shell_completion_dir(shell, command_name)?;
        let path = clap_complete::generate_to(shell, &mut command, command_name, out_dir)?;
        println!("Completion file generated to: {}", path.display());
    } else {
        clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
    }
    Ok(())
}

/// Determine the appropriate directory for storing shell completions.
///
/// First checks if the user-specific directory exists,
/// then checks for the global directory.
/// If neither exist, creates and uses the user-specific dir.
fn get_shell_completion_dir(shell: Shell, name: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;

    // Special handling for oh-my-zsh.
    // Create custom "plugin", which will then have to be loaded in .zshrc
    if shell == Shell::Zsh {
        let omz_plugins = home.join(".oh-my-zsh/custom/plugins");
        if omz_plugins.exists() {
            let plugin_dir = omz_plugins.join(name);
            std::fs::create_dir_all(&plugin_dir)?;
            return Ok(plugin_dir);
        }
    }

    let user_dir = match shell {
        Shell::PowerShell => {
            if cfg!(windows) {
                home.join(r"Documents\PowerShell\completions")
            } else {
                home.join(".config/powershell/completions")
            }
        }
        Shell::Bash => home.join(".bash_completion.d"),
        Shell::Elvish => home.join(".elvish"),
        Shell::Fish => home.join(".config/fish/completions"),
        Shell::Zsh => home.join(".zsh/completions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if user_dir.exists() {
        return Ok(user_dir);
    }

    let global_dir = match shell {
        Shell::PowerShell => {
            if cfg!(windows) {
                home.join(r"Documents\PowerShell\completions")
            } else {
                home.join(".config/powershell/completions")
            }
        }
        Shell::Bash => PathBuf::from("/etc/bash_completion.d"),
        Shell::Fish => PathBuf::from("/usr/share/fish/completions"),
        Shell::Zsh => PathBuf::from("/usr/share/zsh/site-functions"),
        _ => anyhow::bail!("Unsupported shell"),
    };

    if global_dir.exists() {
        return Ok(global_dir);
    }

    std::fs::create_dir_all(&user_dir)?;
    Ok(user_dir)
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    use std::fs::File;

    use tempfile::tempdir;

    #[test]
    fn test_base_name_with_extension() {
        assert_eq!(base_name("Super Metroid (Japan, USA).sfc"), "Super Metroid (Japan, USA)");
    }

    #[test]
    fn test_base_name_without_extension() {
        assert_eq!(base_name("README"), "README");
    }

    #[test]
    fn test_base_name_multiple_dots_strips_last_only() {
        assert_eq!(base_name("Game v1.1 (Europe).gba"), "Game v1.1 (Europe)");
    }

    #[test]
    fn test_base_name_empty_string() {
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_base_name_leading_dot() {
        assert_eq!(base_name(".cht"), "");
    }

    #[test]
    fn test_list_file_names_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.cht", "a.cht", "c.cht"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let names = list_file_names(dir.path()).unwrap();
        assert_eq!(names, vec!["a.cht", "b.cht", "c.cht"]);
    }

    #[test]
    fn test_list_file_names_skips_hidden_and_directories() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("visible.sfc")).unwrap();
        File::create(dir.path().join(".DS_Store")).unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let names = list_file_names(dir.path()).unwrap();
        assert_eq!(names, vec!["visible.sfc"]);
    }

    #[test]
    fn test_list_file_names_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(list_file_names(&missing).is_err());
    }

    #[test]
    fn test_list_file_entries_keeps_original_name() {
        let dir = tempdir().unwrap();
        let decomposed = "Pok\u{0065}\u{0301}mon.cht";
        File::create(dir.path().join(decomposed)).unwrap();

        let entries = list_file_entries(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "Pok\u{00e9}mon.cht");
        // The stored name keeps whatever form the filesystem reported,
        // so joining it back always resolves the file.
        assert!(dir.path().join(&entries[0].1).exists());
    }

    #[test]
    fn test_normalized_file_name_composes_nfd() {
        // "é" decomposed as "e" + combining acute accent
        let decomposed = "Pok\u{0065}\u{0301}mon.cht";
        let normalized = normalized_file_name(OsStr::new(decomposed));
        assert_eq!(normalized, "Pok\u{00e9}mon.cht");
    }

    #[test]
    fn test_resolve_input_path_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path();
        let resolved = resolve_input_path(Some(path));
        assert!(resolved.is_ok());
    }

    #[test]
    fn test_resolve_input_path_nonexistent() {
        let path = Path::new("nonexistent");
        let resolved = resolve_input_path(Some(path));
        assert!(resolved.is_err());
    }

    #[test]
    fn test_resolve_input_path_default() {
        let resolved = resolve_input_path(None);
        assert!(resolved.is_ok());
        assert_eq!(resolved.unwrap(), env::current_dir().unwrap());
    }
}
