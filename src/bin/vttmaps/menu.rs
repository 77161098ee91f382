//! Interactive numbered menu.
//!
//! Every entry resolves to one of the regular subcommands, so the menu and
//! the command line share the same handlers.

use crate::{run_command, App, Command};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// What a menu entry does once selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Probe,
    DownloadSample,
    DownloadCategories,
    DownloadAll,
    DownloadOne,
    ExportAll,
    View,
    List,
    Index,
    Quit,
}

struct MenuEntry {
    key: &'static str,
    label: &'static str,
    action: Action,
}

const ENTRIES: &[MenuEntry] = &[
    MenuEntry { key: "1", label: "Probe catalog (maps per category)", action: Action::Probe },
    MenuEntry { key: "2", label: "Download sample maps (2 per category)", action: Action::DownloadSample },
    MenuEntry { key: "3", label: "Download maps from specific categories", action: Action::DownloadCategories },
    MenuEntry { key: "4", label: "Download ALL maps (may take a while)", action: Action::DownloadAll },
    MenuEntry { key: "5", label: "Download a specific map", action: Action::DownloadOne },
    MenuEntry { key: "6", label: "Export all local maps to PNG", action: Action::ExportAll },
    MenuEntry { key: "7", label: "View a single map", action: Action::View },
    MenuEntry { key: "8", label: "List local maps", action: Action::List },
    MenuEntry { key: "9", label: "Rebuild maps/index.json", action: Action::Index },
    MenuEntry { key: "q", label: "Quit", action: Action::Quit },
];

fn lookup(choice: &str) -> Option<Action> {
    let choice = choice.trim();
    ENTRIES
        .iter()
        .find(|e| e.key.eq_ignore_ascii_case(choice))
        .map(|e| e.action)
}

/// Read one trimmed line from stdin after printing `message`.
///
/// Returns `None` at end of input.
pub(crate) fn prompt(message: &str) -> Result<Option<String>> {
    print!("{message}");
    io::stdout().flush().context("Failed to write prompt")?;
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

/// Run the menu on stdin until the user quits or input ends.
pub(crate) async fn run(app: &App) -> Result<()> {
    run_with(app, &mut prompt).await
}

/// Run the menu, reading every answer through `ask`.
async fn run_with<F>(app: &App, ask: &mut F) -> Result<()>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    loop {
        println!("\n{}", "=".repeat(60));
        println!("DD2VTT Map Manager");
        println!("{}", "=".repeat(60));
        for entry in ENTRIES {
            println!("  {}. {}", entry.key, entry.label);
        }

        let Some(choice) = ask("\nEnter choice: ")? else {
            return Ok(());
        };
        let Some(action) = lookup(&choice) else {
            println!("Invalid choice '{choice}'");
            continue;
        };
        if action == Action::Quit {
            return Ok(());
        }

        // A failed action is reported and the menu keeps running.
        let command = match command_for(app, action, ask) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("Error: {e:#}");
                continue;
            }
        };
        if let Err(e) = run_command(app, command).await {
            eprintln!("Error: {e:#}");
        }
    }
}

/// Turn a menu action into a subcommand, asking for whatever it needs.
///
/// `None` means the user backed out (or gave unusable input).
fn command_for<F>(app: &App, action: Action, ask: &mut F) -> Result<Option<Command>>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let command = match action {
        Action::Probe => Command::Probe,
        Action::DownloadSample => download(true, false, Vec::new()),
        Action::DownloadAll => download(false, true, Vec::new()),
        Action::DownloadCategories => {
            let categories = app.categories();
            println!("\nAvailable categories:");
            for (i, category) in categories.iter().enumerate() {
                println!("  {:2}. {}", i + 1, category);
            }
            let Some(input) = ask("\nEnter category numbers (comma-separated, e.g., 1,3,5): ")?
            else {
                return Ok(None);
            };
            match pick_categories(categories, &input) {
                Some(picked) => download(false, false, picked),
                None => {
                    println!("Invalid input '{input}'");
                    return Ok(None);
                }
            }
        }
        Action::DownloadOne => {
            let Some(category) = ask("Category (e.g., beach): ")? else {
                return Ok(None);
            };
            let Some(map) = ask("Map name without extension (e.g., simple-beach): ")? else {
                return Ok(None);
            };
            if category.is_empty() || map.is_empty() {
                println!("Both a category and a map name are required");
                return Ok(None);
            }
            Command::Fetch { category, map }
        }
        Action::ExportAll => Command::Export {
            file: None,
            output: None,
        },
        Action::View => {
            crate::cmd_list(app)?;
            let Some(map) = ask("\nEnter map number to view: ")? else {
                return Ok(None);
            };
            Command::View {
                map,
                no_open: false,
            }
        }
        Action::List => Command::List,
        Action::Index => Command::Index,
        Action::Quit => return Ok(None),
    };
    Ok(Some(command))
}

fn download(sample: bool, all: bool, categories: Vec<String>) -> Command {
    Command::Download {
        sample,
        all,
        categories,
        limit: None,
        yes: false,
    }
}

/// Parse `1,3,5` into the matching category names (1-based, deduplicated).
fn pick_categories(categories: &[String], input: &str) -> Option<Vec<String>> {
    let mut picked: Vec<String> = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part.parse().ok()?;
        let category = categories.get(n.checked_sub(1)?)?;
        if !picked.contains(category) {
            picked.push(category.clone());
        }
    }
    (!picked.is_empty()).then_some(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn cats() -> Vec<String> {
        ["beach", "caves", "dungeons"].map(String::from).to_vec()
    }

    #[test]
    fn every_key_is_unique_and_resolves() {
        for entry in ENTRIES {
            assert_eq!(lookup(entry.key), Some(entry.action));
            assert_eq!(ENTRIES.iter().filter(|e| e.key == entry.key).count(), 1);
        }
        assert_eq!(lookup(" Q "), Some(Action::Quit));
        assert_eq!(lookup("42"), None);
    }

    #[test]
    fn category_numbers_are_one_based() {
        assert_eq!(
            pick_categories(&cats(), "1, 3"),
            Some(vec!["beach".to_string(), "dungeons".to_string()])
        );
        assert_eq!(pick_categories(&cats(), "2,2"), Some(vec!["caves".to_string()]));
    }

    #[test]
    fn bad_category_input_is_rejected() {
        assert_eq!(pick_categories(&cats(), "0"), None);
        assert_eq!(pick_categories(&cats(), "4"), None);
        assert_eq!(pick_categories(&cats(), "beach"), None);
        assert_eq!(pick_categories(&cats(), " , "), None);
    }

    #[tokio::test]
    async fn failed_action_returns_to_the_menu() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::for_tests(&tmp.path().join("no-maps-here"));

        // View (needs the listing), List, then Quit; both actions fail.
        let mut input: VecDeque<&str> = VecDeque::from(["7", "8", "q"]);
        let mut asked: Vec<String> = Vec::new();
        let mut ask = |message: &str| -> Result<Option<String>> {
            asked.push(message.to_string());
            Ok(input.pop_front().map(String::from))
        };

        run_with(&app, &mut ask).await.unwrap();

        assert!(input.is_empty());
        assert_eq!(asked.iter().filter(|m| m.contains("Enter choice")).count(), 3);
        assert!(!asked.iter().any(|m| m.contains("map number")));
    }

    #[tokio::test]
    async fn end_of_input_leaves_the_menu() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::for_tests(tmp.path());
        let mut ask = |_: &str| -> Result<Option<String>> { Ok(None) };
        assert!(run_with(&app, &mut ask).await.is_ok());
    }
}
