//! Interactive console session over the feed.

use std::io;

use tracing::debug;

use crate::application::console::{Console, ConsoleError, DeleteOutcome};
use crate::application::editor::PostEditForm;

use super::gallery;
use super::terminal::Terminal;
use super::views;

const HELP: &str = "\
commands:
  n | p            next / previous page
  g <page>         go to page
  r                reload the current page
  s <id>           show a post
  t <id>           toggle approved/pending
  d <id>           delete a post
  a <description>  add a post
  v <id> [index]   view a post's images
  q                quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    GoTo(u32),
    Reload,
    Show(i64),
    Toggle(i64),
    Delete(i64),
    Add(String),
    View { id: i64, start: usize },
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<BrowseCommand> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
    let mut args = rest.split_whitespace();

    let command = match verb {
        "n" | "next" => BrowseCommand::Next,
        "p" | "prev" => BrowseCommand::Prev,
        "g" | "page" => BrowseCommand::GoTo(args.next()?.parse().ok()?),
        "r" | "reload" => BrowseCommand::Reload,
        "s" | "show" => BrowseCommand::Show(args.next()?.parse().ok()?),
        "t" | "toggle" => BrowseCommand::Toggle(args.next()?.parse().ok()?),
        "d" | "delete" => BrowseCommand::Delete(args.next()?.parse().ok()?),
        "a" | "add" if !rest.is_empty() => BrowseCommand::Add(rest.to_string()),
        "v" | "view" => {
            let id = args.next()?.parse().ok()?;
            let start = match args.next() {
                Some(index) => index.parse().ok()?,
                None => 0,
            };
            BrowseCommand::View { id, start }
        }
        "h" | "help" | "?" => BrowseCommand::Help,
        "q" | "quit" | "exit" => BrowseCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Run until `q` or end of input.
///
/// Repository failures have already been announced by the console, so they
/// do not end the session.
pub async fn run(console: &mut Console, terminal: &Terminal) -> io::Result<()> {
    if console.load_page().await.is_ok() {
        show_page(console, terminal)?;
    }
    terminal.notice("type `h` for help")?;

    while let Some(line) = terminal.read_line()? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            terminal.notice(&format!("unknown command: {}", line.trim()))?;
            continue;
        };
        debug!(?command, "browse command");

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => terminal.print(HELP)?,
            BrowseCommand::Next => match console.next_page().await {
                Ok(true) => show_page(console, terminal)?,
                Ok(false) => terminal.notice("already on the last page")?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Prev => match console.prev_page().await {
                Ok(true) => show_page(console, terminal)?,
                Ok(false) => terminal.notice("already on the first page")?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::GoTo(page) => match console.load_page_at(page).await {
                Ok(()) => show_page(console, terminal)?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Reload => match console.load_page().await {
                Ok(()) => show_page(console, terminal)?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Show(id) => match console.post(id).await {
                Ok(post) => terminal.print(&views::post_detail(&post))?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Toggle(id) => match console.toggle_status(id).await {
                Ok(status) => terminal.print(&format!("post {id} is now {status}"))?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Delete(id) => match console.delete(id).await {
                Ok(DeleteOutcome::Deleted) => show_page(console, terminal)?,
                Ok(DeleteOutcome::Declined) => terminal.notice("deletion cancelled")?,
                Err(err) => report(terminal, &err)?,
            },
            BrowseCommand::Add(description) => {
                let mut form = PostEditForm::blank();
                form.set_description(description);
                match console.submit_form(&form).await {
                    Ok(()) => show_page(console, terminal)?,
                    Err(err) => report(terminal, &err)?,
                }
            }
            BrowseCommand::View { id, start } => match console.post(id).await {
                Ok(post) => gallery::run(terminal, post.images, start)?,
                Err(err) => report(terminal, &err)?,
            },
        }
    }
    Ok(())
}

fn show_page(console: &Console, terminal: &Terminal) -> io::Result<()> {
    terminal.print(&views::page(console.posts(), console.cursor()))
}

/// Only errors the console did not already announce are printed.
fn report(terminal: &Terminal, err: &ConsoleError) -> io::Result<()> {
    match err {
        ConsoleError::NotFound(id) => terminal.notice(&format!("post {id} not found")),
        ConsoleError::Repository(_) | ConsoleError::Validation(_) => Ok(()),
    }
}
