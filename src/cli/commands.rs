use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::{App, FormOutcome};
use crate::config::AppConfig;
use crate::dispatch::{ApiClient, HttpDispatcher, NotesApi};
use crate::form::{Note, NoteForm};
use crate::providers::{Clock, IdSource, UuidIds, WallClock};

#[derive(Args, Debug, Clone, Default)]
pub struct NewArgs {
    /// Title for the note; skips the interactive form when provided
    #[arg(long)]
    pub title: Option<String>,
    /// Checklist entry (repeatable); piped stdin lines are appended too
    #[arg(long = "item")]
    pub items: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub note_id: i64,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub note_id: i64,
}

pub fn new_note(config: Arc<AppConfig>, args: NewArgs) -> Result<()> {
    let api = api_client(&config)?;
    let mut ids = UuidIds;
    let clock = WallClock;
    let note = Note {
        id: ids.next_id(),
        title: String::new(),
        timestamp: clock.now(),
    };
    let form = NoteForm::create(note, Box::new(ids), Box::new(clock));

    if let Some(title) = args.title {
        let title = title.trim().to_owned();
        if title.is_empty() {
            bail!("note title cannot be empty");
        }
        let mut descriptions = args.items;
        if let Some(piped) = read_stdin()? {
            descriptions.extend(piped.lines().map(str::to_owned));
        }
        return submit_directly(form, api, &title, &descriptions);
    }

    if !args.items.is_empty() {
        bail!("--item requires --title; open the form to add items interactively");
    }

    report_outcome(run_form(config, form, api)?);
    Ok(())
}

pub fn edit_note(config: Arc<AppConfig>, args: EditArgs) -> Result<()> {
    let api = api_client(&config)?;
    let (note, items) = api
        .fetch(args.note_id)
        .with_context(|| format!("loading note #{}", args.note_id))?;
    let form = NoteForm::edit(note, items, Box::new(UuidIds), Box::new(WallClock));

    report_outcome(run_form(config, form, api)?);
    Ok(())
}

pub fn delete_note(config: Arc<AppConfig>, args: DeleteArgs) -> Result<()> {
    let api = api_client(&config)?;
    let (note, _items) = api
        .fetch(args.note_id)
        .with_context(|| format!("loading note #{}", args.note_id))?;
    api.delete(&note)
        .with_context(|| format!("deleting note #{}", note.id))?;

    let title = if note.title.is_empty() {
        "<untitled>".to_string()
    } else {
        note.title
    };
    println!("Deleted note #{} ({title})", note.id);
    Ok(())
}

fn run_form(config: Arc<AppConfig>, form: NoteForm, api: ApiClient) -> Result<FormOutcome> {
    let dispatcher = HttpDispatcher::spawn(api).context("starting dispatch worker")?;
    let mut app = App::new(config, form, Box::new(dispatcher));
    let outcome = app.run()?;
    // Dropping the app joins the dispatch worker, so queued requests
    // complete before we report back.
    drop(app);
    Ok(outcome)
}

fn submit_directly(
    mut form: NoteForm,
    api: ApiClient,
    title: &str,
    descriptions: &[String],
) -> Result<()> {
    let note_id = form.note().id;
    let mut dispatcher = HttpDispatcher::spawn(api).context("starting dispatch worker")?;
    assemble_note(&mut form, title, descriptions);
    form.submit(&dispatcher);
    dispatcher.shutdown();
    println!("Created note #{note_id}");
    Ok(())
}

/// Feeds a title and checklist entries through the form machine the same
/// way the interactive path does: each committed description re-opens the
/// pending slot the next one fills.
fn assemble_note(form: &mut NoteForm, title: &str, descriptions: &[String]) {
    form.set_title(title);
    for description in descriptions {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(slot) = form.blank_item_id() else {
            break;
        };
        form.edit_item(slot, trimmed);
    }
}

fn report_outcome(outcome: FormOutcome) {
    match outcome {
        FormOutcome::Submitted => println!("Note saved"),
        FormOutcome::Deleted => println!("Note deleted"),
        FormOutcome::Canceled => println!("Canceled; nothing sent"),
    }
}

fn api_client(config: &AppConfig) -> Result<ApiClient> {
    ApiClient::new(&config.api.base_url, config.api.timeout())
        .with_context(|| format!("configuring notes API client for {}", config.api.base_url))
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}
