use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use doc_model::{
    Alignment, DocumentType, NotePatch, NotePosition, OverlayNote, PointerEvent, Preferences,
    ProjectLink, ScriptAction, ScriptState, ShiftDirection, TextFormat, ViewMode, WriterTool,
};
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;
use storage::{FileStore, ScriptSession};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "scriptdesk")]
#[command(about = "Paginated script editor")]
pub struct Cli {
    /// Directory holding documents and preferences.
    #[arg(long, global = true, env = "SCRIPTDESK_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Document to operate on.
    #[arg(long, global = true, default_value = "default", value_name = "ID")]
    doc: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the document state as JSON.
    Show,
    /// Append a blank page.
    AddPage,
    /// Remove a page and the notes attached to it.
    DeletePage { page: usize },
    /// Replace the content of a page.
    Write { page: usize, text: String },
    /// Sticky notes over pages.
    #[command(subcommand)]
    Note(NoteCommand),
    /// Page window and navigation.
    #[command(subcommand)]
    View(ViewCommand),
    /// Append a writer macro to every visible page.
    Tool {
        #[arg(value_name = "NAME", required_unless_present = "text")]
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        text: Option<String>,
    },
    /// Edit document metadata.
    Meta(MetaArgs),
    /// Toggle formatting flags.
    Format(FormatArgs),
    /// Record a version snapshot.
    Save { title: Option<String> },
    /// List version snapshots, newest first.
    History,
    /// Replace the document with a saved version.
    Restore {
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        timestamp: Option<u64>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Free-form notes feed.
    #[command(subcommand)]
    Feed(FeedCommand),
    /// Show or change preferences.
    Prefs {
        #[arg(long, value_enum)]
        default_view: Option<ModeArg>,
        #[arg(long)]
        stagger: Option<bool>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum NoteCommand {
    Add {
        page: usize,
    },
    Edit {
        page: usize,
        id: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        at: Option<(f64, f64)>,
    },
    Move {
        page: usize,
        id: String,
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        dy: f64,
    },
    /// Replay a pointer drag from one point to another.
    Drag {
        page: usize,
        id: String,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: (f64, f64),
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: (f64, f64),
    },
    Delete {
        page: usize,
        id: String,
    },
    List {
        page: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
enum ViewCommand {
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    Shift {
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    Select {
        page: usize,
    },
}

#[derive(Debug, Subcommand)]
enum FeedCommand {
    Add { text: String },
    Delete { id: String },
    List,
}

#[derive(Debug, Args)]
struct MetaArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    document_type: Option<String>,
    #[arg(long, conflicts_with = "clear_project_link")]
    project_link: Option<String>,
    #[arg(long)]
    clear_project_link: bool,
    #[arg(long)]
    project_name: Option<String>,
}

#[derive(Debug, Args)]
struct FormatArgs {
    #[arg(long)]
    bold: bool,
    #[arg(long)]
    italic: bool,
    #[arg(long)]
    underline: bool,
    #[arg(long)]
    align: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Single,
    Double,
    Quad,
    All,
}

impl From<ModeArg> for ViewMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => ViewMode::Single,
            ModeArg::Double => ViewMode::Double,
            ModeArg::Quad => ViewMode::Quad,
            ModeArg::All => ViewMode::All,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Prev,
    Next,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput<'a> {
    document: &'a str,
    title: &'a str,
    document_type: DocumentType,
    project_link: Option<&'a ProjectLink>,
    custom_project_name: &'a str,
    format: TextFormat,
    view: ViewOutput,
    pages: Vec<PageOutput<'a>>,
    versions: usize,
    feed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewOutput {
    mode: ViewMode,
    window_start: usize,
    active_page: usize,
    visible: Vec<usize>,
    can_shift_prev: bool,
    can_shift_next: bool,
}

#[derive(Debug, Serialize)]
struct PageOutput<'a> {
    index: usize,
    content: &'a str,
    notes: &'a [OverlayNote],
}

#[derive(Debug, Serialize)]
struct VersionOutput<'a> {
    timestamp: u64,
    title: &'a str,
    pages: usize,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    if matches!(cli.command, Commands::Version) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let store = match cli.data_dir {
        Some(dir) => FileStore::with_root(dir),
        None => FileStore::from_default_project().context("failed to resolve data directory")?,
    };

    if let Commands::Prefs { default_view, stagger } = cli.command {
        return run_prefs(&store, default_view, stagger);
    }

    if cli.doc.is_empty() || cli.doc.contains(['/', '\\']) || cli.doc == "." || cli.doc == ".." {
        anyhow::bail!("invalid document id: {}", cli.doc);
    }

    let preferences = load_preferences(&store);
    let mut session = ScriptSession::open(store, cli.doc, preferences);

    match cli.command {
        Commands::Show => print_json(&show_output(&session)),
        Commands::AddPage => {
            session.apply(ScriptAction::AddPage);
            println!("{}", session.state().page_count() - 1);
            Ok(())
        }
        Commands::DeletePage { page } => report(session.apply(ScriptAction::DeletePage { page })),
        Commands::Write { page, text } => {
            report(session.apply(ScriptAction::UpdatePageContent { page, text }))
        }
        Commands::Note(command) => run_note(&mut session, command),
        Commands::View(command) => run_view(&mut session, command),
        Commands::Tool { name, text } => {
            let text = match (name, text) {
                (_, Some(text)) => text,
                (Some(name), None) => name.parse::<WriterTool>()?.macro_text().to_owned(),
                (None, None) => anyhow::bail!("either a tool name or --text is required"),
            };
            report(session.apply(ScriptAction::ApplyTool { text }))
        }
        Commands::Meta(args) => run_meta(&mut session, args),
        Commands::Format(args) => run_format(&mut session, args),
        Commands::Save { title } => {
            if !session.apply(ScriptAction::SaveVersion { title }) {
                anyhow::bail!("version history has no later timestamp available");
            }
            let latest = session.state().history.latest().context("snapshot was not recorded")?;
            println!("{}", latest.timestamp);
            Ok(())
        }
        Commands::History => {
            let versions: Vec<VersionOutput<'_>> = session
                .state()
                .history
                .list()
                .iter()
                .map(|snapshot| VersionOutput {
                    timestamp: snapshot.timestamp,
                    title: &snapshot.title,
                    pages: snapshot.pages.len(),
                })
                .collect();
            print_json(&versions)
        }
        Commands::Restore { timestamp, title } => {
            let history = &session.state().history;
            let found = match (timestamp, title.as_deref()) {
                (Some(timestamp), _) => history.find(timestamp),
                (None, Some(title)) => history.find_by_title(title),
                (None, None) => None,
            };
            let timestamp = found.map(|snapshot| snapshot.timestamp).context("version not found")?;
            report(session.apply(ScriptAction::RestoreVersion { timestamp }))
        }
        Commands::Feed(command) => run_feed(&mut session, command),
        Commands::Prefs { .. } | Commands::Version => Ok(()),
    }
}

fn run_note(session: &mut ScriptSession<FileStore>, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Add { page } => {
            if !session.apply(ScriptAction::AddNote { page }) {
                anyhow::bail!("page {page} does not exist");
            }
            let note = session.state().overlay.notes_for(page).last().context("note missing")?;
            println!("{}", note.id);
            Ok(())
        }
        NoteCommand::Edit { page, id, content, at } => {
            let patch = NotePatch {
                content,
                position: at.and_then(|(x, y)| NotePosition::new(x, y)),
            };
            report(session.apply(ScriptAction::UpdateNote { page, note_id: id, patch }))
        }
        NoteCommand::Move { page, id, dx, dy } => {
            report(session.apply(ScriptAction::MoveNote { page, note_id: id, dx, dy }))
        }
        NoteCommand::Drag { page, id, from, to } => {
            let events = [
                PointerEvent::Down { page_index: page, note_id: id, x: from.0, y: from.1 },
                PointerEvent::Move { x: to.0, y: to.1 },
                PointerEvent::Up,
            ];
            let moved = session.apply_all(events.into_iter().map(ScriptAction::Pointer)) > 0;
            report(moved)
        }
        NoteCommand::Delete { page, id } => {
            report(session.apply(ScriptAction::DeleteNote { page, note_id: id }))
        }
        NoteCommand::List { page } => {
            let state = session.state();
            match page {
                Some(page) => print_json(&state.overlay.notes_for(page)),
                None => print_json(&state.overlay),
            }
        }
    }
}

fn run_view(session: &mut ScriptSession<FileStore>, command: ViewCommand) -> Result<()> {
    let action = match command {
        ViewCommand::Mode { mode } => ScriptAction::SetViewMode(mode.into()),
        ViewCommand::Shift { direction: DirectionArg::Prev } => {
            ScriptAction::Shift(ShiftDirection::Previous)
        }
        ViewCommand::Shift { direction: DirectionArg::Next } => {
            ScriptAction::Shift(ShiftDirection::Next)
        }
        ViewCommand::Select { page } => ScriptAction::SelectPage { page },
    };

    session.apply(action);
    print_json(&view_output(session.state()))
}

fn run_meta(session: &mut ScriptSession<FileStore>, args: MetaArgs) -> Result<()> {
    let mut actions = Vec::new();

    if let Some(title) = args.title {
        actions.push(ScriptAction::SetTitle(title));
    }
    if let Some(document_type) = args.document_type {
        actions.push(ScriptAction::SetDocumentType(document_type.parse()?));
    }
    if let Some(link) = args.project_link {
        actions.push(ScriptAction::SetProjectLink(Some(ProjectLink(link))));
    }
    if args.clear_project_link {
        actions.push(ScriptAction::SetProjectLink(None));
    }
    if let Some(name) = args.project_name {
        actions.push(ScriptAction::SetCustomProjectName(name));
    }

    report(session.apply_all(actions) > 0)
}

fn run_format(session: &mut ScriptSession<FileStore>, args: FormatArgs) -> Result<()> {
    let mut actions = Vec::new();

    if args.bold {
        actions.push(ScriptAction::ToggleBold);
    }
    if args.italic {
        actions.push(ScriptAction::ToggleItalic);
    }
    if args.underline {
        actions.push(ScriptAction::ToggleUnderline);
    }
    if let Some(align) = args.align {
        actions.push(ScriptAction::SetAlignment(align.parse::<Alignment>()?));
    }

    session.apply_all(actions);
    print_json(&session.state().format)
}

fn run_feed(session: &mut ScriptSession<FileStore>, command: FeedCommand) -> Result<()> {
    match command {
        FeedCommand::Add { text } => {
            session.apply(ScriptAction::AddFeedNote { content: text });
            let entry = session.state().feed.list().first().context("feed entry missing")?;
            println!("{}", entry.id);
            Ok(())
        }
        FeedCommand::Delete { id } => report(session.apply(ScriptAction::DeleteFeedNote { id })),
        FeedCommand::List => print_json(&session.state().feed),
    }
}

fn run_prefs(
    store: &FileStore,
    default_view: Option<ModeArg>,
    stagger: Option<bool>,
) -> Result<()> {
    let mut preferences = load_preferences(store);

    if default_view.is_some() || stagger.is_some() {
        if let Some(mode) = default_view {
            preferences.default_view_mode = mode.into();
        }
        if let Some(stagger) = stagger {
            preferences.stagger_new_notes = stagger;
        }
        store.save_preferences(&preferences).context("failed to save preferences")?;
    }

    print_json(&preferences)
}

fn load_preferences(store: &FileStore) -> Preferences {
    store.load_preferences().unwrap_or_else(|error| {
        warn!(%error, "unreadable preferences; using defaults");
        Preferences::default()
    })
}

fn show_output(session: &ScriptSession<FileStore>) -> ShowOutput<'_> {
    let state = session.state();

    ShowOutput {
        document: session.document_id(),
        title: &state.meta.title,
        document_type: state.meta.document_type,
        project_link: state.meta.project_link.as_ref(),
        custom_project_name: &state.meta.custom_project_name,
        format: state.format,
        view: view_output(state),
        pages: state
            .pages
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| PageOutput {
                index,
                content: &page.content,
                notes: state.overlay.notes_for(index),
            })
            .collect(),
        versions: state.history.len(),
        feed: state.feed.len(),
    }
}

fn view_output(state: &ScriptState) -> ViewOutput {
    ViewOutput {
        mode: state.view.mode,
        window_start: state.view.window_start,
        active_page: state.view.active_page,
        visible: state.visible_pages().collect(),
        can_shift_prev: state.can_shift(ShiftDirection::Previous),
        can_shift_next: state.can_shift(ShiftDirection::Next),
    }
}

fn report(changed: bool) -> Result<()> {
    println!("{}", if changed { "ok" } else { "unchanged" });
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn parse_coordinate(value: &str) -> Result<f64, String> {
    let parsed = value.trim().parse::<f64>().map_err(|error| error.to_string())?;
    if !parsed.is_finite() {
        return Err(format!("{value} is not a finite number"));
    }
    Ok(parsed)
}

fn parse_point(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value.split_once(',').ok_or_else(|| format!("expected X,Y but got {value}"))?;
    let x = parse_coordinate(x).map_err(|error| format!("invalid x: {error}"))?;
    let y = parse_coordinate(y).map_err(|error| format!("invalid y: {error}"))?;
    Ok((x, y))
}
