use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, stdout, Stdout, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use wordmark_core::core::annotator::{Marker, MARKER_CLASS};
use wordmark_core::core::config::EngineConfig;
use wordmark_core::core::document::{Document, NodeId};
use wordmark_core::core::scheduler::LocalScheduler;
use wordmark_core::core::types::{Rect, Size};
use wordmark_core::core::vocabulary::VocabularySource;
use wordmark_core::persistence::{import_word_list, Wordbook, WordbookFile};
use wordmark_core::HighlightEngine;

const LOG_PATH: &str = "wordmark.log";
const FRAME: Duration = Duration::from_millis(30);

/// Restores the terminal however the viewer exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: wordmark <document.txt> <wordbook.json|.bin|.txt> [config.json]");
        std::process::exit(2);
    }
    init_logging()?;

    let text = std::fs::read_to_string(&args[1])?;
    let config = match args.get(3) {
        Some(path) => EngineConfig::from_path(Path::new(path)).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        None => EngineConfig::default(),
    };
    let source = open_wordbook(&args[2], config.book_id)?;

    let (cols, rows) = terminal::size()?;
    let viewport = Size::new(cols as f64, rows.saturating_sub(2) as f64);
    let (document, lines) = build_document(&text, viewport);
    let document = Rc::new(RefCell::new(document));
    let scheduler = Rc::new(LocalScheduler::new());

    let mut engine = HighlightEngine::new(Rc::clone(&document), scheduler.clone(), source, config);
    let outcome = engine.init();
    tracing::info!(?outcome, "viewer started");

    let mut out = stdout();
    let guard = TerminalGuard::enter(&mut out)?;
    let mut focus: Option<usize> = None;
    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        scheduler.advance(now - last_tick);
        last_tick = now;
        // One slice per frame, the way an animation-frame callback would run.
        scheduler.run_next();

        let visible = visible_markers(&document.borrow());
        render(&mut out, &document.borrow(), &lines, &engine, focus.and_then(|i| visible.get(i).copied()))?;

        if !event::poll(FRAME)? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let scroll_top = document.borrow().scroll_top();
        let page = viewport.height.max(1.0);
        let max_top = (lines.len() as f64 - page).max(0.0);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Up => scroll(&document, scroll_top - 1.0, max_top),
            KeyCode::Down => scroll(&document, scroll_top + 1.0, max_top),
            KeyCode::PageUp => scroll(&document, scroll_top - page, max_top),
            KeyCode::PageDown => scroll(&document, scroll_top + page, max_top),
            KeyCode::Tab if !visible.is_empty() => {
                let next = focus.map_or(0, |i| (i + 1) % visible.len());
                if let Some(&previous) = focus.and_then(|i| visible.get(i)) {
                    engine.pointer_leave(previous);
                }
                engine.pointer_enter(visible[next]);
                focus = Some(next);
            }
            KeyCode::Char('t') => {
                let enable = !engine.is_active();
                engine.set_enabled(enable);
                focus = None;
            }
            _ => {}
        }
        if matches!(key.code, KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown) {
            if let Some(&node) = focus.and_then(|i| visible.get(i)) {
                engine.pointer_leave(node);
            }
            focus = None;
        }
    }

    drop(guard);
    engine.teardown();
    let stats = engine.stats();
    println!(
        "passes: {}, slices: {}, units tested: {}, markers: {}, rescans: {}",
        stats.passes, stats.slices, stats.units_tested, stats.markers_created, stats.rescans
    );
    Ok(())
}

fn init_logging() -> io::Result<()> {
    let file = File::create(LOG_PATH)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// `.txt` files are plain word lists; anything else is a wordbook file.
fn open_wordbook(path: &str, book_id: u64) -> io::Result<Box<dyn VocabularySource>> {
    if path.ends_with(".txt") {
        let words = import_word_list(&std::fs::read_to_string(path)?);
        Ok(Box::new(Wordbook::with_book(book_id, words)))
    } else {
        Ok(Box::new(WordbookFile::new(path)))
    }
}

/// One paragraph element per line, each a single row tall.
fn build_document(text: &str, viewport: Size) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new(viewport);
    let root = doc.root();
    let line_count = text.lines().count();
    let _ = doc.set_rect(root, Rect::new(0.0, 0.0, viewport.width, line_count as f64));
    let mut lines = Vec::with_capacity(line_count);
    for (i, line) in text.lines().enumerate() {
        let Ok(p) = doc.append_element(root, "p", Rect::new(0.0, i as f64, viewport.width, 1.0)) else {
            continue;
        };
        if !line.is_empty() {
            let _ = doc.append_text(p, line);
        }
        lines.push(p);
    }
    (doc, lines)
}

fn scroll(document: &Rc<RefCell<Document>>, top: f64, max_top: f64) {
    document.borrow_mut().scroll_to(top.clamp(0.0, max_top));
}

fn visible_markers(doc: &Document) -> Vec<NodeId> {
    let top = doc.scroll_top();
    let bottom = top + doc.viewport().height;
    doc.query_class(MARKER_CLASS)
        .into_iter()
        .filter(|&node| {
            doc.bounding_rect(node)
                .map_or(false, |rect| rect.top >= top && rect.top < bottom)
        })
        .collect()
}

fn render<V: VocabularySource>(
    out: &mut Stdout,
    doc: &Document,
    lines: &[NodeId],
    engine: &HighlightEngine<V>,
    focused: Option<NodeId>,
) -> io::Result<()> {
    let first = doc.scroll_top() as usize;
    let height = doc.viewport().height as usize;
    let width = doc.viewport().width as usize;

    for row in 0..height {
        queue!(out, cursor::MoveTo(0, row as u16), terminal::Clear(ClearType::CurrentLine))?;
        let Some(&line) = lines.get(first + row) else { continue };
        let mut used = 0;
        for child in doc.children(line) {
            if used >= width {
                break;
            }
            let content = doc.text_content(child);
            let clipped: String = content.chars().take(width - used).collect();
            used += clipped.chars().count();
            if Marker::from_node(doc, child).is_some() {
                if Some(child) == focused {
                    queue!(out, SetAttribute(Attribute::Reverse))?;
                }
                queue!(
                    out,
                    SetForegroundColor(Color::Blue),
                    SetAttribute(Attribute::Underlined),
                    Print(clipped),
                    SetAttribute(Attribute::Reset),
                    ResetColor
                )?;
            } else {
                queue!(out, Print(clipped))?;
            }
        }
    }

    let status = match engine.popover() {
        Some(view) => format!("{} {} {}", view.marker.word, view.marker.accent, view.marker.meaning),
        None if engine.is_active() => format!(
            "{} words | {} markers | [arrows] scroll [tab] inspect [t] toggle [q] quit",
            engine.vocabulary_len(),
            engine.stats().markers_created
        ),
        None => "highlighting off | [t] toggle [q] quit".to_string(),
    };
    queue!(
        out,
        cursor::MoveTo(0, height as u16 + 1),
        terminal::Clear(ClearType::CurrentLine),
        SetAttribute(Attribute::Bold),
        Print(status.chars().take(width).collect::<String>()),
        SetAttribute(Attribute::Reset)
    )?;
    out.flush()
}
