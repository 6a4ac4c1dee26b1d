//! Interactive terminal shells.
//!
//! Two REPLs share the rendering helpers: `hakibot` (the general
//! assistant) and the lens hub (research, case chat, document
//! assistant). Rustyline owns line editing and history; assistant
//! markdown renders through termimad; error turns are styled red.
//!
//! Ctrl-C during an in-flight exchange signals that exchange's cancel
//! token only; the shell then shows the fixed cancellation line and the
//! REPL keeps running.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use termimad::MadSkin;

use crate::chat::assistants::{self, QUICK_QUESTIONS, SUGGESTED_QUESTIONS};
use crate::chat::message::{Turn, TurnRole};
use crate::chat::shell::{ChatBackend, ChatShell, SubmitRefusal};
use crate::config::Config;
use crate::lens::client::{DocumentChatBackend, HttpLensClient, LensApi};
use crate::lens::research::ResearchSession;
use crate::lens::types::{ResearchMode, suggested_urls};
use crate::llm::LlmClient;
use crate::matter::MatterBook;

fn history_path(name: &str) -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("hakilens").join(format!("{name}_history")))
}

fn make_editor(history: Option<&PathBuf>) -> Result<DefaultEditor> {
    let mut editor = DefaultEditor::new().context("initialize line editor")?;
    if let Some(path) = history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(path);
    }
    Ok(editor)
}

fn print_turn(skin: &MadSkin, turn: &Turn) {
    match turn.role {
        TurnRole::User => println!("{} {}", "you:".bold(), turn.text),
        TurnRole::System => println!("{}", turn.text.clone().dim()),
        TurnRole::Error => {
            println!("{} {}", "error:".red().bold(), turn.text.clone().red());
        }
        TurnRole::Assistant => {
            skin.print_text(&turn.text);
            if !turn.references.is_empty() {
                println!("{}", "References:".dim());
                for (i, reference) in turn.references.iter().take(3).enumerate() {
                    println!("  {}. {}", i + 1, reference);
                }
            }
            if let Some(confidence) = turn.confidence {
                println!("{}", format!("confidence: {confidence:.2}").dim());
            }
        }
    }
}

fn print_new_turns(skin: &MadSkin, shell: &ChatShell, seen: &mut usize) {
    for turn in &shell.turns()[*seen..] {
        print_turn(skin, turn);
    }
    *seen = shell.turns().len();
}

/// Run one exchange, letting Ctrl-C cancel it cooperatively.
async fn exchange(shell: &mut ChatShell, backend: &dyn ChatBackend, text: &str) {
    let outbound = match shell.begin_exchange(text) {
        Ok(outbound) => outbound,
        Err(SubmitRefusal::Empty) => return,
        Err(SubmitRefusal::Busy) => {
            println!("{}", "An exchange is already in flight.".dim());
            return;
        }
        // A gated shell may have appended its own error turn; the
        // caller prints whatever is new.
        Err(SubmitRefusal::MissingDocumentId) => {
            println!(
                "{}",
                "Set a document id first (run a research pass or use `id <value>`).".dim()
            );
            return;
        }
    };

    println!("{}", "Analyzing… press Ctrl-C to stop.".dim());
    let request = backend.send(outbound);
    tokio::pin!(request);
    let result = loop {
        tokio::select! {
            result = &mut request => break result,
            _ = tokio::signal::ctrl_c() => {
                shell.cancel_in_flight();
            }
        }
    };
    shell.complete_exchange(result);
}

/// The general assistant REPL.
pub async fn run_hakibot(config: &Config, matters: &mut MatterBook) -> Result<()> {
    config.llm.require_api_key()?;
    let backend = LlmClient::new(config.llm.clone());
    let mut shell = assistants::hakibot();
    let skin = MadSkin::default();
    let mut seen = 0usize;

    println!("{}", format!("[{}]", matters.active().chip()).dim());
    print_new_turns(&skin, &shell, &mut seen);
    println!("{}", "Commands: /quick, /matter [id], /transcript, /clear, /exit".dim());

    let history = history_path("hakibot");
    let mut editor = make_editor(history.as_ref())?;

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("read input"),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);

        match line.as_str() {
            "/exit" | "/quit" => break,
            "/clear" => {
                if shell.clear() {
                    seen = 0;
                    println!("{}", "History cleared.".dim());
                }
                continue;
            }
            "/transcript" => {
                println!("{}", shell.transcript());
                continue;
            }
            "/quick" => {
                for (i, question) in QUICK_QUESTIONS.iter().enumerate() {
                    println!("  {}. {}", i + 1, question);
                }
                println!("{}", "Send one with /quick <n>.".dim());
                continue;
            }
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("/quick ") {
            let Some(question) = rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| QUICK_QUESTIONS.get(n.wrapping_sub(1)))
            else {
                println!("{}", "No such quick question.".dim());
                continue;
            };
            seen = shell.turns().len();
            exchange(&mut shell, &backend, question).await;
            print_new_turns(&skin, &shell, &mut seen);
            continue;
        }

        if let Some(rest) = line.strip_prefix("/matter") {
            let id = rest.trim();
            if id.is_empty() {
                for matter in matters.matters() {
                    println!("  {} — {} ({})", matter.id, matter.name, matter.client);
                }
            } else if matters.set_active(id) {
                println!("{}", format!("[{}]", matters.active().chip()).dim());
            } else {
                println!("{}", "Unknown matter id.".dim());
            }
            continue;
        }

        seen = shell.turns().len();
        exchange(&mut shell, &backend, &line).await;
        print_new_turns(&skin, &shell, &mut seen);
    }

    if let Some(path) = history {
        let _ = editor.save_history(&path);
    }
    println!("{}", "For personalized advice, consult a qualified lawyer.".dim());
    Ok(())
}

fn print_bundle(session: &ResearchSession) {
    let Some(bundle) = session.bundle() else {
        println!("{}", "No research results yet.".dim());
        return;
    };

    println!("{}", bundle.summary().green());
    println!(
        "  pages: {}  duration: {}  document id: {}",
        bundle.total_pages,
        bundle.duration_text(),
        bundle.document_id
    );

    if bundle.results.is_empty() {
        println!("{}", "No detailed documents were returned for this search.".dim());
        return;
    }

    for (index, doc) in bundle.results.iter().enumerate() {
        let title = doc
            .title
            .clone()
            .unwrap_or_else(|| format!("Document {}", index + 1));
        println!("\n{} {}", format!("[{index}]").bold(), title.bold());
        if let Some(url) = &doc.url {
            println!("  {url}");
        }
        println!(
            "  {}",
            format!(
                "content: {} characters ({})",
                ResearchSession::content_length(doc),
                if session.is_expanded(index) { "expanded" } else { "preview" }
            )
            .dim()
        );
        if let Some(content) = session.rendered_content(index) {
            for line in content.lines() {
                println!("    {line}");
            }
        }
    }
}

async fn case_chat_loop(
    editor: &mut DefaultEditor,
    skin: &MadSkin,
    api: Arc<dyn LensApi>,
    session: &ResearchSession,
    index: usize,
) {
    let Some(doc) = session.bundle().and_then(|b| b.results.get(index)) else {
        println!("{}", "No such document row.".dim());
        return;
    };

    let backend = DocumentChatBackend::new(api);
    let mut shell =
        assistants::case_chat(doc, session.last_document_id().map(str::to_string));
    let mut seen = 0usize;
    print_new_turns(skin, &shell, &mut seen);
    println!("{}", "Enter a question, or `back` to return.".dim());

    loop {
        let line = match editor.readline("case> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "back" || line == "exit" {
            break;
        }
        let _ = editor.add_history_entry(&line);

        exchange(&mut shell, &backend, &line).await;
        print_new_turns(skin, &shell, &mut seen);
    }
}

async fn document_assistant_loop(
    editor: &mut DefaultEditor,
    skin: &MadSkin,
    api: Arc<dyn LensApi>,
    default_document_id: Option<String>,
) {
    let backend = DocumentChatBackend::new(api);
    let mut shell = assistants::document_assistant(default_document_id);
    let mut seen = 0usize;

    match shell.document_id() {
        Some(id) => println!("{}", format!("Document id: {id}").dim()),
        None => println!("{}", "No document id set; use `id <value>` first.".dim()),
    }
    println!("{}", "Commands: id <value>, suggest, clear, back".dim());

    loop {
        let line = match editor.readline("ask> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(_) => break,
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "back" || line == "exit" {
            break;
        }
        let _ = editor.add_history_entry(&line);

        if let Some(id) = line.strip_prefix("id ") {
            shell.set_document_id(id);
            match shell.document_id() {
                Some(id) => println!("{}", format!("Document id: {id}").dim()),
                None => println!("{}", "Document id cleared.".dim()),
            }
            continue;
        }
        if line == "suggest" {
            for (category, question) in SUGGESTED_QUESTIONS {
                println!("  [{category}] {question}");
            }
            continue;
        }
        if line == "clear" {
            if shell.clear() {
                seen = 0;
                println!("{}", "Chat history cleared.".dim());
            }
            continue;
        }

        exchange(&mut shell, &backend, &line).await;
        print_new_turns(skin, &shell, &mut seen);
    }
}

/// The interactive research hub: deep research, result browsing, case
/// chat, and the document assistant in one loop.
pub async fn run_lens_hub(config: &Config) -> Result<()> {
    let api: Arc<dyn LensApi> = Arc::new(HttpLensClient::new(&config.lens));
    let mut session = ResearchSession::new(Arc::clone(&api), config.lens.allowed_domains.clone());
    let mut mode = ResearchMode::AutoDetect;
    let skin = MadSkin::default();

    println!("HakiLens — Kenya Law Research Hub");
    println!("{}", format!("Mode: {} — {}", mode.label(), mode.description()).dim());
    println!(
        "{}",
        "Commands: research <url>, mode <auto-detect|listing-crawl|single-case>, urls, show, expand <n>, open <n>, chat <n>, ask, exit"
            .dim()
    );

    let history = history_path("lens");
    let mut editor = make_editor(history.as_ref())?;

    loop {
        let line = match editor.readline("lens> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("read input"),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "exit" | "quit" => break,
            "urls" => {
                for item in suggested_urls() {
                    println!("  [{}] {} — {}", item.kind.label(), item.description, item.url);
                }
            }
            "mode" => {
                mode = match rest {
                    "auto-detect" => ResearchMode::AutoDetect,
                    "listing-crawl" => ResearchMode::ListingCrawl,
                    "single-case" => ResearchMode::SingleCase,
                    other => {
                        println!("{}", format!("Unknown mode '{other}'.").dim());
                        continue;
                    }
                };
                println!("{}", format!("Mode: {} — {}", mode.label(), mode.description()).dim());
            }
            "research" => {
                println!("{}", "Researching…".dim());
                match session.run_research(rest, mode).await {
                    Ok(_) => print_bundle(&session),
                    Err(err) => println!("{} {}", "research failed:".red().bold(), err),
                }
            }
            "show" | "list" => print_bundle(&session),
            "expand" => match rest.parse::<usize>() {
                Ok(index) => {
                    session.toggle_expanded(index);
                    print_bundle(&session);
                }
                Err(_) => println!("{}", "Usage: expand <row>".dim()),
            },
            "open" => {
                let url = rest
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| session.bundle()?.results.get(index)?.url.clone());
                match url {
                    Some(url) => {
                        if let Err(err) = open::that(&url) {
                            println!("{} {}", "could not open browser:".red(), err);
                        }
                    }
                    None => println!("{}", "No URL on that row.".dim()),
                }
            }
            "chat" => match rest.parse::<usize>() {
                Ok(index) => {
                    case_chat_loop(&mut editor, &skin, Arc::clone(&api), &session, index).await;
                }
                Err(_) => println!("{}", "Usage: chat <row>".dim()),
            },
            "ask" => {
                let default_id = session.last_document_id().map(str::to_string);
                document_assistant_loop(&mut editor, &skin, Arc::clone(&api), default_id).await;
            }
            _ => println!("{}", "Unknown command; try `urls`, `research <url>`, or `exit`.".dim()),
        }
    }

    if let Some(path) = history {
        let _ = editor.save_history(&path);
    }
    Ok(())
}

/// One-shot research for the non-interactive `research` subcommand.
pub async fn run_research_once(config: &Config, url: &str, mode: ResearchMode) -> Result<()> {
    let api: Arc<dyn LensApi> = Arc::new(HttpLensClient::new(&config.lens));
    let mut session = ResearchSession::new(api, config.lens.allowed_domains.clone());
    session
        .run_research(url, mode)
        .await
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    print_bundle(&session);
    Ok(())
}
