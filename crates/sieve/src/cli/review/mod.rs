//! The `sieve review` command: the interactive keep/discard/modify loop.
//!
//! The loop reads single keypresses on a blocking thread. Every accepting
//! decision is handed to the session's worker pool and the next candidate
//! comes up straight away. Quitting drains outstanding work behind a spinner
//! and writes the settings back to the config file.

pub mod keys;
pub mod tally;

use clap::Args;
use console::{Style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use sieve_core::{Config, Decision, JobOutcome, ReviewSession, ReviewState};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use super::theme::{print_banner, sieve_theme};
use keys::Action;
use tally::Tally;

/// Arguments for the `review` command.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Folder to review (prompted for when omitted)
    pub folder: Option<PathBuf>,
}

/// Execute the review command.
pub async fn execute(
    args: ReviewArgs,
    config: Config,
    config_path: PathBuf,
) -> anyhow::Result<()> {
    if !Term::stderr().is_term() {
        anyhow::bail!("`sieve review` needs an interactive terminal");
    }

    let (session, outcomes) = ReviewSession::new(config, tokio::runtime::Handle::current());
    let initial = args.folder.map(|p| expand(&p.to_string_lossy()));

    let loop_config_path = config_path.clone();
    let (screen, result) = tokio::task::spawn_blocking(move || {
        let mut screen = ReviewScreen::new(session, outcomes, loop_config_path);
        let result = screen.run(initial);
        (screen, result)
    })
    .await?;

    let ReviewScreen {
        session,
        mut outcomes,
        mut tally,
        ..
    } = screen;

    finish(&session).await;
    tally.drain(&mut outcomes);

    if let Err(e) = session.config().save_to(&config_path) {
        tracing::warn!("Failed to save settings to {:?}: {e}", config_path);
    }
    tally.print_summary();

    result
}

/// Wait for outstanding commits, showing how many are left.
async fn finish(session: &ReviewSession) {
    finish_with(session, tokio::signal::ctrl_c).await
}

/// Drain the session. Interrupts arriving meanwhile are swallowed so
/// accepted images still get both of their files.
async fn finish_with<F, Fut>(session: &ReviewSession, mut interrupted: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let pending = session.pending();
    if pending == 0 {
        session.shutdown().await;
        return;
    }

    let spinner = create_spinner(pending);
    let drain = session.shutdown();
    tokio::pin!(drain);
    let mut tick = tokio::time::interval(Duration::from_millis(150));
    let mut listening = true;

    loop {
        tokio::select! {
            _ = &mut drain => break,
            signal = interrupted(), if listening => {
                if let Err(e) = signal {
                    tracing::debug!("Cannot listen for interrupts: {e}");
                    listening = false;
                } else {
                    spinner.println("Still finishing accepted images; please wait.");
                }
            }
            _ = tick.tick() => {
                spinner.set_message(format!("finishing {} image(s)...", session.pending()));
            }
        }
    }
    spinner.finish_and_clear();
}

fn create_spinner(pending: usize) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("finishing {pending} image(s)..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}

/// State of the terminal review loop.
struct ReviewScreen {
    session: ReviewSession,
    outcomes: UnboundedReceiver<JobOutcome>,
    config_path: PathBuf,
    tally: Tally,
    term: Term,
    theme: ColorfulTheme,
    /// Current candidate needs printing before the next keypress
    redraw: bool,
}

impl ReviewScreen {
    fn new(
        session: ReviewSession,
        outcomes: UnboundedReceiver<JobOutcome>,
        config_path: PathBuf,
    ) -> Self {
        Self {
            session,
            outcomes,
            config_path,
            tally: Tally::default(),
            term: Term::stderr(),
            theme: sieve_theme(),
            redraw: true,
        }
    }

    fn run(&mut self, initial: Option<PathBuf>) -> anyhow::Result<()> {
        print_banner();

        match initial {
            Some(folder) => self.open(&folder),
            None => {
                if !self.prompt_folder()? {
                    return Ok(());
                }
            }
        }

        loop {
            self.tally.drain(&mut self.outcomes);

            match self.session.state() {
                ReviewState::Idle => {
                    if !self.prompt_folder()? {
                        return Ok(());
                    }
                }
                ReviewState::Exhausted => {
                    let dim = Style::new().for_stderr().dim();
                    eprintln!(
                        "  {}",
                        dim.apply_to(format!(
                            "All {} image(s) reviewed.",
                            self.session.queue().len()
                        ))
                    );
                    let another = Confirm::with_theme(&self.theme)
                        .with_prompt("Open another folder?")
                        .default(false)
                        .interact_opt()?;
                    if another != Some(true) || !self.prompt_folder()? {
                        return Ok(());
                    }
                }
                ReviewState::Reviewing => {
                    if self.redraw {
                        if !self.show_current() {
                            continue;
                        }
                        self.redraw = false;
                    }
                    let key = self.term.read_key()?;
                    let Some(action) = keys::action_for(&key) else {
                        continue;
                    };
                    if !self.apply(action)? {
                        return Ok(());
                    }
                    self.redraw = true;
                }
            }
        }
    }

    /// Print the current candidate. Unreadable candidates are skipped.
    fn show_current(&mut self) -> bool {
        let Some(path) = self.session.current() else {
            return false;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let info = match self.session.probe_current() {
            Some(Ok(info)) => info,
            Some(Err(e)) => {
                let warn = Style::new().for_stderr().yellow();
                eprintln!("  {}", warn.apply_to(format!("Skipping {name}: {e}")));
                self.session.skip_current();
                self.tally.skipped += 1;
                return false;
            }
            None => return false,
        };

        let queue = self.session.queue();
        let cyan = Style::new().for_stderr().cyan();
        let bold = Style::new().for_stderr().bold();
        let dim = Style::new().for_stderr().dim();

        eprintln!(
            "{} {}  {}",
            cyan.apply_to(format!("[{}/{}]", queue.cursor() + 1, queue.len())),
            bold.apply_to(&name),
            dim.apply_to(format!(
                "{} {}x{}",
                sieve_core::pipeline::decode::format_to_string(info.format),
                info.width,
                info.height
            ))
        );
        eprintln!("       {}", dim.apply_to(self.settings_line()));
        true
    }

    fn settings_line(&self) -> String {
        let config = self.session.config();
        let effects = config.effects.snapshot();
        let target = self
            .session
            .resolve_base_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "q{} ({}) · realism {} · → {}",
            effects.clamped_quality(),
            effects.subsampling(),
            if effects.apply_realism { "on" } else { "off" },
            target
        );
        let pending = self.session.pending();
        if pending > 0 {
            line.push_str(&format!(" · {pending} pending"));
        }
        line
    }

    /// Carry out one action. Returns `false` when the user quits.
    fn apply(&mut self, action: Action) -> anyhow::Result<bool> {
        let dim = Style::new().for_stderr().dim();

        match action {
            Action::Decide(decision) => self.decide(decision),
            Action::AdjustQuality(delta) => {
                let quality = self.session.adjust_quality(delta);
                eprintln!("  {}", dim.apply_to(format!("Quality {quality}")));
            }
            Action::ToggleRealism => {
                let on = self.session.toggle_realism();
                eprintln!(
                    "  {}",
                    dim.apply_to(format!("Realism {}", if on { "on" } else { "off" }))
                );
            }
            Action::ToggleCentral => {
                let on = self.session.toggle_central_folder();
                if on && self.session.config().output.central_folder().is_none() {
                    let warn = Style::new().for_stderr().yellow();
                    eprintln!(
                        "  {}",
                        warn.apply_to("No central folder set yet; press C to choose one.")
                    );
                } else {
                    eprintln!(
                        "  {}",
                        dim.apply_to(format!(
                            "Central folder {}",
                            if on { "on" } else { "off" }
                        ))
                    );
                }
                self.save_config();
            }
            Action::ChooseCentral => self.choose_central()?,
            Action::OpenFolder => {
                self.prompt_folder()?;
            }
            Action::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn decide(&mut self, decision: Decision) {
        match self.session.decide(decision) {
            Ok(Some(receipt)) => {
                self.tally.record(decision);
                let green = Style::new().for_stderr().green();
                let dim = Style::new().for_stderr().dim();
                let label = match decision {
                    Decision::Keep => "kept",
                    Decision::Modify => "marked for modify",
                    Decision::Discard => "discarded",
                };
                eprintln!(
                    "  {} {}",
                    green.apply_to(label),
                    dim.apply_to(
                        receipt
                            .job
                            .map(|id| format!("(job {id})"))
                            .unwrap_or_default()
                    )
                );
            }
            Ok(None) => {}
            Err(e) => {
                let err = Style::new().for_stderr().red();
                eprintln!("  {} {e}", err.apply_to("✗"));
            }
        }
    }

    /// Ask for a folder and load it. Returns `false` if the prompt was dismissed.
    fn prompt_folder(&mut self) -> anyhow::Result<bool> {
        let Some(raw) = super::handle_interrupt(
            Input::<String>::with_theme(&self.theme)
                .with_prompt("Folder to review (empty to quit)")
                .allow_empty(true)
                .interact_text(),
        )?
        else {
            return Ok(false);
        };
        if raw.trim().is_empty() {
            return Ok(false);
        }

        self.open(&expand(&raw));
        Ok(true)
    }

    fn open(&mut self, folder: &Path) {
        match self.session.load_folder(folder) {
            Ok(0) => {
                let warn = Style::new().for_stderr().yellow();
                eprintln!(
                    "  {}",
                    warn.apply_to(format!("No supported images in {}", folder.display()))
                );
            }
            Ok(count) => {
                let dim = Style::new().for_stderr().dim();
                eprintln!(
                    "  {}",
                    dim.apply_to(format!("Loaded {count} image(s) from {}", folder.display()))
                );
            }
            Err(e) => {
                let err = Style::new().for_stderr().red();
                eprintln!("  {} {e}", err.apply_to("✗"));
            }
        }
    }

    fn choose_central(&mut self) -> anyhow::Result<()> {
        let current = self.session.config().output.central_folder_path.clone();
        let Some(raw) = super::handle_interrupt(
            Input::<String>::with_theme(&self.theme)
                .with_prompt("Central output folder")
                .with_initial_text(current)
                .allow_empty(true)
                .interact_text(),
        )?
        else {
            return Ok(());
        };
        if raw.trim().is_empty() {
            return Ok(());
        }

        self.session.set_central_folder(raw.trim());
        self.save_config();
        Ok(())
    }

    fn save_config(&self) {
        if let Err(e) = self.session.config().save_to(&self.config_path) {
            tracing::warn!("Failed to save settings to {:?}: {e}", self.config_path);
        }
    }
}
