//! Line-based front-end: plain lines are follow-ups, `/` lines are commands.

use attempt_sync_core::{
    AttemptApi, AttemptController, AttemptData, ExecutionProcess, ProcessStatus, ProfileVariant,
    RunReason,
};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FollowUp(String),
    Stop,
    Open(Option<String>),
    Variant(VariantChoice),
    Profile(Option<ProfileVariant>),
    Refresh,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Which variant accompanies the next follow-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VariantChoice {
    /// Whatever the attempt's history suggests.
    #[default]
    Default,
    Without,
    Named(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::FollowUp(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::to_string);

    match name {
        "stop" => Command::Stop,
        "open" => Command::Open(arg),
        "variant" => Command::Variant(match arg.as_deref() {
            None | Some("default") => VariantChoice::Default,
            Some("none") => VariantChoice::Without,
            Some(name) => VariantChoice::Named(name.to_string()),
        }),
        "profile" => Command::Profile(arg.as_deref().map(parse_profile)),
        "refresh" => Command::Refresh,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// `label` or `label:variant`.
fn parse_profile(spec: &str) -> ProfileVariant {
    match spec.split_once(':') {
        Some((profile, variant)) if !variant.is_empty() => {
            ProfileVariant::with_variant(profile, variant)
        }
        Some((profile, _)) => ProfileVariant::new(profile),
        None => ProfileVariant::new(spec),
    }
}

fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Running => "running",
        ProcessStatus::Completed => "done",
        ProcessStatus::Failed => "failed",
        ProcessStatus::Killed => "killed",
        ProcessStatus::Unknown => "?",
    }
}

fn reason_label(run_reason: RunReason) -> &'static str {
    match run_reason {
        RunReason::SetupScript => "setup",
        RunReason::CleanupScript => "cleanup",
        RunReason::CodingAgent => "agent",
        RunReason::DevServer => "dev server",
        RunReason::Unknown => "other",
    }
}

fn profile_label(profile: &ProfileVariant) -> String {
    match &profile.variant {
        Some(variant) => format!("{}/{}", profile.profile, variant),
        None => profile.profile.clone(),
    }
}

fn process_line(process: &ExecutionProcess, data: &AttemptData) -> String {
    let mut line = format!(
        "  {} {:<8} {:<10}",
        process.started_at.format("%H:%M:%S"),
        status_label(process.status),
        reason_label(process.run_reason),
    );
    if let Some(profile) = data.profile_of(&process.id) {
        line.push(' ');
        line.push_str(&profile_label(profile));
    }
    if let Some(code) = process.exit_code {
        line.push_str(&format!(" (exit {})", code));
    }
    let tail = data
        .running_process_details
        .get(&process.id)
        .and_then(|detail| detail.stdout.as_deref())
        .and_then(|stdout| stdout.lines().last());
    if let Some(tail) = tail {
        line.push_str(&format!("\n      > {}", tail));
    }
    line
}

pub fn render_processes(data: &AttemptData) -> String {
    if data.is_empty() {
        return "  (no processes yet)".to_string();
    }
    data.processes
        .iter()
        .map(|process| process_line(process, data))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status<A: AttemptApi>(controller: &AttemptController<A>) -> String {
    let follow_up = controller.follow_up();
    let state = follow_up.state();
    let mut lines = vec![
        format!(
            "  Attempt:  {}",
            controller
                .selected_attempt()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string())
        ),
        format!(
            "  Running:  {}",
            if controller.is_attempt_running() { "yes" } else { "no" }
        ),
        format!(
            "  Profile:  {}",
            follow_up
                .resolved_profile()
                .map(|p| profile_label(&p))
                .unwrap_or_else(|| "none".to_string())
        ),
        format!(
            "  Variant:  {}",
            controller
                .default_follow_up_variant()
                .unwrap_or_else(|| "none".to_string())
        ),
        format!(
            "  Can send: {}",
            if follow_up.can_send() { "yes" } else { "no" }
        ),
    ];
    if let Some(error) = state.error {
        lines.push(format!("  Last error: {}", error));
    }
    lines.join("\n")
}

fn help_text() -> &'static str {
    "\n📖 Commands:\n  \
     <text>             Send a follow-up to the agent\n  \
     /stop              Stop the attempt\n  \
     /open [editor]     Open the attempt's worktree in an editor\n  \
     /variant [name]    Variant for follow-ups (default, none or a name)\n  \
     /profile [p[:v]]   Override the agent profile (and variant)\n  \
     /refresh           Reload now\n  \
     /status            Show attempt status\n  \
     /quit              Exit\n"
}

pub enum Step {
    Continue(String),
    Quit,
}

pub struct Repl<A: AttemptApi> {
    controller: Arc<AttemptController<A>>,
    variant: VariantChoice,
}

impl<A: AttemptApi> Repl<A> {
    pub fn new(controller: Arc<AttemptController<A>>) -> Self {
        Self {
            controller,
            variant: VariantChoice::Default,
        }
    }

    pub fn variant_choice(&self) -> &VariantChoice {
        &self.variant
    }

    /// Variant sent with the next follow-up.
    pub fn variant_for_send(&self) -> Option<String> {
        match &self.variant {
            VariantChoice::Default => self.controller.default_follow_up_variant(),
            VariantChoice::Without => None,
            VariantChoice::Named(name) => Some(name.clone()),
        }
    }

    pub async fn handle(&mut self, command: Command) -> Step {
        let output = match command {
            Command::FollowUp(message) => {
                let variant = self.variant_for_send();
                match self
                    .controller
                    .follow_up()
                    .submit(&message, variant.clone())
                    .await
                {
                    Ok(()) => match variant {
                        Some(variant) => format!("✓ Follow-up sent (variant {})", variant),
                        None => "✓ Follow-up sent".to_string(),
                    },
                    Err(e) => format!("❌ {}", e),
                }
            }
            Command::Stop => match self.controller.stop_attempt().await {
                Ok(()) => "■ Stop requested".to_string(),
                Err(e) => format!("❌ {}", e),
            },
            Command::Open(editor) => match self.controller.open_editor(editor.as_deref()).await {
                Ok(()) => "✓ Editor opened".to_string(),
                Err(e) => format!("❌ {}", e),
            },
            Command::Variant(choice) => {
                self.variant = choice;
                match &self.variant {
                    VariantChoice::Default => "Variant: attempt default".to_string(),
                    VariantChoice::Without => "Variant: none".to_string(),
                    VariantChoice::Named(name) => format!("Variant: {}", name),
                }
            }
            Command::Profile(profile) => {
                // A `profile:variant` pick also decides the next follow-up's variant.
                if let Some(variant) = profile.as_ref().and_then(|p| p.variant.clone()) {
                    self.variant = VariantChoice::Named(variant);
                }
                self.controller.follow_up().select_profile(profile);
                match self.controller.follow_up().resolved_profile() {
                    Some(profile) => format!("Profile: {}", profile_label(&profile)),
                    None => "Profile: none".to_string(),
                }
            }
            Command::Refresh => match self.controller.selected_attempt() {
                Some(attempt_id) => match self.controller.fetch_attempt_data(attempt_id).await {
                    Ok(_) => render_processes(&self.controller.attempt_data()),
                    Err(e) => format!("❌ {}", e),
                },
                None => "❌ No attempt selected".to_string(),
            },
            Command::Status => render_status(self.controller.as_ref()),
            Command::Help => help_text().to_string(),
            Command::Quit => return Step::Quit,
            Command::Empty => String::new(),
            Command::Unknown(input) => format!("Unknown command: {} (try /help)", input),
        };
        Step::Continue(output)
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║              Attempt Sync                                        ║");
        println!("║  Type a follow-up, or /help for commands                         ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("{}", render_processes(&self.controller.attempt_data()));

        let mut watch = self.controller.subscribe();
        let _ = watch.data.borrow_and_update();
        let _ = watch.running.borrow_and_update();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        prompt()?;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match self.handle(parse_command(&line)).await {
                        Step::Continue(output) => {
                            if !output.is_empty() {
                                println!("{}", output);
                            }
                        }
                        Step::Quit => break,
                    }
                    prompt()?;
                }
                changed = watch.data.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let data = watch.data.borrow_and_update().clone();
                    println!("\n{}", render_processes(&data));
                    prompt()?;
                }
                changed = watch.running.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let running = *watch.running.borrow_and_update();
                    if running {
                        println!("\n▶ Attempt running");
                    } else {
                        println!("\n■ Attempt idle, follow-ups enabled");
                    }
                    prompt()?;
                }
            }
        }

        println!("👋 Goodbye!");
        Ok(())
    }
}

fn prompt() -> io::Result<()> {
    print!("attempt> ");
    io::stdout().flush()
}
