/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: Interactive diagnostic conversation
- `lookup`: Vehicle search and reasoning-provider management
*/

use crate::config::Config;
use crate::error::{DiagchatError, Result};

pub mod lookup;
pub mod render;
pub mod special_commands;

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Creates the service client and a `ConversationController`, then runs a
    //! readline loop that maps typed lines onto controller operations and
    //! prints every new turn and the current panel.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::dispatcher::{Affordance, Dispatch, Panel};
    use crate::service::{create_service, BookingField, DiagnosisService, VehicleMatch};
    use crate::session::rewind;
    use crate::session::{
        ConversationController, GuardDecision, RewindOutcome, Submission, TextFocus, TurnId,
    };
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Focus handle for the terminal: the next typed line is free text
    #[derive(Debug, Default)]
    pub struct TerminalFocus {
        requested: AtomicBool,
    }

    impl TerminalFocus {
        /// Consumes a pending focus request
        pub fn take(&self) -> bool {
            self.requested.swap(false, Ordering::SeqCst)
        }
    }

    impl TextFocus for TerminalFocus {
        fn focus(&self) {
            self.requested.store(true, Ordering::SeqCst);
        }
    }

    struct ChatSession {
        config: Config,
        service: Arc<dyn DiagnosisService>,
        controller: ConversationController,
        focus: Arc<TerminalFocus>,
        vehicle_results: Vec<VehicleMatch>,
        last_shown: Option<TurnId>,
    }

    /// Start the interactive diagnostic chat
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use diagchat::commands::chat;
    /// use diagchat::config::Config;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// chat::run_chat(Config::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive diagnostic chat");

        let service = create_service(&config.service)?;
        let focus = Arc::new(TerminalFocus::default());
        let controller = ConversationController::new(service.clone(), focus.clone())
            .with_guard(config.chat.guard_enabled);

        let mut session = ChatSession {
            config,
            service,
            controller,
            focus,
            vehicle_results: Vec::new(),
            last_shown: None,
        };

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&session.config);
        session.start().await;

        loop {
            session.show_panel();

            let panel = session.controller.panel();
            if let Affordance::BookingForm { fields, .. } = &panel.affordance {
                session.fill_booking_form(&mut rl, fields).await?;
                continue;
            }

            let prompt = format!(
                "{} > ",
                session.controller.snapshot().session.current_step.colored_tag()
            );
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => session.handle_input(&panel, trimmed).await,
                        Ok(command) => session.handle_command(command).await,
                        Err(e) => println!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        tracing::info!("Chat ended");
        Ok(())
    }

    impl ChatSession {
        async fn start(&mut self) {
            let result = self.controller.start().await;
            self.report(result);
        }

        async fn handle_command(&mut self, command: SpecialCommand) {
            match command {
                SpecialCommand::Help => print_help(),
                SpecialCommand::ShowStatus => {
                    let targets: Vec<u32> = self
                        .controller
                        .rewind_targets()
                        .iter()
                        .map(|t| t.diagnostic_turn)
                        .collect();
                    println!();
                    for line in render::status_lines(&self.controller.snapshot(), &targets) {
                        println!("{}", line);
                    }
                    println!();
                }
                SpecialCommand::Reset => {
                    self.controller.reset();
                    self.vehicle_results.clear();
                    self.last_shown = None;
                    println!("{}", "新しい診断を開始します".cyan());
                    self.start().await;
                }
                SpecialCommand::Rewind(turn) => {
                    let targets = self.controller.rewind_targets();
                    if rewind::find_target(&targets, turn).is_none() {
                        println!("{}", render::rewind_refusal(turn, &targets).yellow());
                        return;
                    }
                    match self.controller.rewind(turn).await {
                        Ok(Some(RewindOutcome::Truncated { removed })) => {
                            println!(
                                "{}",
                                format!("質問{}からやり直します ({}件削除)", turn, removed).cyan()
                            );
                            self.last_shown = None;
                            self.reprint_transcript();
                        }
                        Ok(Some(RewindOutcome::Mismatch)) => {
                            println!("{}", "やり直し位置が見つかりませんでした".yellow());
                            self.show_new_turns();
                        }
                        Ok(None) => {}
                        Err(e) => self.report_error(&e),
                    }
                }
                SpecialCommand::FreeInput => {
                    match self.controller.perform(Dispatch::FocusText).await {
                        Ok(()) => println!("{}", "自由入力で症状を教えてください".dimmed()),
                        Err(e) => self.report_error(&e),
                    }
                }
                SpecialCommand::ListProviders => match self.service.list_providers().await {
                    Ok(providers) => lookup::print_providers(&providers),
                    Err(e) => self.report_error(&e),
                },
                SpecialCommand::UseProvider(name) => {
                    match lookup::activate_provider(self.service.as_ref(), &name).await {
                        Ok(()) => println!("{}", format!("Active provider: {}", name).green()),
                        Err(e) => self.report_error(&e),
                    }
                }
                SpecialCommand::Exit | SpecialCommand::None => {}
            }
        }

        async fn handle_input(&mut self, panel: &Panel, text: &str) {
            if let Affordance::GuardConfirm { .. } = panel.affordance {
                let decision = match text.to_lowercase().as_str() {
                    "y" | "yes" => GuardDecision::SendAnyway,
                    "n" | "no" => GuardDecision::Rewrite,
                    _ => {
                        println!("{}", "y か n で答えてください".yellow());
                        return;
                    }
                };
                let result = self.controller.resolve_pending(decision).await;
                if decision == GuardDecision::Rewrite {
                    println!("{}", "もう一度入力してください".dimmed());
                }
                self.report(result);
                return;
            }

            if self.focus.take() {
                self.submit_text(text).await;
                return;
            }

            if let Ok(number) = text.parse::<usize>() {
                if self.select_numbered(panel, number).await {
                    return;
                }
            }

            match &panel.affordance {
                Affordance::VehicleSearch => self.search_vehicles(text).await,
                Affordance::NewSession => {
                    println!("{}", "/reset で新しい診断を始めます".yellow())
                }
                _ if panel.text_input || panel.affordance == Affordance::TextInput => {
                    self.submit_text(text).await
                }
                Affordance::Idle => self.submit_text(text).await,
                _ => println!("{}", "番号で選択してください (/free で自由入力)".yellow()),
            }
        }

        async fn select_numbered(&mut self, panel: &Panel, number: usize) -> bool {
            let index = match number.checked_sub(1) {
                Some(index) => index,
                None => return false,
            };

            if let Affordance::VehicleSearch = panel.affordance {
                let Some(found) = self.vehicle_results.get(index).cloned() else {
                    return false;
                };
                let result = self.controller.select_vehicle(&found).await;
                self.vehicle_results.clear();
                self.report(result);
                return true;
            }

            let Some(choice) = panel.affordance.choices().get(index).cloned() else {
                return false;
            };
            let result = self.controller.select(&choice).await;
            self.report(result);
            true
        }

        async fn submit_text(&mut self, text: &str) {
            match self.controller.submit_text(text).await {
                Ok(Submission::Held) | Ok(Submission::Ignored) => {}
                Ok(Submission::Sent) => self.show_new_turns(),
                Err(e) => self.report_error(&e),
            }
        }

        async fn search_vehicles(&mut self, query: &str) {
            let limit = self.config.chat.vehicle_search_limit;
            match self.service.search_vehicles(query, limit).await {
                Ok(results) if results.is_empty() => {
                    println!("{}", "該当する車両が見つかりませんでした".yellow());
                    self.vehicle_results.clear();
                }
                Ok(results) => self.vehicle_results = results,
                Err(e) => self.report_error(&e),
            }
        }

        async fn fill_booking_form(
            &mut self,
            rl: &mut DefaultEditor,
            fields: &[BookingField],
        ) -> Result<()> {
            let mut values = BTreeMap::new();
            for field in fields {
                let marker = if field.required { "*" } else { "" };
                let line = rl.readline(&format!("  {}{}: ", field.label, marker))?;
                values.insert(field.name.clone(), line.trim().to_string());
            }

            let result = self.controller.submit_booking(&values).await;
            self.report(result);
            Ok(())
        }

        fn report(&mut self, result: Result<()>) {
            match result {
                Ok(()) => self.show_new_turns(),
                Err(e) => {
                    self.show_new_turns();
                    self.report_error(&e);
                }
            }
        }

        fn report_error(&self, error: &anyhow::Error) {
            let message = match error.downcast_ref::<DiagchatError>() {
                Some(DiagchatError::ExchangeInFlight) => "前の応答を待っています".to_string(),
                Some(DiagchatError::MissingBookingFields(labels)) => {
                    format!("必須項目が未入力です: {}", labels.join(", "))
                }
                _ => error.to_string(),
            };
            println!("{}", message.red());
        }

        fn show_new_turns(&mut self) {
            let snapshot = self.controller.snapshot();
            let shown = self.last_shown;
            for turn in snapshot
                .turns
                .iter()
                .filter(|t| shown.map_or(true, |last| t.id > last))
            {
                for line in render::turn_lines(turn, self.config.chat.show_citations) {
                    println!("{}", line);
                }
                self.last_shown = Some(turn.id);
            }
        }

        fn reprint_transcript(&mut self) {
            println!("{}", "─".repeat(40).dimmed());
            self.show_new_turns();
        }

        fn show_panel(&self) {
            let panel = self.controller.panel();
            for line in render::panel_lines(&panel, &self.vehicle_results) {
                println!("{}", line);
            }
        }
    }

    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Diagchat - Vehicle Diagnosis Chat               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Service: {}", config.service.base_url.cyan());
        println!(
            "Guard:   {}\n",
            if config.chat.guard_enabled {
                "on".green()
            } else {
                "off".yellow()
            }
        );
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

}
