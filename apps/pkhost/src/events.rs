//! Live transaction progress on stderr

use console::{Style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use pk_errors::ErrorKind;
use pk_events::{log_event, EventMessage, TransactionEvent};
use pk_types::ExitStatus;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Keep stdout and stderr free of progress when emitting JSON
    json_output: bool,
    /// Forward every event to tracing
    debug: bool,
    term: Term,
    /// Multi-progress manager so status lines print above the bar
    multi_progress: MultiProgress,
    /// Percentage bar of the running transaction
    progress_bar: Option<ProgressBar>,
}

impl EventHandler {
    pub fn new(json_output: bool, debug: bool) -> Self {
        Self {
            json_output,
            debug,
            term: Term::stderr(),
            multi_progress: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            progress_bar: None,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: &EventMessage) {
        if self.debug {
            log_event(message);
        }
        if self.json_output {
            return;
        }

        match &message.event {
            TransactionEvent::Started { role } => {
                self.show_status(&format!("Starting {role}"));
            }
            TransactionEvent::StatusChanged { status } => {
                self.show_status(&format!("Status: {status}"));
            }
            TransactionEvent::Percentage { percentage } => self.show_progress(*percentage),
            // Packages are rendered as a table once the transaction ends
            TransactionEvent::Package { .. } => {}
            TransactionEvent::ErrorCode { kind, details } => {
                let style = if *kind == ErrorKind::TransactionCancelled {
                    Style::new().yellow()
                } else {
                    Style::new().red()
                };
                self.show_line(&style.apply_to(format!("{kind}: {details}")).to_string());
            }
            TransactionEvent::Finished { exit, runtime } => {
                if let Some(pb) = self.progress_bar.take() {
                    if *exit == ExitStatus::Success {
                        pb.finish_with_message("done");
                    } else {
                        pb.abandon_with_message(exit.to_string());
                    }
                }
                self.show_status(&format!("Finished ({exit}) in {} ms", runtime.as_millis()));
            }
        }
    }

    fn show_progress(&mut self, percentage: u8) {
        let pb = self.progress_bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:30.cyan/blue}] {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            self.multi_progress.add(pb)
        });
        pb.set_position(u64::from(percentage));
    }

    fn show_status(&self, message: &str) {
        let line = Style::new().dim().apply_to(message).to_string();
        self.show_line(&line);
    }

    fn show_line(&self, line: &str) {
        // Suspend the bar so the line is not overdrawn; also prints when
        // stderr is not a terminal and the bar itself is hidden
        self.multi_progress.suspend(|| {
            let _ = self.term.write_line(line);
        });
    }
}
