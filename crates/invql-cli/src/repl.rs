//! Interactive REPL implementation.

use crate::commands::{self, CommandResult};
use crate::completer::InvqlHelper;
use crate::executor::Session;
use crate::formatter::{self, OutputFormat};
use invql_core::host_registry;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Config, Editor};

/// Run the interactive REPL.
pub fn run(mut session: Session) -> Result<(), Box<dyn std::error::Error>> {
    let mut format: OutputFormat = session.config().format;

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();

    let helper = InvqlHelper::new(host_registry());
    let mut rl: Editor<InvqlHelper, DefaultHistory> = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    let hist_path = session.config().history_file();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    println!(
        "invql - {} host(s) in scope from {}",
        session.scope().len(),
        session.config().inventory_path().display()
    );
    println!("Type .help for commands, .exit to quit\n");

    loop {
        match rl.readline("invql> ") {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                if commands::is_command(line) {
                    match commands::handle_command(line, format) {
                        CommandResult::Exit => {
                            println!("Goodbye!");
                            break;
                        }
                        CommandResult::Output(msg) => {
                            println!("{}", msg);
                        }
                        CommandResult::SetFormat(fmt) => {
                            format = fmt;
                            println!("Output format set to {}", format);
                        }
                        CommandResult::ShowHistory => {
                            let history = rl.history();
                            let len = history.len();
                            let start = len.saturating_sub(20);
                            for (i, entry) in history.iter().skip(start).enumerate() {
                                println!("{:4}  {}", start + i + 1, entry);
                            }
                        }
                        CommandResult::Clear => {
                            // ANSI clear screen
                            print!("\x1B[2J\x1B[1;1H");
                        }
                        CommandResult::Explain(query_str) => match session.explain(&query_str) {
                            Ok(plan) => println!("{}", plan),
                            Err(e) => println!("{}", e),
                        },
                        CommandResult::Fields => {
                            let formatter = formatter::create_formatter(format);
                            println!("{}", session.fields(&*formatter));
                        }
                        CommandResult::Reload => {
                            let formatter = formatter::create_formatter(format);
                            match session.reload() {
                                Ok(()) => {
                                    let message =
                                        format!("{} host(s) in scope", session.scope().len());
                                    println!("{}", formatter.format_message(&message));
                                }
                                Err(e) => println!("{}", formatter.format_error(&e.to_string())),
                            }
                        }
                    }
                    continue;
                }

                let formatter = formatter::create_formatter(format);
                match session.execute(line, &*formatter) {
                    Ok(output) => {
                        if !output.is_empty() {
                            println!("{}", output);
                        }
                    }
                    Err(e) => {
                        println!("{}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}
