use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::collections::HashMap;
use vreg_core::BackendOptions;

use crate::parser::parse;
use crate::session::Session;

type CommandFn = fn(&mut Repl, &[&str]) -> anyhow::Result<()>;

pub struct Repl {
    pub commands: HashMap<String, CommandFn>,
    pub history: Vec<String>,
    options: BackendOptions,
    session: Session,
    line_number: usize,
}

impl Repl {
    pub fn new(options: BackendOptions) -> Self {
        let mut commands = HashMap::new();
        commands.insert("help".to_string(), Self::cmd_help as CommandFn);
        commands.insert("exit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("quit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("history".to_string(), Self::show_history as CommandFn);
        commands.insert("dump".to_string(), Self::cmd_dump as CommandFn);
        commands.insert("storage".to_string(), Self::cmd_storage as CommandFn);
        commands.insert("mirrors".to_string(), Self::cmd_mirrors as CommandFn);
        commands.insert("clif".to_string(), Self::cmd_clif as CommandFn);

        Self {
            commands,
            history: Vec::new(),
            session: Session::new(options.clone()),
            options,
            line_number: 1,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut editor = Reedline::create();

        tracing::info!("vreg register shell");
        tracing::info!("Type ':help' for commands, ':exit' to quit.");

        loop {
            let prompt = DefaultPrompt::new(
                DefaultPromptSegment::Basic(format!("vreg[{}]> ", self.line_number)),
                DefaultPromptSegment::Empty,
            );

            let line = match editor.read_line(&prompt) {
                Ok(Signal::Success(input)) => input,
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => break,
                Err(e) => {
                    println!("Input error: {e}");
                    continue;
                }
            };

            let trimmed = line.trim();

            if let Some(command) = trimmed.strip_prefix(':') {
                let mut parts = command.split_whitespace();
                if let Some(cmd) = parts.next() {
                    let args: Vec<&str> = parts.collect();
                    if let Some(&handler) = self.commands.get(cmd) {
                        if let Err(e) = handler(self, &args) {
                            println!("\x1B[31mError: {e}\x1B[0m");
                        }
                        if cmd == "exit" || cmd == "quit" {
                            break;
                        }
                    } else {
                        println!("Unknown command: {cmd}");
                    }
                }
                continue;
            }

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.history.push(trimmed.to_string());
            self.line_number += 1;
            self.evaluate_and_print(trimmed);
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Run one statement line. Returns the text to print.
    pub fn evaluate(&mut self, line: &str) -> anyhow::Result<String> {
        let statement = parse(line)?;
        Ok(self.session.execute(statement)?)
    }

    fn evaluate_and_print(&mut self, line: &str) {
        match self.evaluate(line) {
            Ok(output) => println!("=> \x1B[33m{output}\x1B[0m"),
            Err(e) => println!("\x1B[31m{e}\x1B[0m"),
        }
    }

    fn cmd_help(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Statements:");
        println!("  slot <name> [mirror]                   - Declare a register slot");
        println!("  set <name> <shorty> <space> <literal>  - Write a constant");
        println!("  get <name> <shorty> <space>            - Read the register");
        println!("Shorty types: Z B C S I J F D L (V is rejected)");
        println!("Type spaces: storage (reg), field, accurate, array");
        println!("Commands:");
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        for cmd in names {
            println!("  :{cmd}");
        }
        Ok(())
    }

    fn cmd_exit(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Exiting REPL...");
        Ok(())
    }

    fn show_history(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Command history:");
        for (i, cmd) in self.history.iter().enumerate() {
            println!("{}: {}", i + 1, cmd);
        }
        println!("Replayed by :clif:");
        for statement in self.session.statements() {
            println!("  {statement}");
        }
        Ok(())
    }

    fn cmd_dump(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let insts = self.session.builder().insts();
        if insts.is_empty() {
            println!("(nothing emitted)");
        }
        for inst in insts {
            println!("  {inst}");
        }
        Ok(())
    }

    fn cmd_storage(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let builder = self.session.builder();
        if builder.allocation_count() == 0 {
            println!("(no storage allocated)");
        }
        for allocation in builder.allocations() {
            let contents = match builder.storage_contents(allocation.id) {
                Some(bits) => format!("{bits:#x}"),
                None => "uninitialized".to_string(),
            };
            println!(
                "  {} {} {}: {}",
                allocation.id, allocation.category, allocation.name, contents
            );
        }
        Ok(())
    }

    fn cmd_mirrors(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let mirrors = self.session.mirrors();
        if mirrors.is_empty() {
            println!("(no mirrored slots)");
        }
        for (mirror, contents) in mirrors {
            match contents {
                Some((ty, bits)) => println!("  {mirror}: {ty} {bits:#x}"),
                None => println!("  {mirror}: never written"),
            }
        }
        Ok(())
    }

    fn cmd_clif(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let func = self.session.compile(self.options.clone())?;
        print!("{}", func.display());
        Ok(())
    }
}
