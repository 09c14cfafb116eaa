//! REPL (Read-Eval-Print Loop) for Kindle
//!
//! Every input is compiled into a fresh chunk; the object heap is shared
//! across inputs so interned strings persist.

use anyhow::Result;
use kindle_core::bytecode::{disassemble_chunk, Chunk, Heap};
use kindle_core::compiler::{compile_with, CompileOptions};
use kindle_core::lexer::{LexError, Scanner, TokenKind};
use kindle_core::vm::Vm;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL prompt shown at the start of each line
const PROMPT: &str = "> ";
/// Continuation prompt for multi-line input
const CONTINUATION_PROMPT: &str = ". ";
/// History file name
const HISTORY_FILE: &str = ".kindle_history";

/// Result of processing a REPL command
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    /// Not a command; evaluate the input
    Continue,
    /// Exit the REPL
    Exit,
    /// Input was handled as a command
    Handled,
}

/// The Kindle REPL
pub struct Repl {
    heap: Heap,
    vm: Vm,
    options: CompileOptions,
    editor: DefaultEditor,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new(options: CompileOptions) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;

        if let Some(home) = home_dir() {
            let _ = editor.load_history(&home.join(HISTORY_FILE));
        }

        Ok(Self {
            heap: Heap::new(),
            vm: Vm::new(),
            options,
            editor,
        })
    }

    /// Run the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("Kindle v{}", kindle_core::VERSION);
        println!("Type :help for help, :quit to exit");
        println!();

        loop {
            match self.read_input() {
                Ok(Some(input)) => match self.handle_command(&input) {
                    CommandResult::Exit => break,
                    CommandResult::Handled => {}
                    CommandResult::Continue => self.eval_and_print(&input),
                },
                Ok(None) => {}
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error reading input: {err}");
                    break;
                }
            }
        }

        if let Some(home) = home_dir() {
            let _ = self.editor.save_history(&home.join(HISTORY_FILE));
        }
        tracing::debug!(objects = self.heap.len(), "repl exit");

        Ok(())
    }

    /// Read input from the user, continuing while it is incomplete
    fn read_input(&mut self) -> Result<Option<String>, ReadlineError> {
        let mut input = String::new();
        let mut prompt = PROMPT;

        loop {
            let line = self.editor.readline(prompt)?;

            if input.is_empty() && line.trim().is_empty() {
                return Ok(None);
            }

            if !input.is_empty() {
                input.push('\n');
            }
            input.push_str(&line);

            if is_complete(&input) {
                let _ = self.editor.add_history_entry(&input);
                return Ok(Some(input));
            }

            prompt = CONTINUATION_PROMPT;
        }
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&self, input: &str) -> CommandResult {
        let Some(command) = input.trim().strip_prefix(':') else {
            return CommandResult::Continue;
        };
        let (name, args) = command.trim().split_once(' ').unwrap_or((command.trim(), ""));

        match name {
            "quit" | "q" | "exit" => CommandResult::Exit,
            "help" | "h" | "?" => {
                print_help();
                CommandResult::Handled
            }
            "disasm" | "d" => {
                if args.trim().is_empty() {
                    println!("Usage: :disasm <expression>");
                } else {
                    self.disassemble(args);
                }
                CommandResult::Handled
            }
            _ => {
                println!("Unknown command: :{name}");
                println!("Type :help for available commands");
                CommandResult::Handled
            }
        }
    }

    /// Compile without running and print the bytecode
    fn disassemble(&self, input: &str) {
        // Scratch heap: disassembly must not intern into the session
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        match compile_with(input, &mut chunk, &mut heap, self.options) {
            Ok(()) => print!("{}", disassemble_chunk(&chunk, "repl")),
            Err(error) => eprintln!("{error}"),
        }
    }

    /// Evaluate input and print the result
    fn eval_and_print(&mut self, input: &str) {
        let mut chunk = Chunk::new();
        if let Err(error) = compile_with(input, &mut chunk, &mut self.heap, self.options) {
            eprintln!("{error}");
            return;
        }
        match self.vm.interpret(&chunk, &mut self.heap) {
            Ok(value) => println!("{value}"),
            Err(error) => eprintln!("{error}"),
        }
    }
}

/// Check if the input is complete: parentheses balanced and no open string
fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    for token in Scanner::tokenize(input) {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth -= 1,
            TokenKind::Error if token.lexeme == LexError::UnterminatedString.message() => {
                return false;
            }
            _ => {}
        }
    }
    depth <= 0
}

/// Print help information
fn print_help() {
    println!(
        r#"
Kindle REPL Commands:
  :help, :h, :?      Show this help message
  :quit, :q          Exit the REPL
  :disasm <expr>     Show the bytecode for an expression

Tips:
  - Each input is a single expression
  - Open parentheses or strings continue on the next line
  - Press Ctrl+C to cancel current input
  - Press Ctrl+D to exit

Examples:
  > 1 + 2 * 3
  7
  > "kin" + "dle"
  kindle
  > !(1 >= 2)
  true
"#
    );
}

/// Get the user's home directory
fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}
