use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use maiko::llm::{ImageAttachment, ImageMediaType};
use maiko::{ChatSession, MaikoError, ProviderType, Role};

pub const PREVIEW_CHARS: usize = 40;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    New,
    Open(String),
    Delete,
    Engine(ProviderType),
    Image(PathBuf),
    Facts,
    History,
    Help,
    Quit,
}

/// `Ok(None)` means the line is a chat message, not a command.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(None);
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "new" => Command::New,
        "open" if !arg.is_empty() => Command::Open(arg.to_string()),
        "delete" => Command::Delete,
        "engine" if !arg.is_empty() => Command::Engine(arg.parse()?),
        "image" if !arg.is_empty() => Command::Image(PathBuf::from(arg)),
        "facts" => Command::Facts,
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "open" | "engine" | "image" => bail!("/{} needs an argument", name),
        other => bail!("unknown command /{}", other),
    };
    Ok(Some(command))
}

async fn load_image(path: &Path) -> Result<ImageAttachment> {
    let media_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageMediaType::from_extension)
        .context("only png, jpg and jpeg images are supported")?;
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(ImageAttachment::new(media_type, data))
}

enum Action {
    Continue,
    Quit,
}

pub struct Repl {
    session: ChatSession,
    pending_image: Option<ImageAttachment>,
}

impl Repl {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            pending_image: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("MAiKO v{}", env!("CARGO_PKG_VERSION"));
        self.print_engine();
        for message in self.session.messages() {
            print_message(message.role, &message.content);
        }
        println!("Type /help for commands, /quit to exit.");
        println!();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            let marker = if self.pending_image.is_some() { " [image]" } else { "" };
            print!("You{} > ", marker);
            stdout.flush().ok();

            let mut input = String::new();
            match stdin.read_line(&mut input) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let input = input.trim();
            if input.is_empty() && self.pending_image.is_none() {
                continue;
            }

            match parse_command(input) {
                Ok(Some(command)) => match self.handle_command(command).await {
                    Ok(Action::Quit) => break,
                    Ok(Action::Continue) => {}
                    Err(e) => eprintln!("Error: {:#}", e),
                },
                Ok(None) => self.handle_chat(input).await?,
                Err(e) => eprintln!("Error: {:#}", e),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn handle_chat(&mut self, input: &str) -> Result<()> {
        let image = self.pending_image.take();
        match self.session.send(input, image).await {
            Ok(turn) => {
                print_message(Role::Assistant, &turn.reply);
                if let Some(archived) = turn.archived {
                    println!("(archived conversation {})", archived.label);
                }
                Ok(())
            }
            Err(MaikoError::UnsupportedAttachment(reason)) => {
                eprintln!("{}", reason);
                Ok(())
            }
            Err(e) => Err(e).context("failed to record the conversation"),
        }
    }

    async fn handle_command(&mut self, command: Command) -> Result<Action> {
        match command {
            Command::New => {
                self.session.new_chat();
                self.pending_image = None;
                println!("Started a new chat.");
            }
            Command::Open(id) => {
                self.session.open(&id).await?;
                for message in self.session.messages() {
                    print_message(message.role, &message.content);
                }
            }
            Command::Delete => {
                if self.session.delete_current().await? {
                    println!("Conversation deleted.");
                } else {
                    println!("Nothing to delete.");
                }
            }
            Command::Engine(engine) => {
                self.session.select_engine(engine);
                self.print_engine();
            }
            Command::Image(path) => {
                if !self.session.engine().supports_vision() {
                    bail!(
                        "{} is text-only, switch with /engine claude to send images",
                        self.session.engine().display_name()
                    );
                }
                self.pending_image = Some(load_image(&path).await?);
                println!("Image loaded, it will be sent with your next message.");
            }
            Command::Facts => {
                let facts = self.session.facts().await;
                if facts.is_empty() {
                    println!("No facts yet.");
                }
                for fact in facts {
                    println!("- {}", fact);
                }
            }
            Command::History => {
                for id in self.session.list_conversations().await {
                    let current = if self.session.conversation_id() == Some(id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}  {}", current, id, self.session.preview(&id, PREVIEW_CHARS).await);
                }
            }
            Command::Help => print_help(),
            Command::Quit => return Ok(Action::Quit),
        }
        Ok(Action::Continue)
    }

    fn print_engine(&self) {
        let engine = self.session.engine();
        let mode = if engine.supports_vision() { "text + vision" } else { "text only" };
        println!("Engine: {} ({})", engine.display_name(), mode);
    }
}

fn print_message(role: Role, content: &str) {
    match role {
        Role::User => println!("You > {}", content),
        Role::Assistant => println!("MAiKO > {}\n", content),
        Role::System => {}
    }
}

fn print_help() {
    println!("  /new            start a new chat");
    println!("  /open ID        reopen a stored conversation");
    println!("  /delete         delete the current conversation");
    println!("  /engine NAME    switch engine (glm, claude)");
    println!("  /image PATH     attach a png/jpg to the next message");
    println!("  /facts          show what MAiKO knows about you");
    println!("  /history        list stored conversations");
    println!("  /quit           exit");
}
