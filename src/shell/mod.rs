//! Shell Module
//!
//! Interactive driver for an [`Archive`]: a thin dispatch loop that
//! parses commands, resolves entry names to sequence positions, and
//! calls the engine. All archive semantics live in the core; the shell
//! only translates names to indices and prints results.
//!
//! The loop runs over any `BufRead`/`Write` pair so whole sessions can
//! be scripted in tests; the `packfs` binary wires it to stdin/stdout.

mod command;

pub use command::{Command, ParseError};

use std::io::{BufRead, Write};

use crate::archive::{Archive, EntryKind, FolderId};
use crate::error::{PackError, Result};

/// Interactive session over one archive
pub struct Shell {
    archive: Archive,
    current: FolderId,
}

impl Shell {
    /// Start a session positioned at the archive root
    pub fn new(archive: Archive) -> Self {
        let current = archive.root();
        Self { archive, current }
    }

    /// Borrow the underlying archive
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// End the session, handing the archive back
    ///
    /// Batched edits that were never synced are discarded with the
    /// shell's state; sync explicitly first to keep them.
    pub fn into_archive(self) -> Archive {
        self.archive
    }

    /// Run the dispatch loop until `quit` or end of input
    ///
    /// Command failures (unknown names, extract-before-sync, I/O
    /// problems with external files) are printed and the loop
    /// continues; only failures on the shell's own streams end it.
    pub fn run(&mut self, mut input: impl BufRead, mut output: impl Write) -> Result<()> {
        let mut line = String::new();

        loop {
            write!(output, "> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break; // end of input
            }

            match Command::parse(&line) {
                Err(ParseError::Empty) => continue,
                Err(ParseError::Unknown(word)) => {
                    writeln!(output, "unknown command '{}', try 'help'", word)?;
                }
                Err(ParseError::Usage(usage)) => {
                    writeln!(output, "usage: {}", usage)?;
                }
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(err) = self.dispatch(command, &mut output) {
                        writeln!(output, "error: {}", err)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Execute one parsed command against the archive
    fn dispatch(&mut self, command: Command, output: &mut impl Write) -> Result<()> {
        match command {
            Command::List => {
                for (_, entry) in self.archive.entries(self.current) {
                    let tag = match entry.kind() {
                        EntryKind::File => "FILE:",
                        EntryKind::Folder => "FOLDER:",
                    };
                    writeln!(output, "{:<8}{}", tag, entry.name())?;
                }
            }
            Command::Cd { name } => {
                if name == ".." {
                    self.current = self.archive.parent(self.current);
                } else {
                    let index = self.find(&name, Some(EntryKind::Folder))?;
                    self.current = self.archive.child_folder(self.current, index)?;
                }
            }
            Command::Mkdir { name } => {
                self.archive.add_folder(self.current, &name)?;
            }
            Command::Put { name, source } => {
                self.archive.add_file(self.current, &name, source)?;
            }
            Command::Extract { name, destination } => {
                let index = self.find(&name, Some(EntryKind::File))?;
                self.archive.extract(self.current, index, destination)?;
            }
            Command::Remove { name } => {
                let index = self.find(&name, None)?;
                self.archive.remove(self.current, index);
            }
            Command::Sync => {
                self.archive.sync()?;
                // Slots may have been remapped; only the root id is
                // guaranteed to mean the same folder.
                self.current = self.archive.root();
            }
            Command::Help => {
                write_help(output)?;
            }
            Command::Quit => unreachable!("handled by the loop"),
        }
        Ok(())
    }

    /// Position of the first live entry matching `name` (and kind)
    fn find(&self, name: &str, kind: Option<EntryKind>) -> Result<usize> {
        self.archive
            .entries(self.current)
            .find(|(_, entry)| {
                entry.name() == name && kind.map_or(true, |k| entry.kind() == k)
            })
            .map(|(index, _)| index)
            .ok_or_else(|| PackError::NotFound {
                name: name.to_string(),
            })
    }
}

fn write_help(output: &mut impl Write) -> Result<()> {
    writeln!(output, "commands:")?;
    writeln!(output, "  list                        list entries of the current folder")?;
    writeln!(output, "  cd <name|..>                enter a sub-folder, or go up")?;
    writeln!(output, "  mkdir <name>                create an empty sub-folder")?;
    writeln!(output, "  put <name> <source-path>    add a file (copied on sync)")?;
    writeln!(output, "  extract <name> <dest-path>  copy a committed file out")?;
    writeln!(output, "  rm <name>                   remove an entry (folders recursively)")?;
    writeln!(output, "  sync                        commit batched edits to disk")?;
    writeln!(output, "  quit                        leave the shell")?;
    Ok(())
}
