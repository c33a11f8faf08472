//! Line-oriented terminal input.

use std::io::{self, BufRead, Write};

/// Prints `prompt` and reads one trimmed line; `None` on end of input.
pub fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Reads lines until an empty one or end of input.
pub fn read_multiline(hint: &str) -> io::Result<String> {
    println!("{hint}");
    println!("(Finish with an empty line)");
    read_block(io::stdin().lock())
}

pub fn read_block<R: BufRead>(reader: R) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n").trim().to_string())
}

/// What the user typed after reviewing a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Accept,
    Back,
    Regenerate,
    Quit,
    Refine(String),
}

impl FollowUp {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "yes" | "y" => FollowUp::Accept,
            "back" | "b" => FollowUp::Back,
            "r" | "regenerate" => FollowUp::Regenerate,
            "exit" | "quit" | "q" => FollowUp::Quit,
            _ => FollowUp::Refine(trimmed.to_string()),
        }
    }
}
