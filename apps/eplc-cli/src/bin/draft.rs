use eplc_cli::bootstrap::{build_assistant, Surface};
use eplc_cli::console::{read_line, read_multiline, FollowUp};
use eplc_cli::init_tracing;
use eplc_core::config::Config;
use eplc_core::types::Phase;
use eplc_engine::{DocumentDraft, DraftRequest, Session, SessionLoop};

/// Asks until a non-empty answer arrives; `None` on `exit` or end of input.
fn required(prompt: &str, what: &str) -> anyhow::Result<Option<String>> {
    loop {
        match read_line(prompt)? {
            None => return Ok(None),
            Some(v) if v.eq_ignore_ascii_case("exit") => return Ok(None),
            Some(v) if !v.is_empty() => return Ok(Some(v)),
            Some(_) => println!("{what} is required (or type 'exit' to quit).\n"),
        }
    }
}

fn choose_phase() -> anyhow::Result<Option<Phase>> {
    loop {
        let prompt = "Which EPLC phase? (Requirement / Design / Implementation / Development)\n> ";
        let Some(input) = required(prompt, "Phase")? else {
            return Ok(None);
        };
        match input.parse() {
            Ok(phase) => return Ok(Some(phase)),
            Err(e) => println!("{e}\n"),
        }
    }
}

fn print_session(title: &str, session: &Session) {
    println!("\n==== {title} ====\n");
    println!("{}", session.draft());
    println!("\n==== MISSING REQUIRED INFORMATION ====\n");
    println!("{}", session.missing_report());
    println!("\n=======================================================\n");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    let assistant = build_assistant(&settings, Surface::Draft).await?;
    let flow = SessionLoop::new(&assistant);
    let mut document: Option<DocumentDraft> = None;

    'outer: loop {
        let Some(phase) = choose_phase()? else { break };
        let Some(template) = required("Which Template?\n> ", "Template")? else { break };
        let Some(section) = required("Which Section?\n> ", "Section")? else { break };
        let details = loop {
            let d = read_multiline("\nDescribe your product/context:")?;
            if !d.is_empty() {
                break d;
            }
            println!("Product/context description is required. Please provide some details.\n");
        };
        let instructions = read_multiline("\n(Optional) Any extra instructions?")?;

        let request = DraftRequest::new(phase, &template, &section, details).with_instructions(instructions);
        let mut session = Session::new(request)?;
        println!("\nProcessing...\n");
        if let Err(e) = flow.start(&mut session).await {
            eprintln!("Error: {e}");
            continue;
        }
        print_session("GENERATED DRAFT", &session);

        loop {
            let follow = read_multiline(concat!(
                "Are you satisfied? Type 'yes' to finish, 'back' to restart, ",
                "'r' to regenerate, or enter new instructions:"
            ))?;
            match FollowUp::parse(&follow) {
                FollowUp::Accept => {
                    let accepted = flow.accept(&mut session)?;
                    let doc = document.get_or_insert_with(|| DocumentDraft::new(phase, &template));
                    if doc.phase() != phase || doc.template() != template.as_str() {
                        *doc = DocumentDraft::new(phase, &template);
                    }
                    doc.add(accepted)?;
                    println!("Section '{section}' accepted ({} in {}).", doc.sections().len(), doc.template());
                    break;
                }
                FollowUp::Back => {
                    flow.restart(session);
                    continue 'outer;
                }
                FollowUp::Quit => break 'outer,
                FollowUp::Regenerate => {
                    println!("\nRegenerating...\n");
                    match flow.regenerate(&mut session).await {
                        Ok(()) => print_session("REGENERATED DRAFT", &session),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
                FollowUp::Refine(instructions) => {
                    println!("\nProcessing...\n");
                    match flow.refine(&mut session, &instructions).await {
                        Ok(()) => print_session("UPDATED DRAFT", &session),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
            }
        }

        match read_line("Draft another section? (y/n)\n> ")? {
            Some(answer) if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") => continue,
            _ => break,
        }
    }

    if let Some(doc) = document.filter(|d| !d.sections().is_empty()) {
        println!("\n==== {} ({} Phase) ====\n", doc.template(), doc.phase());
        println!("{}", doc.render());
    }
    Ok(())
}
