use quillmail::Email;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <from> <to> [subject] [host]", args[0]);
        std::process::exit(2);
    }

    let from = args[1].as_str();
    let to = args[2].as_str();

    let subject = if args.len() > 3 {
        args[3].as_str()
    } else {
        "(no subject)"
    };

    let host = if args.len() > 4 {
        args[4].as_str()
    } else {
        "localhost"
    };

    let mut email = Email::new();
    email
        .set_host_name(host)
        .set_from(from)
        .set_subject(subject)
        .set_msg("Sent with quillmail");

    if let Err(e) = email.add_to(to) {
        eprintln!("Invalid recipient: {e}");
        std::process::exit(1);
    }

    match email.build() {
        Ok(message) => print!("{}", message.formatted()),
        Err(e) => {
            eprintln!("Failed to build message: {e}");
            std::process::exit(1);
        }
    }
}
