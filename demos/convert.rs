//! Converts a configuration file between formats.
//!
//! Run with: cargo run --example convert -- settings.ini settings.json
//!
//! The formats are picked from the file extensions.

use std::env;
use std::error::Error;
use uconfig::Document;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [input, output] = args.as_slice() else {
        eprintln!("usage: convert <input> <output>");
        std::process::exit(2);
    };

    let mut doc = Document::new();
    let warnings = uconfig::read(input, &mut doc)?;
    for warning in &warnings {
        eprintln!("{}: {}", input, warning);
    }

    println!(
        "{}: {} entries as {}",
        input,
        doc.tree().len() - 1,
        doc.format().map_or("unknown", |f| f.as_tag())
    );
    for section in doc.root().subentries() {
        let name = section.name().map(String::from_utf8_lossy);
        println!(
            "  {:<24} {} keys, {} subentries",
            name.as_deref().unwrap_or("(unnamed)"),
            section.key_count(),
            section.subentry_count()
        );
    }

    uconfig::write(output, &doc)?;
    println!("wrote {}", output);
    Ok(())
}
