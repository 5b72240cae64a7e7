use dbf_reader::dbf::codec::codepages;
use dbf_reader::{DefaultBuilder, Table, TableOptions};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-dbf-file> [--deleted] [--raw] [--encoding <LABEL>]", args[0]);
        std::process::exit(1);
    }

    let dbf_path = &args[1];
    let show_deleted = args.iter().any(|arg| arg == "--deleted");
    let raw = args.iter().any(|arg| arg == "--raw");

    let mut options = TableOptions::default().raw(raw);
    // Parse --encoding argument
    if let Some(encoding_idx) = args.iter().position(|arg| arg == "--encoding") {
        match args.get(encoding_idx + 1).map(|label| (label, codepages::parse_encoding(label))) {
            Some((_, Some(encoding))) => options = options.encoding(encoding),
            Some((label, None)) => {
                eprintln!("ERROR: Unknown encoding '{}'", label);
                std::process::exit(1);
            }
            None => {
                eprintln!("ERROR: --encoding flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    println!("Reading DBF file: {}", dbf_path);
    println!("{}", "=".repeat(60));

    let table = match Table::open_with(dbf_path, options, DefaultBuilder) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("\nERROR: Failed to open DBF file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("\nTable Information:");
    println!("  Name: {}", table.name());
    println!("  Version: {:#04x}", table.header().version);
    println!("  Encoding: {}", table.encoding().name());
    match table.date() {
        Some(date) => println!("  Last modified: {}", date),
        None => println!("  Last modified: (invalid)"),
    }
    println!("  Declared records: {}", table.header().num_records);
    if let Some(memo_path) = table.memo_path() {
        println!("  Memo file: {}", memo_path.display());
    }

    println!("\nFields:");
    for field in table.fields() {
        println!(
            "  {:<11} {} {:>3} {:>2}",
            field.name, field.type_code, field.length, field.decimal_count
        );
    }

    let records = if show_deleted { table.deleted() } else { table.records() };
    println!("\n{}:", if show_deleted { "Deleted records" } else { "Records" });
    for (i, result) in records.stream().enumerate() {
        match result {
            Ok(record) => {
                let rendered: Vec<String> = record
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect();
                println!("  {}. {}", i + 1, rendered.join(", "));
            }
            Err(e) => {
                eprintln!("\nERROR: Failed to read record {}", i + 1);
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }
    }
}
