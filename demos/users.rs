//! End-to-end demo: generate fake user records, write them to a single
//! container file, then exercise every read path (paged scan, full scan,
//! single-column projection and a streaming aggregate).
//!
//! Run with `cargo run --example users`.

use std::time::{SystemTime, UNIX_EPOCH};

use colfile::{ColumnDef, ColumnType, FileReader, FileWriter, Row, Schema, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FILE_PATH: &str = "./users.colfile";
const RECORD_COUNT: usize = 10_000;
const ROW_GROUP_SIZE: usize = 1_000;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Margaret", "John", "Frances", "Tony",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Hamilton", "Backus",
    "Allen", "Hoare",
];

fn fake_user(rng: &mut StdRng, index: usize) -> Row {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    let id: String = (0..32)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect();
    let username = format!("{}{}{}", first.to_lowercase(), last.to_lowercase(), index % 100);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Row::new()
        .with("id", id)
        .with("firstname", first)
        .with("lastname", last)
        .with("email", format!("{username}@example.com"))
        .with("phone", format!("+1-555-{:07}", rng.gen_range(0..10_000_000)))
        .with("blog", format!("https://{username}.example.net"))
        .with("username", username)
        .with("score", index as f64)
        // transient field, deliberately absent from the schema below
        .with("created_at", Value::Timestamp(now))
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        let get = |name: &str| row.get(name).map(ToString::to_string).unwrap_or_default();
        println!(
            "{} {} <{}> score={}",
            get("firstname"),
            get("lastname"),
            get("email"),
            get("score"),
        );
    }
}

fn main() -> colfile::Result<()> {
    let schema = Schema::new(vec![
        ColumnDef::new("id", ColumnType::Utf8),
        ColumnDef::new("firstname", ColumnType::Utf8),
        ColumnDef::new("lastname", ColumnType::Utf8),
        ColumnDef::new("email", ColumnType::Utf8),
        ColumnDef::new("phone", ColumnType::Utf8),
        ColumnDef::new("blog", ColumnType::Utf8),
        ColumnDef::new("username", ColumnType::Utf8),
        ColumnDef::new("score", ColumnType::F64),
    ])?;

    println!("generate container file");
    let mut rng = StdRng::seed_from_u64(42);
    let mut writer = FileWriter::create(FILE_PATH, schema, ROW_GROUP_SIZE)?;
    writer.write_rows((0..RECORD_COUNT).map(|i| fake_user(&mut rng, i)))?;
    writer.finish()?;

    let mut reader = FileReader::open(FILE_PATH)?;

    println!("\nprint page 1 only");
    print_rows(&reader.read_page(10, 1)?);

    println!("\nprint page 2 only");
    print_rows(&reader.read_page(10, 2)?);

    println!("\nprint all data");
    print_rows(&reader.read_all()?);

    println!("\nprint column 'firstname' only");
    for value in reader.read_column("firstname")? {
        println!("{value}");
    }

    let avg = reader.column_mean("score")?;
    println!("\ncalculate score average: {avg:.3}");
    Ok(())
}
