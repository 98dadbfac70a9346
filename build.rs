// build.rs

use glob::glob;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A fixture matrix shipped in `data/`.
#[derive(Debug)]
struct Fixture {
    pub name: String,
    pub path: PathBuf,
}

/// Discovers all fixture matrices by scanning the `data/` directory.
fn get_all_fixtures() -> Vec<Fixture> {
    glob("data/*.mtx")
        .expect("Failed to read glob pattern")
        .filter_map(|entry| {
            let path = entry.ok()?;
            let name = path
                .file_stem()?
                .to_string_lossy()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect();
            Some(Fixture { name, path })
        })
        .collect()
}

fn main() {
    println!("cargo:rerun-if-changed=data");

    // Get the Cargo output directory where we will place the generated code.
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("fixture_tests.rs");
    let mut file = BufWriter::new(File::create(&dest_path).unwrap());

    // Generate a separate `#[test]` function for each fixture.
    for fixture in get_all_fixtures() {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
        let path = Path::new(&manifest_dir).join(&fixture.path);
        let path_str = path.to_str().unwrap();

        writeln!(
            file,
            r#"
#[test]
fn fixture_{name}() -> anyhow::Result<()> {{
    run_fixture("{path}")
}}
"#,
            name = fixture.name,
            path = path_str.escape_default()
        )
        .unwrap();
    }
}
