//! Sample-data builder.
//!
//! Writes a deterministic `{"key-<i>": "value-<i>"}` JSON object and
//! its MD5 sidecar, so the watcher -> loader -> storage pipeline can
//! be exercised without a real publisher.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use md5::{Digest, Md5};

/// romdb-sampledata - generates a snapshot file and its MD5 sidecar
#[derive(Parser, Debug)]
#[command(name = "romdb-sampledata")]
struct Args {
    /// Number of key-value entries to generate.
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Output path for the generated JSON snapshot.
    #[arg(long)]
    out: PathBuf,
}

fn main() {
    let args = Args::parse();

    let mut data = BTreeMap::new();
    for i in 0..args.count {
        data.insert(format!("key-{i}"), format!("value-{i}"));
    }

    let body = serde_json::to_vec(&data).expect("sample data always serializes");
    std::fs::write(&args.out, &body).expect("failed to write snapshot file");

    let mut hasher = Md5::new();
    hasher.update(&body);
    let digest: [u8; 16] = hasher.finalize().into();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

    let sidecar_path = {
        let mut p = args.out.clone().into_os_string();
        p.push(".md5");
        PathBuf::from(p)
    };
    std::fs::write(&sidecar_path, hex).expect("failed to write md5 sidecar");

    println!(
        "wrote {} entries to {} ({})",
        args.count,
        args.out.display(),
        sidecar_path.display()
    );
}
